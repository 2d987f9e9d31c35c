use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use tracing::info;

use crate::{
    error::{AppError, AuthError},
    server::AppState,
    spotify::auth::generate_state,
};

pub async fn login(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let oauth_state = generate_state();
    let url = state.client.authorize_url(&oauth_state)?;
    state.pending_states.issue(oauth_state).await;

    Ok(Redirect::temporary(&url))
}

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let Some(code) = params.get("code").filter(|c| !c.is_empty()) else {
        return Err(AuthError::MissingCode.into());
    };

    // Logins started from /login always carry a state; a bare code is still
    // accepted for manual flows.
    if let Some(oauth_state) = params.get("state") {
        if !state.pending_states.consume(oauth_state).await {
            return Err(AuthError::UnknownState.into());
        }
    }

    let token = state.client.exchange_code(code).await?;
    let user = state.client.authenticate(token, &state.store).await?;
    let user = state.session.establish(user).await;
    info!("Session established for {}", user.user_id);

    Ok((StatusCode::FOUND, [(header::LOCATION, "/top-artists")]).into_response())
}
