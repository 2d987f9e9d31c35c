use axum::{extract::State, response::Html};
use tracing::warn;

use crate::server::AppState;

const LANDING_PAGE: &str = include_str!("../../static/index.html");

pub async fn index(State(state): State<AppState>) -> Html<String> {
    if let Some(path) = &state.landing_page {
        match async_fs::read_to_string(path).await {
            Ok(page) => return Html(page),
            Err(e) => warn!("Cannot read landing page {:?}, serving the built-in one: {}", path, e),
        }
    }

    Html(LANDING_PAGE.to_string())
}
