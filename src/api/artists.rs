use axum::{extract::State, response::Json};

use crate::{
    collector::fetch_and_store,
    error::{AppError, AuthError},
    server::AppState,
    types::{RecordedData, TopArtistsReport},
    utils::rank_genres,
};

pub async fn top_artists(State(state): State<AppState>) -> Result<Json<TopArtistsReport>, AppError> {
    let user = state
        .session
        .current()
        .await
        .ok_or(AuthError::NotAuthenticated)?;

    let snapshot = fetch_and_store(&state.client, &state.store, &user).await?;
    let genres = rank_genres(&snapshot);

    Ok(Json(TopArtistsReport {
        artists: snapshot.into_iter().map(|entry| entry.artist).collect(),
        genres,
    }))
}

pub async fn fetch_data(State(state): State<AppState>) -> Result<Json<RecordedData>, AppError> {
    let artists = state.store.fetch_all_artists()?;
    let genres = state.store.fetch_genre_counts()?;

    Ok(Json(RecordedData { artists, genres }))
}
