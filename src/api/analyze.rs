use axum::extract::State;
use chrono::Utc;
use tracing::info;

use crate::{
    error::AppError,
    server::AppState,
    utils::{format_genre_summary, window_start},
};

pub const ANALYSIS_COMPLETE: &str = "Analysis complete. Check server logs for details.";

pub async fn analyze(State(state): State<AppState>) -> Result<&'static str, AppError> {
    let days = state.analyze_window_days;
    let now = Utc::now().with_timezone(&state.store.utc_offset());
    let start = window_start(now, days).ok_or(AppError::WindowOutOfRange(days))?;
    let genres = state.store.fetch_genre_summary(start)?;

    for line in format_genre_summary(days, &genres) {
        info!("{}", line);
    }

    Ok(ANALYSIS_COMPLETE)
}
