use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    api,
    collector::Collector,
    config::AppConfig,
    session::{PendingStates, Session},
    spotify::SpotifyClient,
    store::SqliteStore,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub client: SpotifyClient,
    pub store: Arc<SqliteStore>,
    pub session: Session,
    pub pending_states: PendingStates,
    pub analyze_window_days: i64,
    pub landing_page: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<SqliteStore>, session: Session) -> Self {
        Self {
            client: SpotifyClient::new(config.spotify.clone()),
            store,
            session,
            pending_states: PendingStates::default(),
            analyze_window_days: config.analyze_window_days,
            landing_page: config.landing_page.clone(),
        }
    }

    /// The collector that shares this state's client, store and session.
    pub fn collector(&self, config: &AppConfig) -> Collector {
        Collector::new(
            self.client.clone(),
            Arc::clone(&self.store),
            self.session.clone(),
            config.fetch_interval,
            config.auth_poll_interval,
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .route("/top-artists", get(api::top_artists))
        .route("/analyze", get(api::analyze))
        .route("/fetch-data", get(api::fetch_data))
        .route("/health", get(api::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the API on `listener` and runs the collector next to it.
pub async fn start_api_server(
    listener: TcpListener,
    state: AppState,
    collector: Collector,
) -> std::io::Result<()> {
    tokio::spawn(collector.run());

    info!("HTTP server running on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
