use std::{net::SocketAddr, path::PathBuf, str::FromStr, sync::Arc};

use tokio::net::TcpListener;

use crate::{
    config::AppConfig,
    error, info,
    server::{AppState, start_api_server},
    session::Session,
    store::SqliteStore,
    success, warning,
};

pub async fn serve(addr: Option<String>, db: Option<PathBuf>, open_browser: bool) {
    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    };
    if let Some(addr) = addr {
        config.server_addr = addr;
    }
    if let Some(db) = db {
        config.db_path = db;
    }

    let store = match SqliteStore::new(&config.db_path, config.snapshot_utc_offset) {
        Ok(store) => Arc::new(store),
        Err(e) => error!("Failed to initialize database: {}", e),
    };

    let addr = match SocketAddr::from_str(&config.server_addr) {
        Ok(addr) => addr,
        Err(e) => error!("Failed to parse server address: {}", e),
    };
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => error!("Failed to bind {}: {}", addr, e),
    };

    success!("Listening on {}", addr);

    let state = AppState::new(&config, store, Session::new());
    let collector = state.collector(&config);

    let login_url = login_url(addr);
    info!("Database: {}", config.db_path.display());
    info!("Log in at {}", login_url);
    if open_browser && webbrowser::open(&login_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            login_url
        )
    }

    if let Err(e) = start_api_server(listener, state, collector).await {
        error!("Server stopped. Err: {}", e);
    }
}

fn login_url(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("http://localhost:{}/login", addr.port())
    } else {
        format!("http://{}/login", addr)
    }
}
