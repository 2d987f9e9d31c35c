//! Error types for toplisten.
//!
//! Each layer owns one error enum: [`AuthError`] for the OAuth handshake and
//! session, [`RemoteError`] for calls against the Spotify Web API,
//! [`StorageError`] for the SQLite store and [`ConfigError`] for startup
//! configuration. [`AppError`] is the HTTP-facing union and maps every
//! variant to a status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures while establishing or using the authenticated session.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Code not provided")]
    MissingCode,

    #[error("Unknown or already used OAuth state")]
    UnknownState,

    #[error("Access token is empty")]
    MissingToken,

    #[error("Not authenticated yet, visit /login first")]
    NotAuthenticated,

    #[error("Failed to exchange token: {0}")]
    TokenExchange(String),

    #[error("Invalid authorization URL: {0}")]
    AuthorizeUrl(String),

    #[error("Failed to fetch user profile: {0}")]
    Profile(#[source] RemoteError),

    #[error("Failed to register user: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Whether the failure was caused by the incoming request rather than by
    /// the server or a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::MissingCode | AuthError::UnknownState | AuthError::NotAuthenticated
        )
    }
}

/// Failures talking to the Spotify Web API.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Error on request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected status code {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Malformed response payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invalid response payload: {0}")]
    Invalid(String),
}

/// Failures reading or writing the local store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database connection lock is poisoned")]
    Poisoned,

    #[error("Failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

/// Missing or malformed configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Error returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Analysis window of {0} days is out of range")]
    WindowOutOfRange(i64),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::NotAuthenticated) => StatusCode::UNAUTHORIZED,
            AppError::Auth(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
