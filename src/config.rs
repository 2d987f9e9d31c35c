//! Configuration management for toplisten.
//!
//! Values come from environment variables, optionally seeded from `.env`
//! files. The lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory (`toplisten/.env`)
//! 3. `.env` file in the working directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

use chrono::{FixedOffset, Offset, Utc};

use crate::error::ConfigError;

pub const APP_DIR: &str = "toplisten";

const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_SCOPE: &str = "user-top-read user-read-private";
const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_DB_FILE: &str = "spotify_data.db";
const DEFAULT_FETCH_INTERVAL_SECS: u64 = 60 * 60;
const DEFAULT_AUTH_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_ANALYZE_WINDOW_DAYS: i64 = 7;
const MAX_ANALYZE_WINDOW_DAYS: i64 = 36_500;
const DEFAULT_SNAPSHOT_UTC_OFFSET: &str = "+03:00";

/// Loads environment variables from `.env` files.
///
/// The file in the platform-specific local data directory is read first:
/// - Linux: `~/.local/share/toplisten/.env`
/// - macOS: `~/Library/Application Support/toplisten/.env`
/// - Windows: `%LOCALAPPDATA%/toplisten/.env`
///
/// then `.env` in the working directory. Variables already set in the
/// process environment are never overridden, and missing files are skipped.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be created.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    let _ = dotenv::from_path(&path);
    let _ = dotenv::dotenv();
    Ok(())
}

/// `<local data dir>/toplisten`, or `./toplisten` if the platform has none.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// OAuth client registration and remote endpoints.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub scope: String,
}

/// Everything the server needs to run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub spotify: SpotifyConfig,
    pub server_addr: String,
    pub db_path: PathBuf,
    /// Delay between two collector runs.
    pub fetch_interval: Duration,
    /// Delay between two session checks while nobody has logged in.
    pub auth_poll_interval: Duration,
    pub analyze_window_days: i64,
    /// Civil zone of the snapshot timestamps.
    ///
    /// Timestamps are stored as local text without an offset, and the
    /// `/analyze` window compares them in this zone. Rows written under a
    /// different offset shift in or out of the window by the difference.
    pub snapshot_utc_offset: FixedOffset,
    pub landing_page: Option<PathBuf>,
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or_default = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let client_id = var("SPOTIFY_CLIENT_ID")
            .or_else(|| var("CLIENT_ID"))
            .ok_or(ConfigError::Missing("SPOTIFY_CLIENT_ID"))?;
        let client_secret = var("SPOTIFY_CLIENT_SECRET")
            .or_else(|| var("CLIENT_SECRET"))
            .ok_or(ConfigError::Missing("SPOTIFY_CLIENT_SECRET"))?;

        let spotify = SpotifyConfig {
            client_id,
            client_secret,
            redirect_uri: or_default("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            auth_url: or_default("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: or_default("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: or_default("SPOTIFY_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            scope: or_default("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE),
        };

        let fetch_interval = parse_interval(
            "FETCH_INTERVAL_SECS",
            var("FETCH_INTERVAL_SECS"),
            DEFAULT_FETCH_INTERVAL_SECS,
        )?;
        let auth_poll_interval = parse_interval(
            "AUTH_POLL_INTERVAL_SECS",
            var("AUTH_POLL_INTERVAL_SECS"),
            DEFAULT_AUTH_POLL_INTERVAL_SECS,
        )?;
        let analyze_window_days = parse_number(
            "ANALYZE_WINDOW_DAYS",
            var("ANALYZE_WINDOW_DAYS"),
            DEFAULT_ANALYZE_WINDOW_DAYS,
        )?;
        if !(1..=MAX_ANALYZE_WINDOW_DAYS).contains(&analyze_window_days) {
            return Err(ConfigError::Invalid {
                name: "ANALYZE_WINDOW_DAYS",
                reason: format!("must be between 1 and {}", MAX_ANALYZE_WINDOW_DAYS),
            });
        }

        let snapshot_utc_offset = parse_utc_offset(&or_default(
            "SNAPSHOT_UTC_OFFSET",
            DEFAULT_SNAPSHOT_UTC_OFFSET,
        ))?;

        Ok(AppConfig {
            spotify,
            server_addr: or_default("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            db_path: var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir().join(DEFAULT_DB_FILE)),
            fetch_interval,
            auth_poll_interval,
            analyze_window_days,
            snapshot_utc_offset,
            landing_page: var("LANDING_PAGE").map(PathBuf::from),
        })
    }
}

/// Resolves the database path and snapshot offset without requiring the OAuth
/// credentials. Used by the offline commands.
pub fn store_settings(db_override: Option<PathBuf>) -> Result<(PathBuf, FixedOffset), ConfigError> {
    let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
    let db_path = db_override
        .or_else(|| var("DATABASE_PATH").map(PathBuf::from))
        .unwrap_or_else(|| data_dir().join(DEFAULT_DB_FILE));
    let offset = parse_utc_offset(
        &var("SNAPSHOT_UTC_OFFSET").unwrap_or_else(|| DEFAULT_SNAPSHOT_UTC_OFFSET.to_string()),
    )?;
    Ok((db_path, offset))
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// A number of seconds that must not be zero, so the collector never spins.
fn parse_interval(
    name: &'static str,
    value: Option<String>,
    default: u64,
) -> Result<Duration, ConfigError> {
    match parse_number(name, value, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            reason: "must be at least 1 second".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

/// Parses `+HH:MM`, `-HH:MM` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") {
        return Ok(Utc.fix());
    }

    raw.parse::<FixedOffset>().map_err(|e| ConfigError::Invalid {
        name: "SNAPSHOT_UTC_OFFSET",
        reason: format!("{} ({:?})", e, raw),
    })
}
