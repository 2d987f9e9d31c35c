//! # CLI Module
//!
//! Command implementations for the `toplisten` binary.
//!
//! - [`serve`] - Runs the HTTP server together with the background collector
//! - [`list_artists`] - Prints stored artists, optionally filtered by name
//! - [`list_rankings`] - Prints the latest ranking of every user
//! - [`list_genres`] - Prints how many stored artists carry each genre
//! - [`analyze`] - Prints the genre summary of a trailing window of days
//!
//! Everything except [`serve`] only reads the local database and never talks
//! to Spotify. Fatal problems (bad configuration, unreadable database) print an
//! error and terminate the process.

mod artists;
mod genres;
mod serve;

use std::path::PathBuf;

use crate::{config, error, store::SqliteStore};

pub use artists::list_artists;
pub use artists::list_rankings;
pub use genres::analyze;
pub use genres::list_genres;
pub use serve::serve;

fn open_store(db: Option<PathBuf>) -> SqliteStore {
    let (path, offset) = match config::store_settings(db) {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    match SqliteStore::new(&path, offset) {
        Ok(store) => store,
        Err(e) => error!("Failed to initialize database {}. Err: {}", path.display(), e),
    }
}
