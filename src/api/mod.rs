//! # API Module
//!
//! HTTP endpoints served by toplisten. Every handler is a thin translation
//! between HTTP and the store, the Spotify client and the session held in
//! [`AppState`](crate::server::AppState).
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`login`] - `GET /login`, redirects to Spotify's authorization page
//! - [`callback`] - `GET /callback`, exchanges the code and opens the session
//!
//! ### Data
//!
//! - [`top_artists`] - `GET /top-artists`, fetches, stores and ranks a snapshot
//! - [`fetch_data`] - `GET /fetch-data`, returns what is stored, no remote call
//! - [`analyze`] - `GET /analyze`, logs the trailing-window genre summary
//!
//! ### Misc
//!
//! - [`index`] - `GET /`, landing page
//! - [`health`] - `GET /health`, liveness and login status

mod analyze;
mod artists;
mod callback;
mod health;
mod index;

pub use analyze::analyze;
pub use analyze::ANALYSIS_COMPLETE;
pub use artists::fetch_data;
pub use artists::top_artists;
pub use callback::callback;
pub use callback::login;
pub use health::health;
pub use index::index;
