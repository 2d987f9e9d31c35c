//! # Spotify Integration Module
//!
//! This module is the only place that talks to Spotify. It covers the OAuth 2.0
//! authorization-code flow and the two Web API reads the service needs.
//!
//! ## Architecture
//!
//! ```text
//! HTTP handlers / Collector
//!          ↓
//! SpotifyClient
//!     ├── Authentication (authorize URL, code exchange, profile lookup)
//!     └── Top artists (fetch, decode, validate)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API / Accounts service
//! ```
//!
//! ## Authentication
//!
//! [`auth`] builds the authorization URL (offline access, random `state`) and
//! exchanges the returned code for a [`Token`](crate::types::Token) using the
//! client id and secret. [`SpotifyClient::authenticate`] then resolves the
//! profile behind the token and registers the user in the store.
//!
//! ## API Coverage
//!
//! - `GET /me` - Profile of the token owner
//! - `GET /me/top/artists` - First page of the user's top artists
//! - `POST /api/token` - Authorization code exchange
//!
//! Requests are made once: there is no retry, no pagination and no token
//! refresh.

pub mod auth;
mod client;

pub use client::SpotifyClient;
