use std::{fmt, sync::Arc};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::auth;
use crate::{
    config::SpotifyConfig,
    error::{AuthError, RemoteError},
    session::AuthenticatedUser,
    store::SqliteStore,
    types::{ArtistSnapshot, RemoteArtist, Token, TopArtistsResponse, UserProfile},
};

/// Spotify Web API client.
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    config: Arc<SpotifyConfig>,
}

impl fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("client_id", &self.config.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("api_url", &self.config.api_url)
            .finish()
    }
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Self {
        Self {
            http: Client::new(),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    pub fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        auth::authorize_url(&self.config, state)
    }

    pub async fn exchange_code(&self, code: &str) -> Result<Token, AuthError> {
        auth::exchange_code(&self.http, &self.config, code).await
    }

    /// Resolves the profile behind `token` and registers it in `store`.
    ///
    /// The returned user is meant to be published through the
    /// [`Session`](crate::session::Session).
    pub async fn authenticate(
        &self,
        token: Token,
        store: &SqliteStore,
    ) -> Result<AuthenticatedUser, AuthError> {
        if token.access_token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let profile = self
            .fetch_user_profile(&token.access_token)
            .await
            .map_err(AuthError::Profile)?;
        if profile.id.is_empty() {
            return Err(AuthError::Profile(RemoteError::Invalid(
                "profile has an empty id".to_string(),
            )));
        }

        store.insert_user(&profile.id, profile.display_name.as_deref())?;
        info!("Authenticated Spotify user {}", profile.id);

        Ok(AuthenticatedUser {
            user_id: profile.id,
            display_name: profile.display_name,
            token,
        })
    }

    /// `GET /me`
    pub async fn fetch_user_profile(&self, access_token: &str) -> Result<UserProfile, RemoteError> {
        self.get_json("/me", access_token).await
    }

    /// `GET /me/top/artists`, first page only, in the order Spotify ranks them.
    pub async fn fetch_top_artists(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<ArtistSnapshot>, RemoteError> {
        let res: TopArtistsResponse = self.get_json("/me/top/artists", user.access_token()).await?;
        if res.next.is_some() {
            debug!(
                "Top artists has {} entries, only the first {} are used",
                res.total,
                res.items.len()
            );
        }

        validate_artists(res.items)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.config.api_url, path);
        let res = self.http.get(&url).bearer_auth(access_token).send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }

        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn validate_artists(items: Vec<RemoteArtist>) -> Result<Vec<ArtistSnapshot>, RemoteError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, artist)| {
            if artist.id.trim().is_empty() {
                return Err(RemoteError::Invalid(format!(
                    "artist at position {} has an empty id",
                    index + 1
                )));
            }
            if !(0..=100).contains(&artist.popularity) {
                return Err(RemoteError::Invalid(format!(
                    "artist {} has popularity {} outside 0..=100",
                    artist.id, artist.popularity
                )));
            }
            if artist.followers.total < 0 {
                return Err(RemoteError::Invalid(format!(
                    "artist {} has a negative follower count",
                    artist.id
                )));
            }
            Ok(ArtistSnapshot::from(artist))
        })
        .collect()
}
