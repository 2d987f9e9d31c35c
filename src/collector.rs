//! Background task that records the user's top artists on a fixed interval.
//!
//! The task starts with the server and never exits. While nobody has logged
//! in it only checks the [`Session`] every `auth_poll_interval`; once a user
//! is published it fetches and stores a snapshot every `interval`. Failures
//! are logged and the next attempt still waits the full interval.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info};

use crate::{
    error::{AppError, RemoteError, StorageError},
    session::{AuthenticatedUser, Session},
    spotify::SpotifyClient,
    store::SqliteStore,
    types::ArtistSnapshot,
};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Error fetching top artists: {0}")]
    Remote(#[from] RemoteError),

    #[error("Error inserting data: {0}")]
    Storage(#[from] StorageError),
}

impl From<CollectError> for AppError {
    fn from(err: CollectError) -> Self {
        match err {
            CollectError::Remote(e) => AppError::Remote(e),
            CollectError::Storage(e) => AppError::Storage(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectOutcome {
    NotAuthenticated,
    Stored { user_id: String, artists: usize },
}

/// Fetches `user`'s top artists and stores them as one snapshot.
///
/// Returns the artists in the order Spotify ranked them.
pub async fn fetch_and_store(
    client: &SpotifyClient,
    store: &SqliteStore,
    user: &AuthenticatedUser,
) -> Result<Vec<ArtistSnapshot>, CollectError> {
    let artists = client.fetch_top_artists(user).await?;
    store.insert_snapshot(&user.user_id, &artists)?;
    Ok(artists)
}

#[derive(Clone)]
pub struct Collector {
    client: SpotifyClient,
    store: Arc<SqliteStore>,
    session: Session,
    interval: Duration,
    auth_poll_interval: Duration,
}

impl Collector {
    pub fn new(
        client: SpotifyClient,
        store: Arc<SqliteStore>,
        session: Session,
        interval: Duration,
        auth_poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            store,
            session,
            interval,
            auth_poll_interval,
        }
    }

    /// One iteration: does nothing while unauthenticated.
    pub async fn collect_once(&self) -> Result<CollectOutcome, CollectError> {
        let Some(user) = self.session.current().await else {
            return Ok(CollectOutcome::NotAuthenticated);
        };

        let artists = fetch_and_store(&self.client, &self.store, &user).await?;
        Ok(CollectOutcome::Stored {
            user_id: user.user_id.clone(),
            artists: artists.len(),
        })
    }

    /// How long to wait after an iteration that ended with `result`.
    pub fn next_delay(&self, result: &Result<CollectOutcome, CollectError>) -> Duration {
        match result {
            Ok(CollectOutcome::NotAuthenticated) => self.auth_poll_interval,
            _ => self.interval,
        }
    }

    pub async fn run(self) {
        info!(
            "Collector started, interval {:?}, waiting for login every {:?}",
            self.interval, self.auth_poll_interval
        );

        loop {
            let result = self.collect_once().await;
            match &result {
                Ok(CollectOutcome::NotAuthenticated) => {
                    info!("Spotify client not initialized yet");
                }
                Ok(CollectOutcome::Stored { user_id, artists }) => {
                    info!("Stored snapshot of {} top artists for {}", artists, user_id);
                }
                Err(e) => error!("{}", e),
            }

            sleep(self.next_delay(&result)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SpotifyConfig, types::Token};
    use chrono::FixedOffset;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixture {
        collector: Collector,
        store: Arc<SqliteStore>,
        session: Session,
        _temp_dir: TempDir,
    }

    fn fixture(api_url: String) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(
            SqliteStore::new(
                temp_dir.path().join("spotify_data.db"),
                FixedOffset::east_opt(3 * 3600).unwrap(),
            )
            .unwrap(),
        );
        let client = SpotifyClient::new(SpotifyConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:8080/callback".to_string(),
            auth_url: format!("{}/authorize", api_url),
            token_url: format!("{}/api/token", api_url),
            api_url,
            scope: "user-top-read".to_string(),
        });
        let session = Session::new();
        let collector = Collector::new(
            client,
            Arc::clone(&store),
            session.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(60),
        );
        Fixture {
            collector,
            store,
            session,
            _temp_dir: temp_dir,
        }
    }

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "user-1".to_string(),
            display_name: Some("Listener".to_string()),
            token: Token {
                access_token: "token-1".to_string(),
                token_type: "Bearer".to_string(),
                expires_in: 3600,
                refresh_token: None,
                scope: None,
            },
        }
    }

    #[tokio::test]
    async fn test_does_not_call_remote_while_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let fixture = fixture(server.uri());

        let result = fixture.collector.collect_once().await;

        assert_eq!(result.as_ref().unwrap(), &CollectOutcome::NotAuthenticated);
        assert_eq!(fixture.collector.next_delay(&result), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_stores_snapshot_once_authenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/top/artists"))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "id": "a1", "name": "One", "popularity": 60,
                      "followers": { "total": 10 }, "genres": ["rock", "pop"] },
                    { "id": "a2", "name": "Two", "popularity": 40,
                      "followers": { "total": 5 }, "genres": ["pop"] }
                ],
                "total": 2, "limit": 20, "offset": 0, "next": null
            })))
            .mount(&server)
            .await;
        let fixture = fixture(server.uri());
        fixture.store.insert_user("user-1", Some("Listener")).unwrap();
        fixture.session.establish(user()).await;

        let result = fixture.collector.collect_once().await;

        assert_eq!(
            result.as_ref().unwrap(),
            &CollectOutcome::Stored {
                user_id: "user-1".to_string(),
                artists: 2
            }
        );
        assert_eq!(fixture.collector.next_delay(&result), Duration::from_secs(3600));
        let counts = fixture.store.fetch_genre_counts().unwrap();
        assert_eq!(counts["pop"], 2);
        assert_eq!(counts["rock"], 1);
    }

    #[tokio::test]
    async fn test_remote_failure_waits_full_interval() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/top/artists"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;
        let fixture = fixture(server.uri());
        fixture.session.establish(user()).await;

        let result = fixture.collector.collect_once().await;

        assert!(matches!(
            result,
            Err(CollectError::Remote(RemoteError::Status { .. }))
        ));
        assert_eq!(fixture.collector.next_delay(&result), Duration::from_secs(3600));
        assert!(fixture.store.fetch_all_artists().unwrap().is_empty());
    }
}
