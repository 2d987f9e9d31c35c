//! The authenticated session shared by the HTTP handlers and the collector.
//!
//! Nobody is logged in when the server starts. A successful OAuth callback
//! publishes an [`AuthenticatedUser`]; from then on every reader sees it.
//! [`PendingStates`] tracks the OAuth `state` values of logins in progress.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::{Mutex, RwLock};

use crate::types::Token;

/// The logged-in user and the token used to act on their behalf.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub display_name: Option<String>,
    pub token: Token,
}

impl AuthenticatedUser {
    pub fn access_token(&self) -> &str {
        &self.token.access_token
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    current: Arc<RwLock<Option<Arc<AuthenticatedUser>>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `user` as the current session, replacing any previous login.
    pub async fn establish(&self, user: AuthenticatedUser) -> Arc<AuthenticatedUser> {
        let user = Arc::new(user);
        *self.current.write().await = Some(Arc::clone(&user));
        user
    }

    /// The current user, if anybody has logged in.
    pub async fn current(&self) -> Option<Arc<AuthenticatedUser>> {
        self.current.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }
}

/// OAuth `state` values issued by `/login` and not used yet.
///
/// A state is accepted once and only within [`PendingStates::TTL`]. Expired
/// entries are dropped whenever a new state is issued, and the set never
/// holds more than [`PendingStates::CAPACITY`] entries, the oldest going
/// first.
#[derive(Debug, Clone, Default)]
pub struct PendingStates {
    issued: Arc<Mutex<HashMap<String, Instant>>>,
}

impl PendingStates {
    pub const TTL: Duration = Duration::from_secs(10 * 60);
    pub const CAPACITY: usize = 64;

    pub async fn issue(&self, state: String) {
        self.issue_at(state, Instant::now()).await
    }

    /// Removes `state` and reports whether it was issued and is still fresh.
    pub async fn consume(&self, state: &str) -> bool {
        self.consume_at(state, Instant::now()).await
    }

    pub async fn len(&self) -> usize {
        self.issued.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.issued.lock().await.is_empty()
    }

    async fn issue_at(&self, state: String, now: Instant) {
        let mut issued = self.issued.lock().await;
        issued.retain(|_, at| now.saturating_duration_since(*at) < Self::TTL);

        while issued.len() >= Self::CAPACITY {
            let oldest = issued
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(state, _)| state.clone());
            match oldest {
                Some(oldest) => issued.remove(&oldest),
                None => break,
            };
        }

        issued.insert(state, now);
    }

    async fn consume_at(&self, state: &str, now: Instant) -> bool {
        match self.issued.lock().await.remove(state) {
            Some(at) => now.saturating_duration_since(at) < Self::TTL,
            None => false,
        }
    }
}
