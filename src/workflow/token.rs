//! OAuth access token held by the browser session
//!
//! The token comes from Google's browser token flow and is only ever
//! forwarded upstream. Waiting for it is a watch subscription with a
//! deadline rather than a polling loop.

use crate::workflow::errors::{WorkflowError, WorkflowResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Token as returned by the OAuth callback, with its `expires_in`.
    pub fn expiring_in(access_token: impl Into<String>, expires_in: chrono::Duration) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: Some(Utc::now() + expires_in),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

#[derive(Clone)]
pub struct TokenStore {
    tx: Arc<watch::Sender<Option<AccessToken>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, token: AccessToken) {
        self.tx.send_replace(Some(token));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<AccessToken> {
        self.tx.borrow().clone()
    }

    /// Resolve as soon as a token is present, or fail after `timeout`.
    pub async fn wait_for_token(&self, timeout: Duration) -> WorkflowResult<AccessToken> {
        let mut rx = self.tx.subscribe();
        let waited = tokio::time::timeout(timeout, async {
            rx.wait_for(|token| token.is_some())
                .await
                .map(|token| token.clone())
        })
        .await;

        match waited {
            Ok(Ok(Some(token))) => Ok(token),
            Ok(_) => Err(WorkflowError::AuthenticationRequired),
            Err(_) => Err(WorkflowError::Timeout(timeout, "access token")),
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}
