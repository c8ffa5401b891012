//! Readiness tracking for the Google client libraries
//!
//! Each API has one manager with a four-state lifecycle:
//! uninitialized, initializing, ready, failed. Concurrent callers of
//! [`ReadinessManager::initialize`] share a single load; a failed load can
//! be retried by calling `initialize` again.

use crate::workflow::token::TokenStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ApiKind {
    Sheets,
    Language,
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKind::Sheets => write!(f, "Sheets"),
            ApiKind::Language => write!(f, "Language"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadinessError {
    #[error("Failed to initialize {api} API: {message}")]
    Load { api: ApiKind, message: String },
}

/// Loads whatever an API needs before calls can be made.
#[async_trait]
pub trait ApiLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessStatus {
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

/// Result of the call gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiAccess {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl ApiAccess {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

type LoadFuture = Shared<BoxFuture<'static, Result<(), ReadinessError>>>;

enum State {
    Uninitialized,
    Initializing { attempt: u64, load: LoadFuture },
    Ready,
    Failed(String),
}

struct Inner {
    state: State,
    attempts: u64,
}

pub struct ReadinessManager {
    api: ApiKind,
    loader: Arc<dyn ApiLoader>,
    tokens: TokenStore,
    inner: Mutex<Inner>,
}

impl ReadinessManager {
    pub fn new(api: ApiKind, loader: Arc<dyn ApiLoader>, tokens: TokenStore) -> Self {
        Self {
            api,
            loader,
            tokens,
            inner: Mutex::new(Inner {
                state: State::Uninitialized,
                attempts: 0,
            }),
        }
    }

    pub fn api(&self) -> ApiKind {
        self.api
    }

    pub fn status(&self) -> ReadinessStatus {
        match &self.inner.lock().state {
            State::Uninitialized => ReadinessStatus::Uninitialized,
            State::Initializing { .. } => ReadinessStatus::Initializing,
            State::Ready => ReadinessStatus::Ready,
            State::Failed(message) => ReadinessStatus::Failed(message.clone()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.inner.lock().state, State::Ready)
    }

    /// Number of loads started so far.
    pub fn attempts(&self) -> u64 {
        self.inner.lock().attempts
    }

    /// Load the API, joining a load already in flight.
    pub async fn initialize(&self) -> Result<(), ReadinessError> {
        let (attempt, load) = {
            let mut inner = self.inner.lock();
            let in_flight = match &inner.state {
                State::Ready => return Ok(()),
                State::Initializing { attempt, load } => Some((*attempt, load.clone())),
                State::Uninitialized | State::Failed(_) => None,
            };

            match in_flight {
                Some(in_flight) => in_flight,
                None => {
                    inner.attempts += 1;
                    let attempt = inner.attempts;
                    let load = self.start_load();
                    inner.state = State::Initializing {
                        attempt,
                        load: load.clone(),
                    };
                    debug!(api = %self.api, attempt, "Initializing API");
                    (attempt, load)
                }
            }
        };

        let result = load.await;

        let mut inner = self.inner.lock();
        let current = matches!(
            &inner.state,
            State::Initializing { attempt: running, .. } if *running == attempt
        );
        if current {
            inner.state = match &result {
                Ok(()) => {
                    info!(api = %self.api, "API initialized");
                    State::Ready
                }
                Err(e) => {
                    warn!(api = %self.api, "{}", e);
                    State::Failed(e.to_string())
                }
            };
        }

        result
    }

    fn start_load(&self) -> LoadFuture {
        let loader = Arc::clone(&self.loader);
        let api = self.api;
        async move {
            loader.load().await.map_err(|e| ReadinessError::Load {
                api,
                message: format!("{:#}", e),
            })
        }
        .boxed()
        .shared()
    }

    /// `true` once ready, `false` if initialization fails.
    pub async fn wait_for_ready(&self) -> bool {
        self.initialize().await.is_ok()
    }

    /// Whether calls may be made right now, and why not if they may not.
    pub fn can_make_api_calls(&self) -> ApiAccess {
        self.can_make_api_calls_at(Utc::now())
    }

    pub fn can_make_api_calls_at(&self, now: DateTime<Utc>) -> ApiAccess {
        if !self.is_ready() {
            return ApiAccess::denied(format!("{} API not initialized", self.api));
        }

        match self.tokens.current() {
            None => ApiAccess::denied("No access token available"),
            Some(token) if token.is_expired_at(now) => ApiAccess::denied("Token expired"),
            Some(_) => ApiAccess::allowed(),
        }
    }
}
