//! In-process event bus connecting the flows to the error tray
//!
//! Flows publish; any number of listeners subscribe. Publishing with no
//! listeners is not an error.

use crate::workflow::storage::SheetReference;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

pub const ERROR_EVENT: &str = "greater-error";
pub const ERRORS_CLEARED_EVENT: &str = "greater-errors-cleared";
pub const SHEET_CREATED_EVENT: &str = "greater-sheet-created";

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Error,
    Warning,
}

/// Structured error record shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub timestamp: DateTime<Utc>,
    pub component: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    pub technical: String,
    pub stack: Option<String>,
    pub critical: bool,
}

impl ErrorEvent {
    pub fn new(component: &str, message: impl Into<String>, technical: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            component: component.to_string(),
            kind: ErrorKind::Error,
            message: message.into(),
            technical: technical.into(),
            stack: None,
            critical: false,
        }
    }

    /// `technical` is the error's own message; `stack` is its source chain.
    pub fn from_error(
        component: &str,
        message: impl Into<String>,
        err: &(dyn std::error::Error + 'static),
    ) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        let mut event = Self::new(component, message, err.to_string());
        if !chain.is_empty() {
            event.stack = Some(chain.join("\ncaused by: "));
        }
        event
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Error(ErrorEvent),
    ErrorsCleared,
    SheetCreated(SheetReference),
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::Error(_) => ERROR_EVENT,
            AppEvent::ErrorsCleared => ERRORS_CLEARED_EVENT,
            AppEvent::SheetCreated(_) => SHEET_CREATED_EVENT,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: AppEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            debug!(event = name, "No listeners for event");
        }
    }

    pub fn report(&self, event: ErrorEvent) {
        self.publish(AppEvent::Error(event));
    }

    pub fn report_error(
        &self,
        component: &str,
        message: impl Into<String>,
        err: &(dyn std::error::Error + 'static),
    ) {
        self.report(ErrorEvent::from_error(component, message, err));
    }

    pub fn clear_errors(&self) {
        self.publish(AppEvent::ErrorsCleared);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
