//! Bounded list of recent errors shown to the user

use crate::workflow::events::{AppEvent, ErrorEvent, EventBus};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, warn};
use uuid::Uuid;

pub const MAX_VISIBLE_ERRORS: usize = 3;
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct TrayEntry {
    pub id: Uuid,
    pub event: ErrorEvent,
}

type Entries = Arc<Mutex<VecDeque<TrayEntry>>>;

/// Keeps the most recent errors; non-critical ones disappear on their own.
pub struct ErrorTray {
    entries: Entries,
    listener: JoinHandle<()>,
}

impl ErrorTray {
    /// Must be called from within a Tokio runtime.
    pub fn spawn(bus: &EventBus, dismiss_after: Duration) -> Self {
        let entries: Entries = Arc::new(Mutex::new(VecDeque::new()));
        let mut rx = bus.subscribe();

        let listener = tokio::spawn({
            let entries = Arc::clone(&entries);
            async move {
                loop {
                    match rx.recv().await {
                        Ok(AppEvent::Error(event)) => push(&entries, event, dismiss_after),
                        Ok(AppEvent::ErrorsCleared) => entries.lock().clear(),
                        Ok(AppEvent::SheetCreated(_)) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Error tray fell behind the event bus");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });

        Self { entries, listener }
    }

    /// Oldest first
    pub fn entries(&self) -> Vec<TrayEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }
}

impl Drop for ErrorTray {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn push(entries: &Entries, event: ErrorEvent, dismiss_after: Duration) {
    error!(
        component = %event.component,
        technical = %event.technical,
        "{}",
        event.message
    );

    let id = Uuid::new_v4();
    let critical = event.critical;
    {
        let mut entries = entries.lock();
        entries.push_back(TrayEntry { id, event });
        while entries.len() > MAX_VISIBLE_ERRORS {
            entries.pop_front();
        }
    }

    if !critical {
        let entries = Arc::clone(entries);
        tokio::spawn(async move {
            tokio::time::sleep(dismiss_after).await;
            entries.lock().retain(|entry| entry.id != id);
        });
    }
}
