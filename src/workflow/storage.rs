use crate::workflow::errors::WorkflowResult;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Session storage key holding the active sheet reference
pub const CURRENT_SHEET_KEY: &str = "greater-current-sheet-id";

/// Tab-scoped key/value storage
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values.write().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

/// The spreadsheet created in this session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetReference {
    pub id: String,
    pub name: String,
    pub created: DateTime<Utc>,
}

impl SheetReference {
    pub fn save(&self, store: &dyn SessionStore) -> WorkflowResult<()> {
        store.set(CURRENT_SHEET_KEY, serde_json::to_string(self)?);
        Ok(())
    }

    /// A stored value that does not parse is treated as absent.
    pub fn load(store: &dyn SessionStore) -> Option<Self> {
        let raw = store.get(CURRENT_SHEET_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(reference) => Some(reference),
            Err(e) => {
                warn!("Ignoring unreadable sheet reference in session storage: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let store = MemorySessionStore::new();
        assert!(SheetReference::load(&store).is_none());

        let reference = SheetReference {
            id: "1AbC".into(),
            name: "Jo".into(),
            created: Utc::now(),
        };
        reference.save(&store).unwrap();

        assert_eq!(SheetReference::load(&store), Some(reference));
        assert!(store.get(CURRENT_SHEET_KEY).unwrap().contains("\"id\":\"1AbC\""));
    }

    #[test]
    fn test_corrupt_value_is_ignored() {
        let store = MemorySessionStore::new();
        store.set(CURRENT_SHEET_KEY, "not json".into());
        assert!(SheetReference::load(&store).is_none());

        store.remove(CURRENT_SHEET_KEY);
        assert!(store.get(CURRENT_SHEET_KEY).is_none());
    }
}
