//! Key-value persistence layer
//!
//! Every document lives in a single string slot. Stores above this layer
//! always read and write whole documents; there is no partial update here.

use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod lists;
pub mod profile;
pub mod sqlite;

pub use lists::{ListStore, MessageStore, TaskStore};
pub use profile::ProfileStore;
pub use sqlite::SqliteKeyValueStore;

/// Slot holding the financial profile document
pub const PROFILE_KEY: &str = "@finance_buddy_profile";
/// Slot holding the chat transcript array
pub const MESSAGES_KEY: &str = "@finance_buddy_messages";
/// Slot holding the task checklist array
pub const TASKS_KEY: &str = "@finance_buddy_tasks";

/// Trait for slot persistence
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
}

/// In-memory slot store for development and tests
#[derive(Clone)]
pub struct InMemoryKeyValueStore {
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let slots = self.slots.read().await;
        Ok(slots.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut slots = self.slots.write().await;
        slots.insert(key.to_string(), value);
        Ok(())
    }
}

/// Open the slot store selected by configuration.
///
/// A configured database that cannot be opened falls back to memory so the
/// app keeps working for the session.
pub async fn open_store(database_url: Option<&str>) -> Arc<dyn KeyValueStore> {
    if let Some(url) = database_url {
        match SqliteKeyValueStore::connect(url).await {
            Ok(store) => {
                tracing::info!("Slot store backend: sqlite");
                return Arc::new(store);
            }
            Err(error) => {
                tracing::warn!(
                    "Failed to open sqlite slot store, falling back to in-memory: {}",
                    error
                );
            }
        }
    }

    tracing::info!("Slot store backend: in-memory");
    Arc::new(InMemoryKeyValueStore::new())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_overwrites() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get(PROFILE_KEY).await.unwrap(), None);

        store.set(PROFILE_KEY, "{}".to_string()).await.unwrap();
        store.set(PROFILE_KEY, r#"{"age":30}"#.to_string()).await.unwrap();

        assert_eq!(
            store.get(PROFILE_KEY).await.unwrap().as_deref(),
            Some(r#"{"age":30}"#)
        );
        assert_eq!(store.get(TASKS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_store_defaults_to_memory() {
        let store = open_store(None).await;
        store.set(MESSAGES_KEY, "[]".to_string()).await.unwrap();
        assert_eq!(store.get(MESSAGES_KEY).await.unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_in_memory_clones_share_slots() {
        let store = InMemoryKeyValueStore::new();
        let other = store.clone();

        tokio_test::block_on(async {
            store.set(TASKS_KEY, "[]".to_string()).await.unwrap();
            assert_eq!(other.get(TASKS_KEY).await.unwrap().as_deref(), Some("[]"));
        });
    }
}
