//! Whole-collection list stores for messages and tasks
//!
//! Every save re-serializes the full sequence into one slot. Message
//! timestamps travel as RFC 3339 text (see [`crate::models::Message`]).

use super::{KeyValueStore, MESSAGES_KEY, TASKS_KEY};
use crate::models::{Message, Task};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{error, warn};

pub type MessageStore = ListStore<Message>;
pub type TaskStore = ListStore<Task>;

pub struct ListStore<T> {
    slots: Arc<dyn KeyValueStore>,
    key: &'static str,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for ListStore<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            key: self.key,
            _records: PhantomData,
        }
    }
}

impl ListStore<Message> {
    pub fn messages(slots: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(slots, MESSAGES_KEY)
    }
}

impl ListStore<Task> {
    pub fn tasks(slots: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(slots, TASKS_KEY)
    }
}

impl<T> ListStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn with_key(slots: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            slots,
            key,
            _records: PhantomData,
        }
    }

    /// Stored sequence, or empty when the slot is missing or unreadable.
    pub async fn load(&self) -> Vec<T> {
        let raw = match self.slots.get(self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!(slot = self.key, "Error loading list: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(slot = self.key, "Stored list is unreadable, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn save(&self, items: &[T]) {
        if let Err(e) = self.try_save(items).await {
            error!(slot = self.key, "Error saving list: {}", e);
        }
    }

    async fn try_save(&self, items: &[T]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.slots.set(self.key, raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskCategory;
    use crate::storage::testing::FlakyStore;
    use crate::storage::InMemoryKeyValueStore;

    fn slots() -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryKeyValueStore::new())
    }

    #[tokio::test]
    async fn test_empty_round_trip() {
        let store = MessageStore::messages(slots());
        store.save(&[]).await;
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_message_timestamp_round_trip() {
        let store = MessageStore::messages(slots());
        let msg = Message::user("Should I refinance?");

        store.save(std::slice::from_ref(&msg)).await;
        let loaded = store.load().await;

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, msg.id);
        assert_eq!(loaded[0].timestamp.timestamp(), msg.timestamp.timestamp());
        assert_eq!(
            loaded[0].timestamp.timestamp_subsec_millis(),
            msg.timestamp.timestamp_subsec_millis()
        );
    }

    #[tokio::test]
    async fn test_save_replaces_whole_collection() {
        let store = TaskStore::tasks(slots());
        let first = vec![
            Task::new("1", "a", "a", TaskCategory::Debt),
            Task::new("2", "b", "b", TaskCategory::Savings),
        ];
        store.save(&first).await;
        store.save(&first[1..]).await;

        let loaded = store.load().await;
        assert_eq!(loaded, vec![first[1].clone()]);
    }

    #[tokio::test]
    async fn test_lists_use_separate_slots() {
        let shared = slots();
        let messages = MessageStore::messages(shared.clone());
        let tasks = TaskStore::tasks(shared);

        messages.save(&[Message::bot("hi")]).await;
        assert!(tasks.load().await.is_empty());
        assert_eq!(messages.load().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_slot_loads_empty() {
        let shared = slots();
        shared.set(TASKS_KEY, r#"[{"id":1}]"#.to_string()).await.unwrap();
        assert!(TaskStore::tasks(shared).load().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let store = TaskStore::tasks(Arc::new(FlakyStore::failing_writes()));
        store
            .save(&[Task::new("1", "a", "a", TaskCategory::Budgeting)])
            .await;
        assert!(store.load().await.is_empty());
    }
}
