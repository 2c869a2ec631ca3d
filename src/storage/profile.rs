//! Profile document store
//!
//! Best-effort persistence: failures are logged and swallowed, and a missing
//! or unreadable document loads as an empty profile. Every load-modify-save
//! runs under one writer lock shared by all clones of the store, and a failed
//! read never turns into a write.

use super::{KeyValueStore, PROFILE_KEY};
use crate::error::BuddyError;
use crate::profile::{FinancialProfile, ProfileField};
use crate::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

#[derive(Clone)]
pub struct ProfileStore {
    slots: Arc<dyn KeyValueStore>,
    writer: Arc<Mutex<()>>,
}

impl ProfileStore {
    pub fn new(slots: Arc<dyn KeyValueStore>) -> Self {
        Self {
            slots,
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load(&self) -> FinancialProfile {
        match self.try_load().await {
            Ok(profile) => profile.unwrap_or_default(),
            Err(e) => {
                error!("Error loading profile: {}", e);
                FinancialProfile::default()
            }
        }
    }

    pub async fn save(&self, profile: &FinancialProfile) {
        let _writer = self.writer.lock().await;
        self.write(profile).await;
    }

    /// Shallow-merge `updates` over the stored document.
    ///
    /// Skipped entirely when the stored document cannot be read.
    pub async fn update(&self, updates: FinancialProfile) {
        debug!("Applying profile updates");
        if let Err(e) = self.modify(None, |current| current.merge(updates)).await {
            error!("Profile update skipped: {}", e);
        }
    }

    /// Set one field from raw user input and persist the whole document.
    ///
    /// Invalid input and read failures are returned before anything is written.
    pub async fn edit(&self, field: ProfileField, input: &str) -> Result<FinancialProfile> {
        let edit = field.parse_input(input)?;
        self.modify(None, |mut profile| {
            profile.apply(edit);
            profile
        })
        .await
    }

    /// Load, change and save the document while holding the writer lock.
    ///
    /// `if_match` is an `If-Match` style list of entity tags (or `*`). When
    /// none of them is the stored document's [`FinancialProfile::etag`] the
    /// call fails with `PreconditionFailed` and writes nothing.
    pub async fn modify<F>(&self, if_match: Option<&str>, change: F) -> Result<FinancialProfile>
    where
        F: FnOnce(FinancialProfile) -> FinancialProfile,
    {
        let _writer = self.writer.lock().await;

        let current = self.try_load().await?.unwrap_or_default();
        if let Some(expected) = if_match {
            let tag = current.etag();
            if !etag_matches(expected, &tag) {
                return Err(BuddyError::PreconditionFailed(tag));
            }
        }

        let updated = change(current);
        self.write(&updated).await;
        Ok(updated)
    }

    /// `Ok(None)` when nothing usable is stored; `Err` only when the read fails.
    async fn try_load(&self) -> Result<Option<FinancialProfile>> {
        let Some(raw) = self.slots.get(PROFILE_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!("Stored profile is unreadable, starting empty: {}", e);
                Ok(None)
            }
        }
    }

    async fn write(&self, profile: &FinancialProfile) {
        if let Err(e) = self.try_save(profile).await {
            error!("Error saving profile: {}", e);
        }
    }

    async fn try_save(&self, profile: &FinancialProfile) -> Result<()> {
        let raw = serde_json::to_string(profile)?;
        self.slots.set(PROFILE_KEY, raw).await
    }
}

fn etag_matches(if_match: &str, current: &str) -> bool {
    if_match
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate == current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{AssetField, Assets, EmploymentStatus};
    use crate::storage::testing::{FlakyStore, SlowStore};
    use crate::storage::InMemoryKeyValueStore;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn store() -> (Arc<InMemoryKeyValueStore>, ProfileStore) {
        let slots = Arc::new(InMemoryKeyValueStore::new());
        (slots.clone(), ProfileStore::new(slots))
    }

    fn denver_at_30() -> FinancialProfile {
        FinancialProfile {
            age: Some(30),
            location: Some("Denver".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let (_, profiles) = store();
        assert!(profiles.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_unparseable_is_empty() {
        let (slots, profiles) = store();
        slots.set(PROFILE_KEY, "not json".to_string()).await.unwrap();
        assert!(profiles.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_nested_documents() {
        let (_, profiles) = store();

        profiles
            .save(&FinancialProfile {
                age: Some(30),
                assets: Some(Assets {
                    checking_savings: Some(50.0),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .await;

        profiles
            .update(FinancialProfile {
                assets: Some(Assets {
                    investments: Some(100.0),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .await;

        let profile = profiles.load().await;
        assert_eq!(profile.age, Some(30));
        assert_eq!(
            profile.assets,
            Some(Assets {
                investments: Some(100.0),
                ..Default::default()
            })
        );
    }

    #[tokio::test]
    async fn test_edit_persists_whole_document() {
        let (_, profiles) = store();
        profiles
            .save(&FinancialProfile {
                employment_status: Some(EmploymentStatus::Student),
                ..Default::default()
            })
            .await;

        profiles
            .edit(ProfileField::Asset(AssetField::Investments), "2,500")
            .await
            .unwrap();

        let profile = profiles.load().await;
        assert_eq!(profile.employment_status, Some(EmploymentStatus::Student));
        assert_eq!(profile.assets.unwrap().investments, Some(2500.0));
    }

    #[tokio::test]
    async fn test_invalid_edit_writes_nothing() {
        let (slots, profiles) = store();

        let result = profiles
            .edit(ProfileField::Asset(AssetField::Investments), "lots")
            .await;

        assert!(matches!(result, Err(BuddyError::InvalidProfileValue { .. })));
        assert_eq!(slots.get(PROFILE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persistence_failures_are_swallowed() {
        let slots = Arc::new(FlakyStore::failing_writes());
        let profiles = ProfileStore::new(slots.clone());

        profiles
            .update(FinancialProfile {
                income: Some(5000.0),
                ..Default::default()
            })
            .await;
        assert!(profiles.load().await.is_empty());

        slots.fail_reads.store(true, Ordering::SeqCst);
        assert!(profiles.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_keeps_stored_document() {
        let slots = Arc::new(FlakyStore::default());
        let profiles = ProfileStore::new(slots.clone());
        profiles.save(&denver_at_30()).await;

        slots.fail_reads.store(true, Ordering::SeqCst);
        profiles
            .update(FinancialProfile {
                income: Some(5000.0),
                ..Default::default()
            })
            .await;
        let edited = profiles.edit(ProfileField::Dependents, "2").await;
        assert!(matches!(edited, Err(BuddyError::DatabaseError(_))));

        slots.fail_reads.store(false, Ordering::SeqCst);
        assert_eq!(profiles.load().await, denver_at_30());
    }

    #[tokio::test]
    async fn test_overlapping_updates_are_both_kept() {
        let slots = Arc::new(SlowStore::new(Duration::from_millis(50)));
        let profiles = ProfileStore::new(slots);
        let other = profiles.clone();

        tokio::join!(
            profiles.update(FinancialProfile {
                age: Some(30),
                ..Default::default()
            }),
            other.update(FinancialProfile {
                income: Some(5000.0),
                ..Default::default()
            }),
            other.edit(ProfileField::Location, "Denver"),
        );

        let profile = profiles.load().await;
        assert_eq!(profile.age, Some(30));
        assert_eq!(profile.income, Some(5000.0));
        assert_eq!(profile.location.as_deref(), Some("Denver"));
    }

    #[tokio::test]
    async fn test_modify_checks_entity_tag() {
        let (slots, profiles) = store();
        profiles.save(&denver_at_30()).await;
        let stale = FinancialProfile::default().etag();

        let result = profiles
            .modify(Some(&stale), |mut p| {
                p.age = Some(99);
                p
            })
            .await;
        assert!(
            matches!(result, Err(BuddyError::PreconditionFailed(tag)) if tag == denver_at_30().etag())
        );
        assert!(slots.get(PROFILE_KEY).await.unwrap().unwrap().contains("30"));

        let current = format!("{}, {}", stale, denver_at_30().etag());
        let updated = profiles
            .modify(Some(&current), |mut p| {
                p.age = Some(31);
                p
            })
            .await
            .unwrap();
        assert_eq!(updated.age, Some(31));

        let any = profiles.modify(Some("*"), |p| p).await.unwrap();
        assert_eq!(any.age, Some(31));
    }
}
