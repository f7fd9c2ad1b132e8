use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::error::AppResult;
use crate::models::{Domain, FeedbackEvent, HistoryEntry, Polarity, StoredPreferences};

use super::{FeedbackStore, HistoryStore, PreferencesStore};

/// In-memory feedback store used in tests and as the startup fallback
#[derive(Default)]
pub struct InMemoryFeedbackStore {
    events: RwLock<HashMap<String, Vec<FeedbackEvent>>>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn record(&self, event: FeedbackEvent) -> AppResult<()> {
        let mut events = self.events.write().await;
        let user_events = events.entry(event.user_id.clone()).or_default();

        // Upsert on (user_id, item_id)
        if let Some(existing) = user_events.iter_mut().find(|e| e.item_id == event.item_id) {
            *existing = event;
        } else {
            user_events.push(event);
        }
        Ok(())
    }

    async fn list_recent(
        &self,
        user_id: &str,
        domain: Option<Domain>,
        polarity: Option<Polarity>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<FeedbackEvent>> {
        let events = self.events.read().await;
        let mut matching: Vec<FeedbackEvent> = events
            .get(user_id)
            .map(|user_events| {
                user_events
                    .iter()
                    .filter(|e| domain.map(|d| e.domain == d).unwrap_or(true))
                    .filter(|e| polarity.map(|p| e.polarity == p).unwrap_or(true))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn clear(&self, user_id: &str) -> AppResult<()> {
        self.events.write().await.remove(user_id);
        Ok(())
    }
}

/// In-memory preference store keyed by `(user_id, domain)`
#[derive(Default)]
pub struct InMemoryPreferencesStore {
    records: RwLock<HashMap<(String, Domain), StoredPreferences>>,
}

impl InMemoryPreferencesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PreferencesStore for InMemoryPreferencesStore {
    async fn get(&self, user_id: &str, domain: Domain) -> AppResult<Option<StoredPreferences>> {
        let records = self.records.read().await;
        Ok(records.get(&(user_id.to_string(), domain)).cloned())
    }

    async fn upsert(
        &self,
        user_id: &str,
        domain: Domain,
        preferences: &StoredPreferences,
    ) -> AppResult<()> {
        let mut records = self.records.write().await;
        records.insert((user_id.to_string(), domain), preferences.clone());
        Ok(())
    }
}

/// In-memory local history provenance
///
/// Each user's entries sit behind their own mutex so concurrent feedback for
/// the same user serializes its read-modify-write, while different users
/// never contend.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    users: RwLock<HashMap<String, Arc<Mutex<HashMap<String, HistoryEntry>>>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn user_entries(&self, user_id: &str) -> Arc<Mutex<HashMap<String, HistoryEntry>>> {
        {
            let users = self.users.read().await;
            if let Some(entries) = users.get(user_id) {
                return entries.clone();
            }
        }
        let mut users = self.users.write().await;
        users.entry(user_id.to_string()).or_default().clone()
    }
}

#[async_trait::async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn list(&self, user_id: &str) -> AppResult<Vec<HistoryEntry>> {
        let entries = self.user_entries(user_id).await;
        let entries = entries.lock().await;
        Ok(entries.values().cloned().collect())
    }

    async fn record(&self, user_id: &str, entry: HistoryEntry) -> AppResult<()> {
        let entries = self.user_entries(user_id).await;
        let mut entries = entries.lock().await;
        entries.insert(entry.item_id.clone(), entry);
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> AppResult<()> {
        self.users.write().await.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn event(user_id: &str, item_id: &str, polarity: Polarity, age_hours: i64) -> FeedbackEvent {
        FeedbackEvent {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            domain: Domain::Music,
            polarity,
            timestamp: Utc::now() - Duration::hours(age_hours),
            signals: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_record_upserts_on_user_item_pair() {
        let store = InMemoryFeedbackStore::new();
        store
            .record(event("u1", "a", Polarity::Like, 1))
            .await
            .unwrap();
        store
            .record(event("u1", "a", Polarity::Dislike, 0))
            .await
            .unwrap();

        let events = store.list_recent("u1", None, None, 10, 0).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].polarity, Polarity::Dislike);
    }

    #[tokio::test]
    async fn test_list_recent_orders_and_filters() {
        let store = InMemoryFeedbackStore::new();
        store
            .record(event("u1", "old", Polarity::Like, 5))
            .await
            .unwrap();
        store
            .record(event("u1", "new", Polarity::Like, 1))
            .await
            .unwrap();
        store
            .record(event("u1", "no", Polarity::Dislike, 0))
            .await
            .unwrap();

        let likes = store
            .list_recent("u1", Some(Domain::Music), Some(Polarity::Like), 10, 0)
            .await
            .unwrap();
        let ids: Vec<&str> = likes.iter().map(|e| e.item_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);

        let limited = store.list_recent("u1", None, None, 1, 0).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].item_id, "no");
    }

    #[tokio::test]
    async fn test_history_store_supersedes_in_place() {
        let store = InMemoryHistoryStore::new();
        let t0 = Utc::now();
        store
            .record(
                "u1",
                HistoryEntry {
                    item_id: "a".to_string(),
                    polarity: Polarity::Dislike,
                    timestamp: t0,
                },
            )
            .await
            .unwrap();
        store
            .record(
                "u1",
                HistoryEntry {
                    item_id: "a".to_string(),
                    polarity: Polarity::Like,
                    timestamp: t0 + Duration::minutes(5),
                },
            )
            .await
            .unwrap();

        let entries = store.list("u1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].polarity, Polarity::Like);
    }

    #[tokio::test]
    async fn test_history_clear_affects_one_user_only() {
        let store = InMemoryHistoryStore::new();
        let entry = HistoryEntry {
            item_id: "a".to_string(),
            polarity: Polarity::Like,
            timestamp: Utc::now(),
        };
        store.record("u1", entry.clone()).await.unwrap();
        store.record("u2", entry).await.unwrap();

        store.clear("u1").await.unwrap();
        assert!(store.list("u1").await.unwrap().is_empty());
        assert_eq!(store.list("u2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_preferences_round_trip() {
        let store = InMemoryPreferencesStore::new();
        assert!(store.get("u1", Domain::Music).await.unwrap().is_none());

        let prefs = StoredPreferences {
            genres: vec!["Rock".to_string()],
            ..Default::default()
        };
        store.upsert("u1", Domain::Music, &prefs).await.unwrap();

        let fetched = store.get("u1", Domain::Music).await.unwrap().unwrap();
        assert_eq!(fetched.genres, vec!["Rock".to_string()]);
        assert!(store.get("u1", Domain::Film).await.unwrap().is_none());
    }
}
