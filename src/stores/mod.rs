use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{Domain, FeedbackEvent, HistoryEntry, Polarity, StoredPreferences};

pub mod memory;
pub mod postgres;
pub mod redis;

pub use self::memory::{InMemoryFeedbackStore, InMemoryHistoryStore, InMemoryPreferencesStore};
pub use self::postgres::{create_pool, PgFeedbackStore, PgPreferencesStore};
pub use self::redis::{create_redis_client, RedisHistoryStore};

/// Persistent feedback store
///
/// Records are keyed by `(user_id, item_id)`: recording the same pair again
/// replaces the prior event rather than appending.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Upserts a feedback event
    async fn record(&self, event: FeedbackEvent) -> AppResult<()>;

    /// Lists feedback events for a user, newest first
    async fn list_recent(
        &self,
        user_id: &str,
        domain: Option<Domain>,
        polarity: Option<Polarity>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<FeedbackEvent>>;

    /// Removes every feedback event for a user
    async fn clear(&self, user_id: &str) -> AppResult<()>;
}

/// Durable per-user, per-domain preference store
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PreferencesStore: Send + Sync {
    async fn get(&self, user_id: &str, domain: Domain) -> AppResult<Option<StoredPreferences>>;

    /// Writes the merged record; insert when absent, field-wise update when present
    async fn upsert(
        &self,
        user_id: &str,
        domain: Domain,
        preferences: &StoredPreferences,
    ) -> AppResult<()>;
}

/// Local history provenance: the fast, possibly stale client-side cache
///
/// Single writer per user; implementations serialize the read-modify-write of
/// one user's entries so concurrent feedback cannot drop updates.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    async fn list(&self, user_id: &str) -> AppResult<Vec<HistoryEntry>>;

    async fn record(&self, user_id: &str, entry: HistoryEntry) -> AppResult<()>;

    async fn clear(&self, user_id: &str) -> AppResult<()>;
}

/// Remote history provenance, authoritative on conflict
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteHistory: Send + Sync {
    /// May be unavailable; callers degrade to local-only on error
    async fn list_history(&self, user_id: &str) -> AppResult<Vec<HistoryEntry>>;

    async fn clear_history(&self, user_id: &str) -> AppResult<()>;
}

/// Remote provenance backed by the authoritative feedback store
///
/// Projects persisted feedback events down to the minimal history entries the
/// uniqueness filter needs.
pub struct FeedbackBackedRemote {
    feedback: Arc<dyn FeedbackStore>,
}

impl FeedbackBackedRemote {
    /// Upper bound on history entries projected per user
    const HISTORY_WINDOW: i64 = 1000;

    pub fn new(feedback: Arc<dyn FeedbackStore>) -> Self {
        Self { feedback }
    }
}

#[async_trait::async_trait]
impl RemoteHistory for FeedbackBackedRemote {
    async fn list_history(&self, user_id: &str) -> AppResult<Vec<HistoryEntry>> {
        let events = self
            .feedback
            .list_recent(user_id, None, None, Self::HISTORY_WINDOW, 0)
            .await?;

        Ok(events
            .into_iter()
            .map(|event| HistoryEntry {
                item_id: event.item_id,
                polarity: event.polarity,
                timestamp: event.timestamp,
            })
            .collect())
    }

    async fn clear_history(&self, user_id: &str) -> AppResult<()> {
        self.feedback.clear(user_id).await
    }
}
