use std::collections::HashMap;
use std::sync::Arc;

use redis::{AsyncCommands, Client};
use tokio::sync::{Mutex, RwLock};

use crate::error::{AppError, AppResult};
use crate::models::HistoryEntry;

use super::HistoryStore;

/// Creates a Redis client for the local history cache
///
/// Uses connection pooling via the connection-manager feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

fn history_key(user_id: &str) -> String {
    format!("history:{user_id}")
}

/// Redis-backed local history provenance
///
/// Each user's entries live in one JSON value under `history:{user_id}`.
/// A per-user in-process mutex serializes the read-modify-write on record;
/// cross-process coordination is unnecessary since the remote provenance is
/// authoritative on conflict.
pub struct RedisHistoryStore {
    client: Client,
    user_locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl RedisHistoryStore {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            user_locks: RwLock::new(HashMap::new()),
        }
    }

    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.user_locks.read().await;
            if let Some(lock) = locks.get(user_id) {
                return lock.clone();
            }
        }
        let mut locks = self.user_locks.write().await;
        locks.entry(user_id.to_string()).or_default().clone()
    }

    async fn read_entries(&self, user_id: &str) -> AppResult<HashMap<String, HistoryEntry>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(history_key(user_id)).await?;

        match cached {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| AppError::Internal(format!("History deserialization error: {e}"))),
            None => Ok(HashMap::new()),
        }
    }

    async fn write_entries(
        &self,
        user_id: &str,
        entries: &HashMap<String, HistoryEntry>,
    ) -> AppResult<()> {
        let json = serde_json::to_string(entries)
            .map_err(|e| AppError::Internal(format!("History serialization error: {e}")))?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(history_key(user_id), json).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn list(&self, user_id: &str) -> AppResult<Vec<HistoryEntry>> {
        Ok(self.read_entries(user_id).await?.into_values().collect())
    }

    async fn record(&self, user_id: &str, entry: HistoryEntry) -> AppResult<()> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut entries = self.read_entries(user_id).await?;
        entries.insert(entry.item_id.clone(), entry);
        self.write_entries(user_id, &entries).await
    }

    async fn clear(&self, user_id: &str) -> AppResult<()> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(history_key(user_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_key_format() {
        assert_eq!(history_key("u1"), "history:u1");
    }
}
