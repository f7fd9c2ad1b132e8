use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Row};

use crate::error::{AppError, AppResult};
use crate::models::{Domain, FeedbackEvent, Polarity, SignalValue, StoredPreferences};

use super::{FeedbackStore, PreferencesStore};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Postgres-backed feedback store
///
/// Upserts on the `(user_id, item_id)` primary key so a new event for the
/// same pair supersedes the prior one.
pub struct PgFeedbackStore {
    pool: PgPool,
}

impl PgFeedbackStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FeedbackStore for PgFeedbackStore {
    async fn record(&self, event: FeedbackEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO feedback_events (user_id, item_id, domain, polarity, recorded_at, signals)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, item_id) DO UPDATE
            SET domain = EXCLUDED.domain,
                polarity = EXCLUDED.polarity,
                recorded_at = EXCLUDED.recorded_at,
                signals = EXCLUDED.signals
            "#,
        )
        .bind(&event.user_id)
        .bind(&event.item_id)
        .bind(event.domain.to_string())
        .bind(event.polarity.to_string())
        .bind(event.timestamp)
        .bind(Json(&event.signals))
        .execute(&self.pool)
        .await?;

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
        let rows = sqlx::query(
            r#"
            SELECT user_id, item_id, domain, polarity, recorded_at, signals
            FROM feedback_events
            WHERE user_id = $1
              AND ($2::text IS NULL OR domain = $2)
              AND ($3::text IS NULL OR polarity = $3)
            ORDER BY recorded_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(domain.map(|d| d.to_string()))
        .bind(polarity.map(|p| p.to_string()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_event).collect()
    }

    async fn clear(&self, user_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM feedback_events WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_event(row: sqlx::postgres::PgRow) -> AppResult<FeedbackEvent> {
    let domain: String = row.try_get("domain")?;
    let polarity: String = row.try_get("polarity")?;
    let signals: Json<HashMap<String, SignalValue>> = row.try_get("signals")?;
    let timestamp: DateTime<Utc> = row.try_get("recorded_at")?;

    Ok(FeedbackEvent {
        user_id: row.try_get("user_id")?,
        item_id: row.try_get("item_id")?,
        domain: domain
            .parse()
            .map_err(|e: String| AppError::Internal(format!("bad domain column: {e}")))?,
        polarity: polarity
            .parse()
            .map_err(|e: String| AppError::Internal(format!("bad polarity column: {e}")))?,
        timestamp,
        signals: signals.0,
    })
}

/// Postgres-backed preference store keyed by `(user_id, domain)`
pub struct PgPreferencesStore {
    pool: PgPool,
}

impl PgPreferencesStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PreferencesStore for PgPreferencesStore {
    async fn get(&self, user_id: &str, domain: Domain) -> AppResult<Option<StoredPreferences>> {
        let row = sqlx::query(
            r#"
            SELECT genres, artists, directors, updated_at
            FROM stored_preferences
            WHERE user_id = $1 AND domain = $2
            "#,
        )
        .bind(user_id)
        .bind(domain.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(StoredPreferences {
                genres: row.try_get("genres")?,
                artists: row.try_get("artists")?,
                directors: row.try_get("directors")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    async fn upsert(
        &self,
        user_id: &str,
        domain: Domain,
        preferences: &StoredPreferences,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stored_preferences (user_id, domain, genres, artists, directors, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, domain) DO UPDATE
            SET genres = EXCLUDED.genres,
                artists = EXCLUDED.artists,
                directors = EXCLUDED.directors,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(domain.to_string())
        .bind(&preferences.genres)
        .bind(&preferences.artists)
        .bind(&preferences.directors)
        .bind(preferences.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
