use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::error::{AppError, AppResult};
use crate::models::{
    Candidate, Domain, FeedbackEvent, HistoryEntry, Polarity, ProfileSummary, SignalValue,
};
use crate::services::refinement::{RefinementJob, RefinementQueue};
use crate::services::{aggregator, history, profiler};
use crate::stores::{FeedbackStore, HistoryStore, RemoteHistory};

/// Feedback events considered when composing a taste profile
const PROFILE_WINDOW: i64 = 50;

/// Facade over the preference and uniqueness engine
///
/// Pure logic lives in the service modules; this type wires the store
/// collaborators to it and carries the configured defaults. Everything here
/// is safe to call concurrently from multiple requests.
pub struct RecommendationEngine {
    feedback: Arc<dyn FeedbackStore>,
    local_history: Arc<dyn HistoryStore>,
    remote_history: Arc<dyn RemoteHistory>,
    refinement: RefinementQueue,
    dislike_cooldown: Duration,
    min_batch_size: usize,
}

impl RecommendationEngine {
    pub fn new(
        feedback: Arc<dyn FeedbackStore>,
        local_history: Arc<dyn HistoryStore>,
        remote_history: Arc<dyn RemoteHistory>,
        refinement: RefinementQueue,
        dislike_cooldown: Duration,
        min_batch_size: usize,
    ) -> Self {
        Self {
            feedback,
            local_history,
            remote_history,
            refinement,
            dislike_cooldown,
            min_batch_size,
        }
    }

    /// Returns the candidates eligible to be shown now, preserving order
    ///
    /// Merges both history provenances first; a failing provenance degrades
    /// to whatever the other one holds rather than failing the request.
    pub async fn filter_eligible(
        &self,
        user_id: &str,
        candidates: Vec<Candidate>,
        cooldown: Option<Duration>,
    ) -> AppResult<Vec<Candidate>> {
        require_id(user_id, "user_id")?;

        let local = match self.local_history.list(user_id).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Local history unavailable");
                Vec::new()
            }
        };
        let remote = match self.remote_history.list_history(user_id).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Remote history unavailable, filtering on local only");
                Vec::new()
            }
        };

        let merged = history::merge(&local, &remote);
        Ok(history::filter_eligible(
            &merged,
            candidates,
            cooldown.unwrap_or(self.dislike_cooldown),
            Utc::now(),
        ))
    }

    /// Advisory check against the configured minimum batch size
    pub fn needs_more(&self, filtered: &[Candidate]) -> bool {
        history::needs_more(filtered, self.min_batch_size)
    }

    /// Records a feedback event, then kicks off preference refinement
    ///
    /// Recording is synchronous and only fails on invalid input or a genuine
    /// feedback-store failure. Refinement is enqueued after the write and is
    /// never awaited, so its latency and failures stay off this path.
    pub async fn on_feedback(
        &self,
        user_id: &str,
        item_id: &str,
        domain: Domain,
        polarity: Polarity,
        signals: HashMap<String, SignalValue>,
    ) -> AppResult<()> {
        require_id(user_id, "user_id")?;
        require_id(item_id, "item_id")?;

        let event = FeedbackEvent {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            domain,
            polarity,
            timestamp: Utc::now(),
            signals,
        };

        self.feedback.record(event.clone()).await?;

        // Local provenance is a cache; a failed write only costs freshness
        let entry = HistoryEntry {
            item_id: event.item_id,
            polarity: event.polarity,
            timestamp: event.timestamp,
        };
        if let Err(e) = self.local_history.record(user_id, entry).await {
            tracing::warn!(user_id = %user_id, error = %e, "Local history write failed");
        }

        self.refinement.enqueue(RefinementJob::new(user_id, domain));

        Ok(())
    }

    /// Composes the cross-domain taste profile from recent liked feedback
    pub async fn get_taste_profile(&self, user_id: &str) -> AppResult<ProfileSummary> {
        require_id(user_id, "user_id")?;

        let music = self.domain_profile(user_id, Domain::Music).await?;
        let film = self.domain_profile(user_id, Domain::Film).await?;
        Ok(profiler::summarize(music, film))
    }

    async fn domain_profile(
        &self,
        user_id: &str,
        domain: Domain,
    ) -> AppResult<Option<crate::models::TasteProfile>> {
        let events = self
            .feedback
            .list_recent(user_id, Some(domain), Some(Polarity::Like), PROFILE_WINDOW, 0)
            .await?;

        let genres = aggregator::aggregate(domain, &events, domain.genre_field());
        let secondary = aggregator::aggregate(domain, &events, domain.secondary_field());
        Ok(profiler::profile_domain(domain, &genres, &secondary))
    }

    /// Empties both history provenances for one user
    pub async fn clear_history(&self, user_id: &str) -> AppResult<()> {
        require_id(user_id, "user_id")?;

        self.local_history.clear(user_id).await?;
        self.remote_history.clear_history(user_id).await?;
        Ok(())
    }
}

fn require_id(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}
