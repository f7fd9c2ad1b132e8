use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::AppResult;
use crate::models::{Domain, FeedbackEvent, PreferenceDelta, ProposedUpdate};
use crate::services::aggregator;
use crate::services::providers::InferenceProvider;
use crate::stores::{FeedbackStore, PreferencesStore};

/// How many top aggregated genres the local fallback proposes
const FALLBACK_GENRE_LIMIT: usize = 5;

/// A queued request to refine one user's stored preferences
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementJob {
    pub user_id: String,
    pub domain: Domain,
    /// Correlates worker log lines with the feedback event that queued this
    pub trigger_id: uuid::Uuid,
}

impl RefinementJob {
    pub fn new(user_id: impl Into<String>, domain: Domain) -> Self {
        Self {
            user_id: user_id.into(),
            domain,
            trigger_id: uuid::Uuid::new_v4(),
        }
    }
}

/// Handle for submitting refinement jobs without awaiting them
///
/// Enqueueing never blocks and never fails the caller; a closed channel is
/// logged and dropped, since refinement is best effort by contract.
#[derive(Clone)]
pub struct RefinementQueue {
    job_tx: mpsc::UnboundedSender<RefinementJob>,
}

impl RefinementQueue {
    pub fn enqueue(&self, job: RefinementJob) {
        if let Err(e) = self.job_tx.send(job) {
            tracing::error!(error = %e, "Failed to enqueue refinement job");
        }
    }
}

/// Handle for gracefully shutting down the refinement worker
pub struct RefinementWorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl RefinementWorkerHandle {
    /// Signals the worker to drain queued jobs and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Refinement worker shutdown signal sent");
    }
}

/// Orchestrates the asynchronous preference refinement loop
///
/// Triggered per feedback event, fire-and-forget relative to the write path
/// that recorded the event. The worker is the error boundary for the whole
/// refinement pipeline: every failure inside a run is caught, logged, and
/// swallowed, so nothing surfaces to the user-facing feedback flow.
pub struct PreferenceUpdateCoordinator {
    feedback: Arc<dyn FeedbackStore>,
    preferences: Arc<dyn PreferencesStore>,
    inference: Option<Arc<dyn InferenceProvider>>,
    recent_limit: i64,
    inference_timeout: Duration,
}

impl PreferenceUpdateCoordinator {
    pub fn new(
        feedback: Arc<dyn FeedbackStore>,
        preferences: Arc<dyn PreferencesStore>,
        inference: Option<Arc<dyn InferenceProvider>>,
        recent_limit: i64,
        inference_timeout: Duration,
    ) -> Self {
        Self {
            feedback,
            preferences,
            inference,
            recent_limit,
            inference_timeout,
        }
    }

    /// Spawns the background worker and returns the queue and shutdown handles
    pub fn spawn(self) -> (RefinementQueue, RefinementWorkerHandle) {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            self.worker_task(job_rx, shutdown_rx).await;
        });

        (
            RefinementQueue { job_tx },
            RefinementWorkerHandle { shutdown_tx },
        )
    }

    /// Background task that processes refinement jobs
    ///
    /// On shutdown signal, drains all queued jobs before exiting.
    async fn worker_task(
        self,
        mut job_rx: mpsc::UnboundedReceiver<RefinementJob>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Refinement worker started");

        loop {
            tokio::select! {
                Some(job) = job_rx.recv() => {
                    self.run(&job).await;
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Refinement worker shutting down, draining queued jobs");

                    while let Ok(job) = job_rx.try_recv() {
                        self.run(&job).await;
                    }

                    tracing::info!("Refinement worker stopped");
                    break;
                }
            }
        }
    }

    /// Runs one refinement job, downgrading every failure to a log line
    async fn run(&self, job: &RefinementJob) {
        if let Err(e) = self.refine(job).await {
            tracing::warn!(
                user_id = %job.user_id,
                domain = %job.domain,
                trigger_id = %job.trigger_id,
                error = %e,
                "Preference refinement failed; skipping"
            );
        }
    }

    /// Gathers recent feedback and current preferences, proposes a delta,
    /// and applies it idempotently
    pub async fn refine(&self, job: &RefinementJob) -> AppResult<()> {
        let recent = self
            .feedback
            .list_recent(&job.user_id, Some(job.domain), None, self.recent_limit, 0)
            .await?;
        if recent.is_empty() {
            return Ok(());
        }

        let mut current = self
            .preferences
            .get(&job.user_id, job.domain)
            .await?
            .unwrap_or_default();

        let delta = match &self.inference {
            Some(provider) => {
                let proposal = tokio::time::timeout(
                    self.inference_timeout,
                    provider.propose(&current, &recent, job.domain),
                )
                .await;

                match proposal {
                    Ok(Ok(ProposedUpdate { preferences, notes })) => {
                        if let Some(notes) = notes {
                            tracing::debug!(
                                user_id = %job.user_id,
                                provider = provider.name(),
                                notes = %notes,
                                "Inference proposal notes"
                            );
                        }
                        preferences
                    }
                    Ok(Err(e)) => {
                        // Unavailable or invalid response: no delta, no retry
                        tracing::warn!(
                            user_id = %job.user_id,
                            provider = provider.name(),
                            error = %e,
                            "Inference proposal failed"
                        );
                        return Ok(());
                    }
                    Err(_) => {
                        tracing::warn!(
                            user_id = %job.user_id,
                            provider = provider.name(),
                            timeout_ms = self.inference_timeout.as_millis() as u64,
                            "Inference proposal timed out"
                        );
                        return Ok(());
                    }
                }
            }
            None => local_delta(job.domain, &recent),
        };

        if delta.is_empty() {
            return Ok(());
        }

        // Field-wise merge keeps user-entered preferences intact; applying
        // the same delta twice is a no-op
        if current.merge(&delta) {
            self.preferences
                .upsert(&job.user_id, job.domain, &current)
                .await?;
            tracing::debug!(
                user_id = %job.user_id,
                domain = %job.domain,
                trigger_id = %job.trigger_id,
                "Stored preferences refined"
            );
        }

        Ok(())
    }

}

/// Local heuristic used when no inference provider is configured: propose
/// the top aggregated genres and secondary attributes from recent likes
fn local_delta(domain: Domain, recent: &[FeedbackEvent]) -> PreferenceDelta {
    let top = |field: &str| {
        let vector = aggregator::aggregate(domain, recent, field);
        (!vector.is_empty()).then(|| vector.top_tokens(FALLBACK_GENRE_LIMIT))
    };

    let genres = top(domain.genre_field());
    match domain {
        Domain::Music => PreferenceDelta {
            genres,
            artists: top("artist"),
            directors: None,
        },
        Domain::Film => PreferenceDelta {
            genres,
            artists: None,
            directors: top("director"),
        },
    }
}
