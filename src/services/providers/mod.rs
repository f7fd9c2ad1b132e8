/// Inference capability abstraction
///
/// The preference refinement loop treats "ask an external inference service
/// for a proposed preference delta" as a pluggable capability with a narrow
/// contract. The engine never depends on a concrete service; when none is
/// configured it falls back to the local aggregation heuristic.
use crate::{
    error::AppResult,
    models::{Domain, FeedbackEvent, ProposedUpdate, StoredPreferences},
};

pub mod http;

pub use http::HttpInferenceProvider;

/// Trait for preference inference providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Proposes a preference delta from the current record and recent feedback
    ///
    /// An unavailable or misbehaving provider surfaces as an error here; the
    /// refinement coordinator downgrades it to "no delta" and moves on.
    async fn propose(
        &self,
        current: &StoredPreferences,
        recent: &[FeedbackEvent],
        domain: Domain,
    ) -> AppResult<ProposedUpdate>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
