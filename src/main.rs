use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tracing_subscriber::EnvFilter;

use palate_api::api::{create_router, AppState};
use palate_api::config::Config;
use palate_api::services::providers::{HttpInferenceProvider, InferenceProvider};
use palate_api::services::{PreferenceUpdateCoordinator, RecommendationEngine};
use palate_api::stores::{
    self, FeedbackBackedRemote, FeedbackStore, HistoryStore, InMemoryFeedbackStore,
    InMemoryHistoryStore, InMemoryPreferencesStore, PgFeedbackStore, PgPreferencesStore,
    PreferencesStore, RedisHistoryStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    // Persistent backends when reachable, in-memory fallbacks otherwise so a
    // local instance runs without infrastructure
    let (feedback, preferences): (Arc<dyn FeedbackStore>, Arc<dyn PreferencesStore>) =
        match stores::create_pool(&config.database_url).await {
            Ok(pool) => (
                Arc::new(PgFeedbackStore::new(pool.clone())),
                Arc::new(PgPreferencesStore::new(pool)),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Postgres unavailable, using in-memory stores");
                (
                    Arc::new(InMemoryFeedbackStore::new()),
                    Arc::new(InMemoryPreferencesStore::new()),
                )
            }
        };

    let local_history: Arc<dyn HistoryStore> = match stores::create_redis_client(&config.redis_url)
    {
        Ok(client) => Arc::new(RedisHistoryStore::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, using in-memory history cache");
            Arc::new(InMemoryHistoryStore::new())
        }
    };

    let inference_timeout = Duration::from_secs(config.inference_timeout_secs);
    let inference: Option<Arc<dyn InferenceProvider>> = match &config.inference_url {
        Some(url) => {
            let provider = HttpInferenceProvider::new(
                url.clone(),
                config.inference_api_key.clone(),
                inference_timeout,
            )?;
            tracing::info!(url = %url, "Inference provider configured");
            Some(Arc::new(provider))
        }
        None => {
            tracing::info!("No inference provider configured, using local aggregation fallback");
            None
        }
    };

    let coordinator = PreferenceUpdateCoordinator::new(
        feedback.clone(),
        preferences,
        inference,
        config.recent_feedback_limit,
        inference_timeout,
    );
    let (refinement_queue, refinement_handle) = coordinator.spawn();

    let engine = RecommendationEngine::new(
        feedback.clone(),
        local_history,
        Arc::new(FeedbackBackedRemote::new(feedback)),
        refinement_queue,
        ChronoDuration::hours(config.dislike_cooldown_hours),
        config.min_batch_size,
    );

    let app = create_router(AppState::new(Arc::new(engine)));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain queued refinement jobs before exiting
    refinement_handle.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
