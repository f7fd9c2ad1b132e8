use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Feedback recording
        .route("/feedback", post(handlers::record_feedback))
        // Candidate eligibility
        .route("/recommendations/filter", post(handlers::filter_candidates))
        // Taste profile
        .route("/profile/:user_id", get(handlers::get_profile))
        // History
        .route("/history/:user_id", delete(handlers::clear_history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
