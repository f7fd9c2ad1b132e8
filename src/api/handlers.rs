use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{Candidate, Domain, Polarity, ProfileSummary, SignalValue};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub user_id: String,
    pub item_id: String,
    pub domain: Domain,
    pub polarity: Polarity,
    #[serde(default)]
    pub signals: HashMap<String, SignalValue>,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub user_id: String,
    pub candidates: Vec<Candidate>,
    /// Overrides the configured dislike cooldown when present
    pub cooldown_hours: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub eligible: Vec<Candidate>,
    /// True when the batch came back too short and the caller should fetch
    /// a fresh candidate batch
    pub needs_more: bool,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Records a feedback event and triggers background preference refinement
pub async fn record_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<StatusCode> {
    state
        .engine
        .on_feedback(
            &request.user_id,
            &request.item_id,
            request.domain,
            request.polarity,
            request.signals,
        )
        .await?;
    Ok(StatusCode::CREATED)
}

/// Filters a candidate batch down to the items eligible to show now
pub async fn filter_candidates(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> AppResult<Json<FilterResponse>> {
    let cooldown = request.cooldown_hours.map(Duration::hours);
    let eligible = state
        .engine
        .filter_eligible(&request.user_id, request.candidates, cooldown)
        .await?;
    let needs_more = state.engine.needs_more(&eligible);

    Ok(Json(FilterResponse {
        eligible,
        needs_more,
    }))
}

/// Returns the user's cross-domain taste profile
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ProfileSummary>> {
    let summary = state.engine.get_taste_profile(&user_id).await?;
    Ok(Json(summary))
}

/// Empties both history provenances for the user
pub async fn clear_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<StatusCode> {
    state.engine.clear_history(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
