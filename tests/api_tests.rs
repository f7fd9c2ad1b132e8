use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use chrono::Duration as ChronoDuration;
use serde_json::json;

use palate_api::api::{create_router, AppState};
use palate_api::services::refinement::RefinementWorkerHandle;
use palate_api::services::{PreferenceUpdateCoordinator, RecommendationEngine};
use palate_api::stores::{
    FeedbackBackedRemote, InMemoryFeedbackStore, InMemoryHistoryStore, InMemoryPreferencesStore,
};

struct TestApp {
    server: TestServer,
    // Dropping the handle stops the refinement worker
    _refinement: RefinementWorkerHandle,
}

fn create_test_app() -> TestApp {
    let feedback: Arc<InMemoryFeedbackStore> = Arc::new(InMemoryFeedbackStore::new());
    let preferences = Arc::new(InMemoryPreferencesStore::new());

    let coordinator = PreferenceUpdateCoordinator::new(
        feedback.clone(),
        preferences,
        None,
        10,
        Duration::from_secs(5),
    );
    let (queue, handle) = coordinator.spawn();

    let engine = RecommendationEngine::new(
        feedback.clone(),
        Arc::new(InMemoryHistoryStore::new()),
        Arc::new(FeedbackBackedRemote::new(feedback)),
        queue,
        ChronoDuration::hours(24),
        3,
    );

    let app = create_router(AppState::new(Arc::new(engine)));
    TestApp {
        server: TestServer::new(app).unwrap(),
        _refinement: handle,
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let response = app.server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_record_feedback() {
    let app = create_test_app();

    let response = app.server
        .post("/feedback")
        .json(&json!({
            "user_id": "u1",
            "item_id": "tt1375666",
            "domain": "film",
            "polarity": "like",
            "signals": { "genre": "Action, Sci-Fi", "cast": ["Leonardo DiCaprio"] }
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
}

#[tokio::test]
async fn test_feedback_rejects_blank_user() {
    let app = create_test_app();

    let response = app.server
        .post("/feedback")
        .json(&json!({
            "user_id": "",
            "item_id": "tt1375666",
            "domain": "film",
            "polarity": "like"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_liked_item_never_resurfaces() {
    let app = create_test_app();

    app.server
        .post("/feedback")
        .json(&json!({
            "user_id": "u1",
            "item_id": "a",
            "domain": "film",
            "polarity": "like"
        }))
        .await;

    let response = app.server
        .post("/recommendations/filter")
        .json(&json!({
            "user_id": "u1",
            "candidates": [
                { "item_id": "a", "title": "Seen It", "domain": "film" },
                { "item_id": "b", "title": "New One", "domain": "film" }
            ],
            "cooldown_hours": 0
        }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let eligible = body["eligible"].as_array().unwrap();
    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0]["item_id"], "b");
    // Below the minimum batch size of 3
    assert_eq!(body["needs_more"], true);
}

#[tokio::test]
async fn test_disliked_item_held_back_within_cooldown() {
    let app = create_test_app();

    app.server
        .post("/feedback")
        .json(&json!({
            "user_id": "u1",
            "item_id": "a",
            "domain": "music",
            "polarity": "dislike"
        }))
        .await;

    // Default 24h cooldown holds the fresh dislike back
    let response = app.server
        .post("/recommendations/filter")
        .json(&json!({
            "user_id": "u1",
            "candidates": [{ "item_id": "a", "title": "Track", "domain": "music" }]
        }))
        .await;
    let body: serde_json::Value = response.json();
    assert!(body["eligible"].as_array().unwrap().is_empty());

    // A zero cooldown lets it back in
    let response = app.server
        .post("/recommendations/filter")
        .json(&json!({
            "user_id": "u1",
            "candidates": [{ "item_id": "a", "title": "Track", "domain": "music" }],
            "cooldown_hours": 0
        }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["eligible"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_clear_history_restores_eligibility() {
    let app = create_test_app();

    app.server
        .post("/feedback")
        .json(&json!({
            "user_id": "u1",
            "item_id": "a",
            "domain": "film",
            "polarity": "like"
        }))
        .await;

    let response = app.server.delete("/history/u1").await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);

    let response = app.server
        .post("/recommendations/filter")
        .json(&json!({
            "user_id": "u1",
            "candidates": [{ "item_id": "a", "title": "Seen It", "domain": "film" }]
        }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["eligible"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_profile_flow() {
    let app = create_test_app();

    for (item, genre) in [("a", "Action,Drama"), ("b", "Action"), ("c", "Comedy")] {
        app.server
            .post("/feedback")
            .json(&json!({
                "user_id": "u1",
                "item_id": item,
                "domain": "film",
                "polarity": "like",
                "signals": { "genre": genre }
            }))
            .await;
    }

    let response = app.server.get("/profile/u1").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["music"].is_null());
    let film = &body["film"];
    assert_eq!(film["genres"][0], "Action");
    assert_eq!(film["genres"].as_array().unwrap().len(), 3);
    assert!(film["intensity"].as_u64().unwrap() >= 1);
    assert!(!body["name"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_profile_still_forming_for_new_user() {
    let app = create_test_app();

    let response = app.server.get("/profile/nobody").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["music"].is_null() && body["film"].is_null());
    assert!(body["description"]
        .as_str()
        .unwrap()
        .contains("still taking shape"));
}
