//! HTTP-level tests of the storefront cart flow and the admin catalog,
//! driven through the full middleware stack against an in-memory database.

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use reward_server::core::server::build_router;
use reward_server::{Config, ServerState};

async fn test_app() -> Router {
    let config = Config::default();
    let state = ServerState::initialize_in_memory(&config).await;
    build_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json_body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Create a store and return its id
async fn seed_store(app: &Router) -> String {
    let (status, store) = send(
        app,
        "POST",
        "/api/stores",
        Some(json!({ "name": "Test Store", "deliveryFee": "4.99" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    store["id"].as_str().unwrap().to_string()
}

async fn seed_milestone(app: &Router, store_id: &str, body: Value) -> Value {
    let (status, milestone) = send(
        app,
        "POST",
        &format!("/api/stores/{store_id}/milestones"),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    milestone
}

#[tokio::test]
async fn on_disk_initialization_creates_the_work_dir_layout() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(dir.path().to_string_lossy(), 0);
    let state = ServerState::initialize(&config).await;
    let app = build_router(state);

    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");

    assert!(dir.path().join("database").is_dir());
    assert!(dir.path().join("logs").is_dir());
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn full_cart_flow() {
    let app = test_app().await;
    let store_id = seed_store(&app).await;

    seed_milestone(
        &app,
        &store_id,
        json!({ "name": "Free delivery", "thresholdAmount": "2500", "rewardType": "free_delivery" }),
    )
    .await;
    seed_milestone(
        &app,
        &store_id,
        json!({
            "name": "Two freebies",
            "thresholdAmount": "3000",
            "rewardType": "free_products",
            "freeProductCount": 2
        }),
    )
    .await;

    // Open a session
    let (status, session) = send(
        &app,
        "POST",
        "/api/cart-sessions",
        Some(json!({ "storeId": store_id, "cartToken": "tok-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["currentValue"], "0");
    assert_eq!(session["version"], 0);

    // Just below the second threshold
    let (status, body) = send(
        &app,
        "PUT",
        "/api/cart-sessions/tok-1/value",
        Some(json!({ "currentValue": "2999.99" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newMilestones"], true);
    assert_eq!(body["unlockedMilestones"].as_array().unwrap().len(), 1);
    assert_eq!(body["session"]["currentValue"], "2999.99");

    // Exactly at the second threshold
    let (status, body) = send(
        &app,
        "PUT",
        "/api/cart-sessions/tok-1/value",
        Some(json!({ "currentValue": "3000" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newMilestones"], true);
    assert_eq!(body["unlockedMilestones"].as_array().unwrap().len(), 2);

    // Replaying the same value unlocks nothing further
    let (_, body) = send(
        &app,
        "PUT",
        "/api/cart-sessions/tok-1/value",
        Some(json!({ "currentValue": "3000" })),
    )
    .await;
    assert_eq!(body["newMilestones"], false);

    // One history row per milestone, delivery fee from the store record
    let (status, rewards) = send(&app, "GET", "/api/cart-sessions/tok-1/rewards", None).await;
    assert_eq!(status, StatusCode::OK);
    let rewards = rewards.as_array().unwrap().clone();
    assert_eq!(rewards.len(), 2);
    let delivery = rewards
        .iter()
        .find(|r| r["rewardType"] == "free_delivery")
        .unwrap();
    assert_eq!(delivery["rewardValue"], "4.99");

    // Pick the two free products the session is entitled to
    let (status, session) = send(
        &app,
        "PUT",
        "/api/cart-sessions/tok-1/free-products",
        Some(json!({ "productIds": ["p1", "p2"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["selectedFreeProducts"], json!(["p1", "p2"]));

    // A third pick is over the allowance
    let (status, body) = send(
        &app,
        "PUT",
        "/api/cart-sessions/tok-1/free-products",
        Some(json!({ "productIds": ["p1", "p2", "p3"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn opening_a_session_twice_returns_the_same_record() {
    let app = test_app().await;
    let store_id = seed_store(&app).await;

    let open = json!({ "storeId": store_id, "cartToken": "tok-dup" });
    let (_, first) = send(&app, "POST", "/api/cart-sessions", Some(open.clone())).await;
    let (status, second) = send(&app, "POST", "/api/cart-sessions", Some(open)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);
}

#[tokio::test]
async fn unknown_session_returns_not_found() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/cart-sessions/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E0003");
}

#[tokio::test]
async fn negative_cart_value_is_rejected() {
    let app = test_app().await;
    let store_id = seed_store(&app).await;
    send(
        &app,
        "POST",
        "/api/cart-sessions",
        Some(json!({ "storeId": store_id, "cartToken": "tok-neg" })),
    )
    .await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/cart-sessions/tok-neg/value",
        Some(json!({ "currentValue": "-5" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn milestone_lifecycle_drives_the_catalog_listing() {
    let app = test_app().await;
    let store_id = seed_store(&app).await;

    let milestone = seed_milestone(
        &app,
        &store_id,
        json!({ "name": "Free delivery", "thresholdAmount": "2500", "rewardType": "free_delivery" }),
    )
    .await;
    let milestone_id = milestone["id"].as_str().unwrap().to_string();

    // Pause and observe the status filter
    let (status, paused) = send(
        &app,
        "POST",
        &format!("/api/milestones/{milestone_id}/pause"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paused["status"], "paused");

    let (_, listed) = send(
        &app,
        "GET",
        &format!("/api/stores/{store_id}/milestones?status=paused"),
        None,
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Resume, then soft delete
    let (_, resumed) = send(
        &app,
        "POST",
        &format!("/api/milestones/{milestone_id}/resume"),
        None,
    )
    .await;
    assert_eq!(resumed["status"], "active");

    let (status, deleted) = send(
        &app,
        "DELETE",
        &format!("/api/milestones/{milestone_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!(true));

    // Deleted records vanish from the default listing but stay queryable
    let (_, listed) = send(
        &app,
        "GET",
        &format!("/api/stores/{store_id}/milestones"),
        None,
    )
    .await;
    assert!(listed.as_array().unwrap().is_empty());

    let (_, listed) = send(
        &app,
        "GET",
        &format!("/api/stores/{store_id}/milestones?status=deleted"),
        None,
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Editing a deleted milestone is refused
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/milestones/{milestone_id}"),
        Some(json!({ "name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn invalid_status_filter_is_rejected() {
    let app = test_app().await;
    let store_id = seed_store(&app).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/stores/{store_id}/milestones?status=bogus"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn duplicating_a_milestone_copies_it_under_a_new_name() {
    let app = test_app().await;
    let store_id = seed_store(&app).await;

    let milestone = seed_milestone(
        &app,
        &store_id,
        json!({
            "name": "Two freebies",
            "thresholdAmount": "3000",
            "rewardType": "free_products",
            "freeProductCount": 2
        }),
    )
    .await;
    let milestone_id = milestone["id"].as_str().unwrap().to_string();

    let (status, copy) = send(
        &app,
        "POST",
        &format!("/api/milestones/{milestone_id}/duplicate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(copy["name"], "Two freebies (copy)");
    assert_eq!(copy["thresholdAmount"], "3000");
    assert_ne!(copy["id"], milestone["id"]);
}
