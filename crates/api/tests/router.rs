use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use memballast_api::routes::create_router;
use memballast_api::state::AppState;
use memballast_metrics::MetricsService;
use memballast_models::Config;
use memballast_pool::BallastPool;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

fn test_app_state() -> AppState {
    let mut config = Config::default();
    config.ballast.chunk_mb = 2;
    config.ballast.max_add_mb = 256;

    AppState {
        config,
        pool: Arc::new(BallastPool::new()),
        metrics: Arc::new(MetricsService::new().unwrap()),
    }
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, String) {
    let app = create_router().with_state(state.clone());
    let res = app.oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(state, request).await;
    (status, serde_json::from_str(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn status_starts_empty() {
    let state = test_app_state();

    let (status, body) = send_json(&state, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allocated_mb"], 0);
    assert_eq!(body["groups"], 0);
    assert!(body["tip"].as_str().unwrap().contains("docker stats"));
}

#[tokio::test]
async fn health_endpoint_works() {
    let state = test_app_state();

    let (status, body) = send(&state, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn add_grows_the_pool() {
    let state = test_app_state();

    let (status, body) = send_json(&state, post("/mem/add?mb=8&chunk=4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["added_mb"], 8);
    assert_eq!(body["chunk_mb"], 4);
    assert_eq!(body["total_mb"], 8);

    let (_, body) = send_json(&state, get("/")).await;
    assert_eq!(body["allocated_mb"], 8);
    assert_eq!(body["groups"], 1);
}

#[tokio::test]
async fn add_defaults_to_100_mb() {
    let state = test_app_state();

    let (status, body) = send_json(&state, post("/mem/add")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added_mb"], 100);
    assert_eq!(body["chunk_mb"], 2);
    assert_eq!(body["total_mb"], 100);
}

#[tokio::test]
async fn add_rejects_invalid_parameters() {
    let state = test_app_state();

    for uri in [
        "/mem/add?mb=0",
        "/mem/add?chunk=0",
        "/mem/add?mb=abc",
        "/mem/add?mb=-5",
        "/mem/add?mb=100000",
    ] {
        let (status, body) = send_json(&state, post(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "expected 400 for {uri}");
        assert!(body["error_message"].is_string());
        assert!(body["error_type"].is_string());
    }

    // Rejected requests leave the pool untouched.
    let (_, body) = send_json(&state, get("/")).await;
    assert_eq!(body["allocated_mb"], 0);
}

#[tokio::test]
async fn set_moves_the_pool_to_the_target() {
    let state = test_app_state();

    let (status, body) = send_json(&state, post("/mem/set?mb=12")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_mb"], 12);
    assert!(body.get("note").is_none());

    let (_, body) = send_json(&state, post("/mem/set?mb=12")).await;
    assert_eq!(body["total_mb"], 12);
    assert_eq!(body["note"], "already at target");

    let (_, body) = send_json(&state, post("/mem/set?mb=4")).await;
    assert_eq!(body["total_mb"], 4);

    let (_, body) = send_json(&state, post("/mem/set")).await;
    assert_eq!(body["total_mb"], 0);
}

#[tokio::test]
async fn set_rejects_non_integers() {
    let state = test_app_state();

    let (status, _) = send_json(&state, post("/mem/set?mb=lots")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn free_releases_newest_first_and_saturates() {
    let state = test_app_state();

    send_json(&state, post("/mem/add?mb=8")).await;
    send_json(&state, post("/mem/add?mb=4")).await;

    let (status, body) = send_json(&state, post("/mem/free?mb=4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["freed_request_mb"], 4);
    assert_eq!(body["total_mb"], 8);

    let (_, body) = send_json(&state, post("/mem/free?mb=100")).await;
    assert_eq!(body["total_mb"], 0);
}

#[tokio::test]
async fn free_requires_a_positive_amount() {
    let state = test_app_state();

    let (status, _) = send_json(&state, post("/mem/free")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&state, post("/mem/free?mb=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clear_empties_the_pool() {
    let state = test_app_state();

    send_json(&state, post("/mem/add?mb=8")).await;
    send_json(&state, post("/mem/add?mb=8")).await;

    let (status, body) = send_json(&state, post("/mem/clear")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["total_mb"], 0);

    let (_, body) = send_json(&state, get("/")).await;
    assert_eq!(body["allocated_mb"], 0);
    assert_eq!(body["groups"], 0);
}

#[tokio::test]
async fn metrics_endpoint_tracks_the_pool() {
    let state = test_app_state();

    send_json(&state, post("/mem/add?mb=8")).await;

    let (status, body) = send(&state, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ballast_allocated_mbytes 8"));
    assert!(body.contains("ballast_reservations_total 1"));
}
