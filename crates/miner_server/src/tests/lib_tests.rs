use super::*;
use axum::{
    body::{self, Body},
    http::Request,
};
use tower::ServiceExt;

fn test_app() -> (Router, AppState) {
    let state = AppState::new(Duration::from_millis(20));
    (build_router(state.clone()), state)
}

fn mine_request(difficulty: i64) -> Request<Body> {
    Request::post("/api/mine")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "target_difficulty": difficulty }).to_string(),
        ))
        .expect("request")
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn stats_start_idle() {
    let (app, _state) = test_app();
    let response = app
        .oneshot(Request::get("/api/stats").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let stats: StatsSnapshot = json_body(response).await;
    assert_eq!(stats, StatsSnapshot::default());
}

#[tokio::test]
async fn mine_returns_result_and_updates_stats() {
    let (app, _state) = test_app();

    let response = app
        .clone()
        .oneshot(mine_request(8))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let result: MineResponse = json_body(response).await;
    assert_eq!(result.block_header, BLOCK_HEADER);
    assert_eq!(result.hash.len(), 64);
    assert_eq!(result.iterations, result.nonce + 1);

    let response = app
        .oneshot(Request::get("/api/stats").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let stats: StatsSnapshot = json_body(response).await;
    assert_eq!(stats.current_difficulty, 8);
    assert_eq!(stats.total_hashes, result.iterations);
    assert!(!stats.is_mining);
}

#[tokio::test]
async fn mine_rejects_unsatisfiable_difficulty() {
    let (app, _state) = test_app();
    for difficulty in [-1, 257] {
        let response = app
            .clone()
            .oneshot(mine_request(difficulty))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: ApiError = json_body(response).await;
        assert!(matches!(err.code, ErrorCode::Validation));
    }
}

#[tokio::test]
async fn mine_conflicts_while_job_running() {
    let (app, state) = test_app();
    assert!(state.mining().try_begin(MAX_DIFFICULTY));

    let response = app.oneshot(mine_request(4)).await.expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let err: ApiError = json_body(response).await;
    assert!(matches!(err.code, ErrorCode::Busy));
}

#[tokio::test]
async fn stop_acknowledges_even_when_idle() {
    let (app, _state) = test_app();
    let response = app
        .oneshot(Request::post("/api/stop").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let ack: serde_json::Value = json_body(response).await;
    assert_eq!(ack, serde_json::json!({ "status": "stopped" }));
}

#[tokio::test]
async fn stop_interrupts_running_job() {
    let (app, _state) = test_app();
    let job = tokio::spawn(app.clone().oneshot(mine_request(i64::from(MAX_DIFFICULTY))));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let stop = app
        .oneshot(Request::post("/api/stop").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(stop.status(), StatusCode::OK);

    let response = tokio::time::timeout(Duration::from_secs(5), job)
        .await
        .expect("job returns after stop")
        .expect("join")
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let result: MineResponse = json_body(response).await;
    assert!(result.iterations > 0);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let (app, _state) = test_app();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/mine")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
