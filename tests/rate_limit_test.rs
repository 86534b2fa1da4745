use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

// Own binary: the tight PUBLIC_RPS below must not leak into the other
// integration test processes.
fn test_app() -> Router {
    std::env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    std::env::set_var("SESSION_TTL_HOURS", "24");
    std::env::set_var("DEFAULT_PREVIEW_DURATION", "300");
    std::env::set_var("PUBLIC_RPS", "3");
    let _ = course_backend::config::init_config();
    course_backend::routes::api_router(course_backend::AppState::new())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn limiter_throttles_anonymous_groups_only() {
    let app = test_app();

    for _ in 0..3 {
        let (status, _) = get(&app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].is_string());

    // token-bearing routes sit outside the limiter: still a clean 401,
    // never a 429
    let (status, _) = get(&app, "/api/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
