//! Integration tests for health, metrics and CORS.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestServer, song_body};
use tower::ServiceExt;

#[tokio::test]
async fn test_health_reports_ok() {
    let server = TestServer::new().await;

    let (status, body) = server.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_metrics_exposes_song_counters() {
    songbook_server::metrics::register_metrics();
    let server = TestServer::new().await;
    server.post("/recently_played/addSong", song_body(1)).await;

    let response = server
        .router
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("songbook_song_upserts_total"));
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let server = TestServer::with_config(|config| config.server.metrics_enabled = false).await;

    let response = server
        .router
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = TestServer::new().await;

    let response = server
        .router
        .clone()
        .oneshot(
            Request::get("/recently_played/getSong")
                .header("Origin", "http://player.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}
