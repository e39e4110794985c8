use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pxeserve::server::{build_router, ReadyFlag};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

fn ready_flag(ready: bool) -> ReadyFlag {
    Arc::new(AtomicBool::new(ready))
}

#[tokio::test]
async fn test_endpoint_returns_fixed_body() {
    let root = tempfile::tempdir().unwrap();
    let app = build_router(root.path(), ready_flag(true), true);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"Test endpoint");
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let root = tempfile::tempdir().unwrap();
    let app = build_router(root.path(), ready_flag(true), true);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let id = response
        .headers()
        .get("x-request-id")
        .expect("missing x-request-id header")
        .to_str()
        .unwrap();
    assert!(!id.is_empty());
}

#[tokio::test]
async fn inbound_request_id_is_echoed_back() {
    let root = tempfile::tempdir().unwrap();
    let app = build_router(root.path(), ready_flag(true), true);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/test")
                .header("x-request-id", "boot-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "boot-42"
    );
}

#[tokio::test]
async fn health_reflects_the_readiness_flag() {
    let root = tempfile::tempdir().unwrap();
    let ready = ready_flag(false);

    let app = build_router(root.path(), ready.clone(), true);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    ready.store(true, Ordering::SeqCst);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn health_route_can_be_left_unwired() {
    let root = tempfile::tempdir().unwrap();
    let app = build_router(root.path(), ready_flag(true), false);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // With the probe unregistered the request falls through to the static
    // tree, where no such file exists.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_files_are_served_from_the_root() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("default_media/esxi8")).unwrap();
    fs::write(root.path().join("boot.cfg"), "bootstate=0\n").unwrap();
    fs::write(
        root.path().join("default_media/esxi8/b.b00"),
        b"kernel bits",
    )
    .unwrap();

    let app = build_router(root.path(), ready_flag(true), true);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/boot.cfg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"bootstate=0\n");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/default_media/esxi8/b.b00")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Static responses pass through the tracing layer too.
    assert!(response.headers().get("x-request-id").is_some());
}

#[tokio::test]
async fn unknown_paths_fall_through_to_not_found() {
    let root = tempfile::tempdir().unwrap();
    let app = build_router(root.path(), ready_flag(true), true);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/no/such/file")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
