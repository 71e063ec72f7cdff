//! Health endpoint, middleware limits and graceful shutdown.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::util::ServiceExt;

use api_ingress::{ApiIngress, ApiIngressConfig};

fn echo_routes() -> Router {
    Router::new().route("/echo", post(|body: Bytes| async move { body }))
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = ApiIngress::default().build_router(Router::new());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn body_limit_is_enforced() {
    let config = ApiIngressConfig {
        cors_enabled: false,
        body_limit_bytes: 8,
    };
    let app = ApiIngress::new(config, Duration::from_secs(5)).build_router(echo_routes());

    let small = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/echo")
                .body(Body::from("tiny"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(small.status(), StatusCode::OK);

    let large = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/echo")
                .header(header::CONTENT_LENGTH, "64")
                .body(Body::from(vec![b'x'; 64]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(large.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn cors_headers_only_when_enabled() {
    let preflight = || {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/echo")
            .header(header::ORIGIN, "http://example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let enabled = ApiIngress::new(
        ApiIngressConfig {
            cors_enabled: true,
            ..Default::default()
        },
        Duration::from_secs(5),
    )
    .build_router(echo_routes());
    let response = enabled.oneshot(preflight()).await.unwrap();
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    let disabled = ApiIngress::default().build_router(echo_routes());
    let response = disabled.oneshot(preflight()).await.unwrap();
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn serve_stops_on_cancellation() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let router = ApiIngress::default().build_router(Router::new());
    let cancel = CancellationToken::new();

    let server = tokio::spawn(ApiIngress::serve_on(listener, router, cancel.clone()));
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server stops after cancellation")
        .unwrap();
    assert!(result.is_ok());
}
