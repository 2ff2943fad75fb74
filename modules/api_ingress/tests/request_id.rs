use std::sync::Arc;

use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower::util::ServiceExt; // for `oneshot`

use api_ingress::request_id::XRequestId;
use api_ingress::ApiIngress;
use modkit::contracts::RestHostModule;
use modkit::{ConfigProvider, Module, ModuleCtx, ModuleCtxBuilder};

struct Section(serde_json::Value);

impl ConfigProvider for Section {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        (module_name == api_ingress::MODULE_NAME).then_some(&self.0)
    }
}

fn ctx(section: serde_json::Value) -> ModuleCtx {
    ModuleCtxBuilder::new()
        .with_config_provider(Arc::new(Section(section)))
        .for_module(api_ingress::MODULE_NAME)
        .build()
}

async fn echo_request_id(
    Extension(XRequestId(request_id)): Extension<XRequestId>,
) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "request_id": request_id }))
}

async fn sink(body: axum::body::Bytes) -> String {
    body.len().to_string()
}

/// Test app as the runner would assemble it: prepare, one module route, finalize.
async fn test_app(section: serde_json::Value) -> Router {
    let ingress = ApiIngress::new("127.0.0.1:0");
    let ctx = ctx(section);
    ingress.init(&ctx).await.unwrap();

    let router = ingress.rest_prepare(&ctx, Router::new()).unwrap();
    let router = router
        .route("/test", get(echo_request_id))
        .route("/upload", post(sink));
    ingress.rest_finalize(&ctx, router).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn generates_request_id_when_missing() {
    let app = test_app(json!({})).await;

    let response = app
        .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("x-request-id should be generated");
    assert!(!request_id.is_empty());

    // The handler sees the same id through extensions.
    let json = body_json(response).await;
    assert_eq!(json["request_id"], request_id);
}

#[tokio::test]
async fn preserves_incoming_request_id() {
    let app = test_app(json!({})).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/test")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok());
    assert_eq!(request_id, Some("abc-123"));
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = test_app(json!({})).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn unknown_route_is_a_problem_with_request_id() {
    let app = test_app(json!({})).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nope")
                .header("x-request-id", "missing-route-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "missing-route-1"
    );

    let json = body_json(response).await;
    assert_eq!(json["status"], 404);
    assert_eq!(json["instance"], "/nope");
    assert_eq!(json["request_id"], "missing-route-1");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = test_app(json!({ "body_limit_bytes": 16 })).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-length", "64")
                .body(Body::from(vec![b'x'; 64]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .body(Body::from(vec![b'x'; 8]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn configured_limit_above_two_mib_is_honoured() {
    let app = test_app(json!({ "body_limit_bytes": 8 * 1024 * 1024 })).await;
    let size = 3 * 1024 * 1024;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-length", size.to_string())
                .body(Body::from(vec![b'x'; size]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body, size.to_string().as_bytes());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .body(Body::from(vec![b'x'; 9 * 1024 * 1024]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn cors_headers_only_when_enabled() {
    let preflight = || {
        Request::builder()
            .method("OPTIONS")
            .uri("/test")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap()
    };

    let response = test_app(json!({ "cors_enabled": true }))
        .await
        .oneshot(preflight())
        .await
        .unwrap();
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));

    let response = test_app(json!({}))
        .await
        .oneshot(preflight())
        .await
        .unwrap();
    assert!(!response
        .headers()
        .contains_key("access-control-allow-origin"));
}
