use axum::{
    extract::Extension,
    http::{StatusCode, Uri},
    response::Json,
};
use modkit::{Problem, ProblemResponse};
use serde_json::{json, Value};

use crate::request_id::XRequestId;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Fallback for every unmatched route.
pub async fn not_found(uri: Uri, request_id: Option<Extension<XRequestId>>) -> ProblemResponse {
    let path = uri.path().to_owned();
    let mut problem = Problem::from_status(StatusCode::NOT_FOUND, format!("no route for {path}"))
        .with_code("route_not_found")
        .with_instance(path);
    if let Some(Extension(XRequestId(rid))) = request_id {
        problem = problem.with_request_id(rid);
    }
    ProblemResponse(problem)
}
