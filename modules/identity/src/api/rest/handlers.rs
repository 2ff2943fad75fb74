use axum::{response::Json, Extension};
use tracing::debug;

use crate::api::rest::dto::ApiMeResponse;
use crate::domain::claims::Claims;

/// Echo the authenticated caller
pub async fn get_me(Extension(claims): Extension<Claims>) -> Json<ApiMeResponse> {
    debug!(sub = claims.subject().unwrap_or(""), "Serving /api/me");
    Json(ApiMeResponse::from(claims))
}
