use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::domain::error::IngestError;

/// Exact plain-text bodies the browser loggers expect.
pub const BAD_REQUEST: &str = "Bad Request";
pub const INVALID_EVENT: &str = "Bad Request: Invalid log event data";

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let body = match self {
            IngestError::Malformed(_) => BAD_REQUEST,
            IngestError::Invalid(_) => INVALID_EVENT,
        };
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
