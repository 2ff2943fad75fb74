use std::sync::Arc;

use axum::{body::Bytes, http::StatusCode, Extension};

use crate::domain::error::IngestError;
use crate::domain::service::Service;

/// Content-Type is not checked: `sendBeacon` posts a blob.
pub async fn post_log_event(
    Extension(svc): Extension<Arc<Service>>,
    body: Bytes,
) -> Result<StatusCode, IngestError> {
    svc.ingest_log_event(&body)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn post_client_log(
    Extension(svc): Extension<Arc<Service>>,
    body: Bytes,
) -> Result<StatusCode, IngestError> {
    svc.ingest_client_entry(&body)?;
    Ok(StatusCode::NO_CONTENT)
}
