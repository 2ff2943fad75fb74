use thiserror::Error;

use crate::domain::schema::SchemaIssue;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to parse log event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Log event validation failed: {} issue(s)", .0.len())]
    Invalid(Vec<SchemaIssue>),
}
