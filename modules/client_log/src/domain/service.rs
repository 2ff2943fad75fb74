use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::domain::error::IngestError;
use crate::domain::event::{ClientLogEntry, ForwardedLog, LogEvent};
use crate::domain::ports::LogSink;
use crate::domain::redact::Redactor;
use crate::domain::schema::SchemaIssue;

#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub debug_raw_events: bool,
    pub redact_keys: Vec<String>,
}

/// Validates browser log payloads and hands them to the sink.
#[derive(Clone)]
pub struct Service {
    sink: Arc<dyn LogSink>,
    redactor: Redactor,
    debug_raw_events: bool,
}

impl Service {
    pub fn new(sink: Arc<dyn LogSink>, config: ServiceConfig) -> Self {
        Self {
            sink,
            redactor: Redactor::new(&config.redact_keys),
            debug_raw_events: config.debug_raw_events,
        }
    }

    /// `POST /api/log`: pino transmit shape.
    #[instrument(name = "client_log.ingest_log_event", skip_all, fields(bytes = body.len()))]
    pub fn ingest_log_event(&self, body: &[u8]) -> Result<(), IngestError> {
        let raw = self.decode(body)?;
        let event = LogEvent::parse(&raw).map_err(invalid)?;
        self.forward(event.into_forwarded());
        Ok(())
    }

    /// `POST /api/client-log`: loose console-override shape.
    #[instrument(name = "client_log.ingest_client_entry", skip_all, fields(bytes = body.len()))]
    pub fn ingest_client_entry(&self, body: &[u8]) -> Result<(), IngestError> {
        let raw = self.decode(body)?;
        let entry = ClientLogEntry::parse(&raw).map_err(invalid)?;
        self.forward(entry.into_forwarded());
        Ok(())
    }

    fn decode(&self, body: &[u8]) -> Result<Value, IngestError> {
        let raw: Value = serde_json::from_slice(body).map_err(|e| {
            error!(error = %e, "Failed to parse log event");
            IngestError::Malformed(e)
        })?;
        if self.debug_raw_events {
            let mut logged = raw.clone();
            self.redactor.redact_value(&mut logged);
            debug!(raw_event = %logged, "received log event");
        }
        Ok(raw)
    }

    fn forward(&self, mut record: ForwardedLog) {
        self.redactor.redact_map(&mut record.fields);
        self.sink.emit(&record);
    }
}

fn invalid(issues: Vec<SchemaIssue>) -> IngestError {
    let summary = serde_json::to_string(&issues).unwrap_or_default();
    error!(issues = %summary, "Log event validation failed");
    IngestError::Invalid(issues)
}
