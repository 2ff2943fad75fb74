use serde_json::Value;
use tracing::Level;

use crate::domain::event::ForwardedLog;
use crate::domain::ports::LogSink;
use crate::domain::severity::Severity;

/// Tracing target of forwarded browser events; the logging config routes it to its own file.
pub const BROWSER_TARGET: &str = "browser";

macro_rules! forward_event {
    ($level:expr, $record:expr, $fields:expr, $fatal:expr) => {
        tracing::event!(
            target: BROWSER_TARGET,
            $level,
            source = $record.source.as_str(),
            fatal = $fatal,
            ts = $record.ts,
            extra_messages = ?$record.extra_messages,
            bindings = %$fields,
            "{}",
            $record.message
        )
    };
}

/// Re-emits browser events through `tracing` under the `browser` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: &ForwardedLog) {
        let fields = Value::Object(record.fields.clone());
        // tracing has no fatal level
        match record.severity {
            Severity::Trace => forward_event!(Level::TRACE, record, fields, false),
            Severity::Debug => forward_event!(Level::DEBUG, record, fields, false),
            Severity::Info => forward_event!(Level::INFO, record, fields, false),
            Severity::Warn => forward_event!(Level::WARN, record, fields, false),
            Severity::Error => forward_event!(Level::ERROR, record, fields, false),
            Severity::Fatal => forward_event!(Level::ERROR, record, fields, true),
        }
    }
}
