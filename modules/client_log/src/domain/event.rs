//! Wire shapes accepted from the browser and the record forwarded to the server log.

use serde_json::{Map, Value};

use crate::domain::schema::{join, Issues, SchemaIssue};
use crate::domain::severity::Severity;

pub const NO_MESSAGE: &str = "No message";

/// pino browser `transmit` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub ts: f64,
    pub messages: Vec<String>,
    pub bindings: Vec<Map<String, Value>>,
    pub level: LogLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogLevel {
    pub label: String,
    pub value: f64,
}

impl LogEvent {
    /// Validates the whole document and reports every issue, not just the first.
    pub fn parse(raw: &Value) -> Result<Self, Vec<SchemaIssue>> {
        let mut issues = Issues::default();
        let Some(obj) = issues.object("", raw) else {
            return Err(issues.into_vec());
        };

        let ts = issues
            .required(obj, "", "ts")
            .and_then(|v| issues.number("/ts", v));

        let messages = issues
            .required(obj, "", "messages")
            .and_then(|v| issues.array("/messages", v))
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| {
                        issues
                            .string(&join("/messages", i), item)
                            .map(str::to_owned)
                    })
                    .collect::<Vec<_>>()
            });

        let bindings = issues
            .required(obj, "", "bindings")
            .and_then(|v| issues.array("/bindings", v))
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| {
                        issues.object(&join("/bindings", i), item).cloned()
                    })
                    .collect::<Vec<_>>()
            });

        let level = issues
            .required(obj, "", "level")
            .and_then(|v| issues.object("/level", v))
            .and_then(|lvl| {
                let label = issues
                    .required(lvl, "/level", "label")
                    .and_then(|v| issues.string("/level/label", v))
                    .map(str::to_owned);
                let value = issues
                    .required(lvl, "/level", "value")
                    .and_then(|v| issues.number("/level/value", v));
                Some(LogLevel {
                    label: label?,
                    value: value?,
                })
            });

        match (ts, messages, bindings, level) {
            (Some(ts), Some(messages), Some(bindings), Some(level)) if issues.is_empty() => {
                Ok(Self {
                    ts,
                    messages,
                    bindings,
                    level,
                })
            }
            _ => Err(issues.into_vec()),
        }
    }

    pub fn into_forwarded(self) -> ForwardedLog {
        let severity = Severity::resolve(Some(self.level.label.as_str()), Some(self.level.value));
        let mut messages = self.messages.into_iter();
        let message = messages.next().unwrap_or_else(|| NO_MESSAGE.to_string());

        // Later bindings win, as with nested pino child loggers.
        let mut fields = Map::new();
        for binding in self.bindings {
            fields.extend(binding);
        }

        ForwardedLog {
            source: EventSource::Pino,
            severity,
            message,
            extra_messages: messages.collect(),
            fields,
            ts: Some(self.ts),
        }
    }
}

/// Loose console-override payload: `{ level, msg?, context?, ...rest }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientLogEntry {
    pub level: String,
    pub msg: Option<String>,
    pub context: Option<Value>,
    pub rest: Map<String, Value>,
}

impl ClientLogEntry {
    pub fn parse(raw: &Value) -> Result<Self, Vec<SchemaIssue>> {
        let mut issues = Issues::default();
        let Some(obj) = issues.object("", raw) else {
            return Err(issues.into_vec());
        };

        let level = issues
            .required(obj, "", "level")
            .and_then(|v| issues.string("/level", v))
            .map(str::to_owned);

        let Some(level) = level else {
            return Err(issues.into_vec());
        };

        let msg = match obj.get("msg") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        let context = obj.get("context").filter(|v| !v.is_null()).cloned();
        let rest = obj
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "level" | "msg" | "context"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            level,
            msg,
            context,
            rest,
        })
    }

    pub fn into_forwarded(self) -> ForwardedLog {
        let mut fields = self.rest;
        // Only a numeric ts is lifted out; other shapes stay as a plain field.
        let ts = fields.get("ts").and_then(Value::as_f64);
        if ts.is_some() {
            fields.remove("ts");
        }

        // Object context is spread over the top-level fields; anything else is kept whole.
        match self.context {
            Some(Value::Object(ctx)) => fields.extend(ctx),
            Some(other) => {
                fields.insert("context".to_string(), other);
            }
            None => {}
        }

        ForwardedLog {
            source: EventSource::Console,
            severity: Severity::resolve(Some(self.level.as_str()), None),
            message: self
                .msg
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| NO_MESSAGE.to_string()),
            extra_messages: Vec::new(),
            fields,
            ts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Pino,
    Console,
}

impl EventSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pino => "pino",
            Self::Console => "console",
        }
    }
}

/// A validated browser event, ready for the server log.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardedLog {
    pub source: EventSource,
    pub severity: Severity,
    pub message: String,
    pub extra_messages: Vec<String>,
    pub fields: Map<String, Value>,
    pub ts: Option<f64>,
}
