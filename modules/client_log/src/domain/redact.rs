use serde_json::{Map, Value};

pub const REDACTED: &str = "[Redacted]";

/// Replaces the values of sensitive keys at any nesting depth.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    keys: Vec<String>,
}

impl Redactor {
    pub fn new<S: AsRef<str>>(keys: &[S]) -> Self {
        Self {
            keys: keys
                .iter()
                .map(|k| k.as_ref().trim().to_ascii_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    fn is_sensitive(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k.eq_ignore_ascii_case(key))
    }

    pub fn redact_map(&self, map: &mut Map<String, Value>) {
        if self.keys.is_empty() {
            return;
        }
        for (key, value) in map.iter_mut() {
            if self.is_sensitive(key) {
                *value = Value::String(REDACTED.to_string());
            } else {
                self.redact_value(value);
            }
        }
    }

    pub fn redact_value(&self, value: &mut Value) {
        match value {
            Value::Object(map) => self.redact_map(map),
            Value::Array(items) => items.iter_mut().for_each(|v| self.redact_value(v)),
            _ => {}
        }
    }
}
