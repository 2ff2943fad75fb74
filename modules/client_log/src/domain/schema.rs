use serde::Serialize;
use serde_json::{Map, Value};

/// One validation failure, addressed by JSON pointer (`""` is the document root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    pub path: String,
    pub message: String,
}

/// JSON type name as it appears in issue messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn join(base: &str, key: impl std::fmt::Display) -> String {
    format!("{base}/{key}")
}

/// Collects every issue found while walking a document.
#[derive(Debug, Default)]
pub struct Issues(Vec<SchemaIssue>);

impl Issues {
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(SchemaIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn expected(&mut self, path: &str, expected: &str, got: &Value) {
        self.push(
            path,
            format!("Expected {expected}, received {}", kind_of(got)),
        );
    }

    /// Looks up `key`, recording `Required` when it is absent.
    pub fn required<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        base: &str,
        key: &str,
    ) -> Option<&'v Value> {
        let found = obj.get(key);
        if found.is_none() {
            self.push(join(base, key), "Required");
        }
        found
    }

    pub fn object<'v>(&mut self, path: &str, value: &'v Value) -> Option<&'v Map<String, Value>> {
        let obj = value.as_object();
        if obj.is_none() {
            self.expected(path, "object", value);
        }
        obj
    }

    pub fn array<'v>(&mut self, path: &str, value: &'v Value) -> Option<&'v Vec<Value>> {
        let arr = value.as_array();
        if arr.is_none() {
            self.expected(path, "array", value);
        }
        arr
    }

    pub fn string<'v>(&mut self, path: &str, value: &'v Value) -> Option<&'v str> {
        let s = value.as_str();
        if s.is_none() {
            self.expected(path, "string", value);
        }
        s
    }

    pub fn number(&mut self, path: &str, value: &Value) -> Option<f64> {
        let n = value.as_f64();
        if n.is_none() {
            self.expected(path, "number", value);
        }
        n
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<SchemaIssue> {
        self.0
    }
}
