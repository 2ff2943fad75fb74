use serde::{Deserialize, Serialize};

/// Configuration for the client_log module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientLogConfig {
    /// Log every raw event at debug before validation.
    #[serde(default)]
    pub debug_raw_events: bool,
    /// Keys replaced with `[Redacted]` at any depth, matched case-insensitively.
    #[serde(default = "default_redact_keys")]
    pub redact_keys: Vec<String>,
    #[serde(default = "default_log_path")]
    pub log_path: String,
    #[serde(default = "default_client_log_path")]
    pub client_log_path: String,
}

impl Default for ClientLogConfig {
    fn default() -> Self {
        Self {
            debug_raw_events: false,
            redact_keys: default_redact_keys(),
            log_path: default_log_path(),
            client_log_path: default_client_log_path(),
        }
    }
}

fn default_redact_keys() -> Vec<String> {
    vec!["password".to_string(), "authorization".to_string()]
}

fn default_log_path() -> String {
    "/api/log".to_string()
}

fn default_client_log_path() -> String {
    "/api/client-log".to_string()
}
