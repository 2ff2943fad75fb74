use serde::{Deserialize, Serialize};

/// `modules.api_ingress` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// Falls back to `server.host:server.port` when unset.
    #[serde(default)]
    pub bind_addr: Option<String>,
    #[serde(default)]
    pub cors_enabled: bool,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_body_limit() -> usize {
    1024 * 1024
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: None,
            cors_enabled: false,
            body_limit_bytes: default_body_limit(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}
