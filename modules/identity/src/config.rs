use std::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `modules.identity` section. `domain` and `audience` have no defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub audience: String,
    /// Defaults to `https://{domain}/`.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Defaults to `https://{domain}/.well-known/jwks.json`.
    #[serde(default)]
    pub jwks_url: Option<String>,
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<String>,
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
    #[serde(default = "default_jwks_cache_ttl_secs")]
    pub jwks_cache_ttl_secs: u64,
    #[serde(default = "default_jwks_cooldown_secs")]
    pub jwks_cooldown_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_algorithms() -> Vec<String> {
    vec!["RS256".to_string()]
}

fn default_leeway_secs() -> u64 {
    60
}

fn default_jwks_cache_ttl_secs() -> u64 {
    600
}

fn default_jwks_cooldown_secs() -> u64 {
    30
}

fn default_fetch_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("identity.{0} must be set")]
    Missing(&'static str),

    #[error("identity.{field} is not a valid http(s) URL: '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("identity.algorithms must not be empty")]
    NoAlgorithms,

    #[error("identity.algorithms: unsupported algorithm '{0}'")]
    UnsupportedAlgorithm(String),
}

impl IdentityConfig {
    /// `domain` without scheme or trailing slash, as found in `auth.example.com`.
    pub fn host(&self) -> &str {
        let d = self.domain.trim();
        let d = d
            .strip_prefix("https://")
            .or_else(|| d.strip_prefix("http://"))
            .unwrap_or(d);
        d.trim_end_matches('/')
    }

    pub fn issuer(&self) -> String {
        match &self.issuer {
            Some(iss) if !iss.trim().is_empty() => iss.trim().to_string(),
            _ => format!("https://{}/", self.host()),
        }
    }

    pub fn jwks_url(&self) -> String {
        match &self.jwks_url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => format!("https://{}/.well-known/jwks.json", self.host()),
        }
    }

    pub fn parsed_algorithms(&self) -> Result<Vec<Algorithm>, ConfigError> {
        if self.algorithms.is_empty() {
            return Err(ConfigError::NoAlgorithms);
        }
        self.algorithms
            .iter()
            .map(|a| {
                Algorithm::from_str(a.trim())
                    .map_err(|_| ConfigError::UnsupportedAlgorithm(a.clone()))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host().is_empty() {
            return Err(ConfigError::Missing("domain"));
        }
        if self.audience.trim().is_empty() {
            return Err(ConfigError::Missing("audience"));
        }
        let jwks_url = self.jwks_url();
        match url::Url::parse(&jwks_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::InvalidUrl {
                    field: "jwks_url",
                    value: jwks_url,
                })
            }
        }
        self.parsed_algorithms()?;
        Ok(())
    }
}
