//! Remote JWKS with a TTL cache, refetch on unknown `kid`, and a refetch cooldown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::IdentityConfig;
use crate::domain::error::VerifyError;

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("failed to fetch JWKS: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("no JWKS cached and refetch is cooling down")]
    CoolingDown,

    #[error("no JWK matches kid '{0}'")]
    KeyNotFound(String),

    #[error("token has no kid and the JWKS holds {0} keys")]
    AmbiguousKey(usize),
}

impl From<JwksError> for VerifyError {
    fn from(e: JwksError) -> Self {
        match e {
            JwksError::KeyNotFound(_) | JwksError::AmbiguousKey(_) => {
                VerifyError::UnknownKey(e.to_string())
            }
            JwksError::Fetch(_) | JwksError::CoolingDown => {
                VerifyError::KeysUnavailable(e.to_string())
            }
        }
    }
}

/// Resolves the verification key for a token header.
#[async_trait]
pub trait KeySource: Send + Sync + 'static {
    async fn key_for(&self, kid: Option<&str>) -> Result<Jwk, JwksError>;
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

pub struct JwksCache {
    client: reqwest::Client,
    url: String,
    ttl: Duration,
    cooldown: Duration,
    current: ArcSwapOption<CachedKeys>,
    last_fetch: Mutex<Option<Instant>>,
    // Single flight: one fetch at a time, later callers reuse its result.
    refresh: tokio::sync::Mutex<()>,
}

impl JwksCache {
    pub fn new(client: reqwest::Client, url: impl Into<String>, ttl: Duration, cooldown: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            ttl,
            cooldown,
            current: ArcSwapOption::empty(),
            last_fetch: Mutex::new(None),
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    pub fn from_config(cfg: &IdentityConfig) -> Result<Self, JwksError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
            .build()?;
        Ok(Self::new(
            client,
            cfg.jwks_url(),
            Duration::from_secs(cfg.jwks_cache_ttl_secs),
            Duration::from_secs(cfg.jwks_cooldown_secs),
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn select(set: &JwkSet, kid: Option<&str>) -> Result<Jwk, JwksError> {
        match kid {
            Some(kid) => set
                .find(kid)
                .cloned()
                .ok_or_else(|| JwksError::KeyNotFound(kid.to_owned())),
            None => match set.keys.as_slice() {
                [only] => Ok(only.clone()),
                keys => Err(JwksError::AmbiguousKey(keys.len())),
            },
        }
    }

    fn cooling_down(&self) -> bool {
        self.last_fetch
            .lock()
            .is_some_and(|at| at.elapsed() < self.cooldown)
    }

    async fn fetch(&self) -> Result<JwkSet, JwksError> {
        let set = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;
        Ok(set)
    }

    /// Replaces `seen` with a freshly fetched set. Returns whatever is cached
    /// instead when another caller already refreshed, when the cooldown is
    /// active, or when the fetch fails and a previous set exists.
    async fn refresh(&self, seen: Option<&Arc<CachedKeys>>) -> Result<Arc<CachedKeys>, JwksError> {
        let _flight = self.refresh.lock().await;

        let current = self.current.load_full();
        if let Some(cur) = &current {
            let replaced = seen.map_or(true, |s| !Arc::ptr_eq(s, cur));
            if replaced {
                return Ok(cur.clone());
            }
        }

        if self.cooling_down() {
            debug!(url = %self.url, "JWKS refetch suppressed by cooldown");
            return current.ok_or(JwksError::CoolingDown);
        }

        *self.last_fetch.lock() = Some(Instant::now());
        match self.fetch().await {
            Ok(set) => {
                debug!(url = %self.url, keys = set.keys.len(), "JWKS fetched");
                let fresh = Arc::new(CachedKeys {
                    set,
                    fetched_at: Instant::now(),
                });
                self.current.store(Some(fresh.clone()));
                Ok(fresh)
            }
            Err(e) => match current {
                Some(stale) => {
                    warn!(url = %self.url, error = %e, "JWKS refresh failed, serving cached keys");
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }
}

#[async_trait]
impl KeySource for JwksCache {
    async fn key_for(&self, kid: Option<&str>) -> Result<Jwk, JwksError> {
        let cached = self.current.load_full();
        if let Some(keys) = &cached {
            if keys.fetched_at.elapsed() < self.ttl {
                if let Ok(key) = Self::select(&keys.set, kid) {
                    return Ok(key);
                }
            }
        }

        let keys = self.refresh(cached.as_ref()).await?;
        Self::select(&keys.set, kid)
    }
}
