use std::sync::Arc;

use anyhow::Context;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use modkit::{Module, ModuleCtx, RestfulModule};
use tracing::info;

use crate::api::rest::routes;
use crate::config::IdentityConfig;
use crate::domain::ports::TokenVerifier;
use crate::infra::{JwksCache, JwtVerifier};

pub const MODULE_NAME: &str = "identity";

/// Bearer-token protected API (`GET /api/me`).
///
/// Registered only when the `identity` config section exists; `init` fails
/// when that section lacks `domain` or `audience`.
#[derive(Default)]
pub struct Identity {
    verifier: ArcSwapOption<JwtVerifier>,
}

#[async_trait]
impl Module for Identity {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing identity module");

        let cfg: IdentityConfig = ctx.module_config_required()?;
        cfg.validate()?;

        let keys = JwksCache::from_config(&cfg).context("failed to build JWKS client")?;
        info!(
            issuer = %cfg.issuer(),
            audience = %cfg.audience,
            jwks_url = %keys.url(),
            algorithms = ?cfg.algorithms,
            "Token verification configured"
        );

        let verifier = JwtVerifier::new(Arc::new(keys), &cfg)?;
        self.verifier.store(Some(Arc::new(verifier)));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl RestfulModule for Identity {
    fn register_rest(&self, _ctx: &ModuleCtx, router: axum::Router) -> anyhow::Result<axum::Router> {
        let verifier: Arc<dyn TokenVerifier> = self
            .verifier
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Verifier not initialized"))?;

        let router = routes::register_routes(router, verifier)?;
        info!(path = routes::ME_PATH, "identity REST routes registered");
        Ok(router)
    }
}
