use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use modkit::{Module, ModuleCtx, RestfulModule};
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::ClientLogConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::TracingSink;

pub const MODULE_NAME: &str = "client_log";

/// Browser log ingestion: `POST /api/log` and `POST /api/client-log`.
#[derive(Default)]
pub struct ClientLog {
    service: ArcSwapOption<Service>,
    config: ArcSwapOption<ClientLogConfig>,
}

#[async_trait]
impl Module for ClientLog {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing client_log module");

        let cfg: ClientLogConfig = ctx.module_config();
        debug!(
            log_path = %cfg.log_path,
            client_log_path = %cfg.client_log_path,
            redact_keys = ?cfg.redact_keys,
            debug_raw_events = cfg.debug_raw_events,
            "Loaded client_log config"
        );

        let service = Service::new(
            Arc::new(TracingSink),
            ServiceConfig {
                debug_raw_events: cfg.debug_raw_events,
                redact_keys: cfg.redact_keys.clone(),
            },
        );
        self.service.store(Some(Arc::new(service)));
        self.config.store(Some(Arc::new(cfg)));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl RestfulModule for ClientLog {
    fn register_rest(&self, _ctx: &ModuleCtx, router: axum::Router) -> anyhow::Result<axum::Router> {
        let service = self
            .service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))?;
        let config = self
            .config
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Config not initialized"))?;

        let router = routes::register_routes(router, &config, service)?;
        info!(
            log_path = %config.log_path,
            client_log_path = %config.client_log_path,
            "client_log REST routes registered"
        );
        Ok(router)
    }
}
