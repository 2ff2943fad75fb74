//! HTTP entry point of the server.
//!
//! `ApiIngress` is the single REST host: it seeds the router with `/health`,
//! lets every restful module attach its routes, wraps the result in the global
//! middleware stack, and serves it until the runner cancels.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use axum::{extract::DefaultBodyLimit, middleware::from_fn, routing::get, Router};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

pub const MODULE_NAME: &str = "api_ingress";

/// How long `stop` waits for in-flight requests to drain.
const STOP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ApiIngress {
    config: ArcSwap<ApiIngressConfig>,
    // Used when the config section has no bind_addr.
    default_bind_addr: String,
    // Finalized router from the REST phase, taken by `start`.
    final_router: Mutex<Option<Router>>,
    server: Mutex<Option<JoinHandle<Result<()>>>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl ApiIngress {
    pub fn new(default_bind_addr: impl Into<String>) -> Self {
        Self {
            config: ArcSwap::from_pointee(ApiIngressConfig::default()),
            default_bind_addr: default_bind_addr.into(),
            final_router: Mutex::new(None),
            server: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    /// Address the server listens on, `bind_addr` or the server default.
    pub fn bind_addr(&self) -> String {
        self.config
            .load()
            .bind_addr
            .clone()
            .unwrap_or_else(|| self.default_bind_addr.clone())
    }

    /// Actual socket address once `start` has bound the listener.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Wraps `router` in the global middleware stack and the 404 fallback.
    pub fn build_router(&self, router: Router) -> Router {
        let config = self.get_config();
        let x_request_id = request_id::header();

        // `Router::layer` wraps what is already there, so layers are added
        // innermost first. Effective order, outermost to innermost:
        // SetRequestId -> PropagateRequestId -> Trace -> push_req_id_to_extensions
        // -> Timeout -> CORS -> BodyLimit
        let mut router = router
            .fallback(web::not_found)
            .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
            // body_limit_bytes replaces axum's built-in 2 MiB extractor cap.
            .layer(DefaultBodyLimit::disable());

        if config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            )))
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }

    /// Binds the listener and spawns the server; it stops accepting once `cancel` fires.
    async fn serve(&self, router: Router, cancel: CancellationToken) -> Result<()> {
        let bind_addr = self.bind_addr();
        let addr: SocketAddr = bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{bind_addr}'"))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        let local = listener.local_addr()?;
        *self.local_addr.lock() = Some(local);
        tracing::info!(addr = %local, "HTTP server bound");

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
                .map_err(|e| anyhow::anyhow!(e))
        });
        *self.server.lock() = Some(handle);
        Ok(())
    }
}

#[async_trait]
impl modkit::Module for ApiIngress {
    async fn init(&self, ctx: &modkit::ModuleCtx) -> anyhow::Result<()> {
        let cfg = ctx.module_config::<ApiIngressConfig>();
        tracing::debug!(
            module = MODULE_NAME,
            cors = cfg.cors_enabled,
            body_limit = cfg.body_limit_bytes,
            "Module initialized"
        );
        self.config.store(Arc::new(cfg));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// REST host role: prepare/finalize the router, but do not start the server here.
impl modkit::contracts::RestHostModule for ApiIngress {
    fn rest_prepare(
        &self,
        _ctx: &modkit::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router> {
        tracing::debug!("REST host prepared base router with health check");
        Ok(router.route("/health", get(web::health_check)))
    }

    fn rest_finalize(
        &self,
        _ctx: &modkit::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router> {
        let router = self.build_router(router);
        *self.final_router.lock() = Some(router.clone());
        tracing::debug!("REST host finalized router");
        Ok(router)
    }
}

#[async_trait]
impl modkit::contracts::StatefulModule for ApiIngress {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        // Take the finalized router so the MutexGuard is dropped before awaits
        let stored = { self.final_router.lock().take() };
        let router = match stored {
            Some(r) => r,
            None => {
                tracing::debug!("No router from REST phase, serving health only");
                self.build_router(Router::new().route("/health", get(web::health_check)))
            }
        };
        self.serve(router, cancel).await
    }

    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        let Some(handle) = self.server.lock().take() else {
            return Ok(());
        };
        match tokio::time::timeout(STOP_TIMEOUT, handle).await {
            Ok(joined) => joined.context("HTTP server task panicked")?,
            Err(_) => anyhow::bail!("HTTP server did not stop within {STOP_TIMEOUT:?}"),
        }
    }
}
