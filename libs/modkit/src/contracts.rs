use async_trait::async_trait;
use axum::Router;
use tokio_util::sync::CancellationToken;

/// Core module: DI/wiring and config validation.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    async fn init(&self, ctx: &crate::context::ModuleCtx) -> anyhow::Result<()>;
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Pure wiring; must be sync. Runs after every module finished `init`.
pub trait RestfulModule: Send + Sync {
    fn register_rest(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router>;
}

/// REST host module: owns the server and wraps everything the restful modules registered.
/// Both hooks run during the REST phase; neither starts the server.
pub trait RestHostModule: Send + Sync + 'static {
    /// Prepare a base Router (e.g. `/health`).
    fn rest_prepare(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router>;

    /// Attach global middleware and persist the Router for `start`.
    fn rest_finalize(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router>;
}

#[async_trait]
pub trait StatefulModule: Send + Sync {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;
    async fn stop(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}
