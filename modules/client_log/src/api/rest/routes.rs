use std::sync::Arc;

use axum::{routing::post, Extension, Router};

use crate::api::rest::handlers;
use crate::config::ClientLogConfig;
use crate::domain::service::Service;

pub fn register_routes(
    router: Router,
    config: &ClientLogConfig,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    for path in [&config.log_path, &config.client_log_path] {
        if !path.starts_with('/') {
            anyhow::bail!("client_log route '{path}' must start with '/'");
        }
    }
    if config.log_path == config.client_log_path {
        anyhow::bail!(
            "client_log log_path and client_log_path must differ (both '{}')",
            config.log_path
        );
    }

    let routes = Router::new()
        .route(&config.log_path, post(handlers::post_log_event))
        .route(&config.client_log_path, post(handlers::post_client_log))
        .layer(Extension(service));

    Ok(router.merge(routes))
}
