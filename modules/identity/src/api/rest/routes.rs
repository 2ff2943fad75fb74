use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};

use crate::api::rest::{auth, handlers};
use crate::domain::ports::TokenVerifier;

pub const ME_PATH: &str = "/api/me";

pub fn register_routes(router: Router, verifier: Arc<dyn TokenVerifier>) -> anyhow::Result<Router> {
    // route_layer: the bearer check only runs for matched routes
    let protected = Router::new()
        .route(ME_PATH, get(handlers::get_me))
        .route_layer(from_fn_with_state(verifier, auth::require_bearer));

    Ok(router.merge(protected))
}
