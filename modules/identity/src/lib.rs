//! JWKS-backed bearer authentication and the protected `GET /api/me`.

pub mod module;
pub use module::{Identity, MODULE_NAME};

pub mod config;
pub use config::{ConfigError, IdentityConfig};

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
