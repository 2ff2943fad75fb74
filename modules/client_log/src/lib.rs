//! Browser log ingestion.
//!
//! Accepts log events posted by the web client, validates them and re-emits
//! them through `tracing` under the `browser` target.

pub mod module;
pub use module::{ClientLog, MODULE_NAME};

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
