//! # ModKit
//!
//! Small module system the server is assembled from. Modules register by name
//! with their dependencies and capabilities, then the runner drives them through
//! the phases init → REST → start → stop.
//!
//! ```rust,ignore
//! let mut b = ModuleRegistry::builder();
//! b.register_core_with_meta("api_ingress", &[], ingress.clone())
//!     .register_rest_host_with_meta("api_ingress", ingress.clone())
//!     .register_stateful_with_meta("api_ingress", ingress);
//! run(RunOptions { modules_cfg, registry: b.build_topo_sorted()?, shutdown: ShutdownOptions::Signals }).await
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod api;
pub mod context;
pub mod contracts;
pub mod registry;
pub mod runtime;

pub use api::problem::{not_found, Problem, ProblemResponse};
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};
pub use contracts::*;
pub use registry::{ModuleRegistry, RegistryBuilder, RegistryError};
pub use runtime::{run, RunOptions, ShutdownOptions};
