//! Process-level plumbing for the Rhiz.om server: layered configuration,
//! home directory resolution and logging setup.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, AppConfig, AppConfigProvider, CliArgs, ConfigProvider, LoggingConfig,
    Section, ServerConfig,
};
