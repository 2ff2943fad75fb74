use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, AppConfigProvider, CliArgs, ConfigProvider};

use modkit::runtime::{run, RunOptions, ShutdownOptions};
use modkit::ModuleRegistry;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// Adapter to make AppConfigProvider implement modkit::ConfigProvider
struct ModkitConfigAdapter(Arc<AppConfigProvider>);

impl modkit::ConfigProvider for ModkitConfigAdapter {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.get_module_config(module_name)
    }
}

/// Rhiz.om Server - browser log ingestion and token-protected API
#[derive(Parser)]
#[command(name = "rhizom-server")]
#[command(about = "Rhiz.om Server - browser log ingestion and token-protected API")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rhiz.om server started");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

/// Registers the modules in dependency order. `identity` is optional: without
/// its config section `/api/me` is not mounted.
fn build_registry(config: &AppConfig) -> Result<ModuleRegistry> {
    let ingress = Arc::new(api_ingress::ApiIngress::new(config.server.bind_addr()));
    let client_log = Arc::new(client_log::ClientLog::default());

    let mut b = ModuleRegistry::builder();
    b.register_core_with_meta(api_ingress::MODULE_NAME, &[], ingress.clone())
        .register_rest_host_with_meta(api_ingress::MODULE_NAME, ingress.clone())
        .register_stateful_with_meta(api_ingress::MODULE_NAME, ingress);

    b.register_core_with_meta(client_log::MODULE_NAME, &["api_ingress"], client_log.clone())
        .register_rest_with_meta(client_log::MODULE_NAME, client_log);

    if config.modules.contains_key(identity::MODULE_NAME) {
        let identity = Arc::new(identity::Identity::default());
        b.register_core_with_meta(identity::MODULE_NAME, &["api_ingress"], identity.clone())
            .register_rest_with_meta(identity::MODULE_NAME, identity);
    } else {
        tracing::warn!("No identity configuration found, /api/me is disabled");
    }

    Ok(b.build_topo_sorted()?)
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let registry = build_registry(&config)?;
    tracing::info!(modules = ?registry.names(), "Module registry built");

    let config_provider = Arc::new(ModkitConfigAdapter(Arc::new(AppConfigProvider::new(
        config,
    ))));

    run(RunOptions {
        modules_cfg: config_provider,
        registry,
        shutdown: ShutdownOptions::Signals,
    })
    .await
}

/// Parses every known module section the way `init` would, without starting anything.
fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let section = |name: &str| config.modules.get(name).cloned();

    let ingress: api_ingress::ApiIngressConfig = match section(api_ingress::MODULE_NAME) {
        Some(v) => serde_json::from_value(v).context("invalid api_ingress config")?,
        None => Default::default(),
    };
    let bind_addr = ingress
        .bind_addr
        .clone()
        .unwrap_or_else(|| config.server.bind_addr());
    bind_addr
        .parse::<SocketAddr>()
        .with_context(|| format!("Invalid bind address '{bind_addr}'"))?;

    if let Some(v) = section(client_log::MODULE_NAME) {
        serde_json::from_value::<client_log::config::ClientLogConfig>(v)
            .context("invalid client_log config")?;
    }

    match section(identity::MODULE_NAME) {
        Some(v) => {
            let cfg: identity::IdentityConfig =
                serde_json::from_value(v).context("invalid identity config")?;
            cfg.validate()?;
            println!("Identity: issuer {} (JWKS {})", cfg.issuer(), cfg.jwks_url());
        }
        None => println!("Identity: not configured, /api/me disabled"),
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Listening address: {bind_addr}");
    println!("{}", config.to_yaml()?);

    Ok(())
}
