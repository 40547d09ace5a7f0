//! FMCG Analytics HTTP Server
//!
//! Serves grouped aggregations over a packaged-goods sales fact table.
//!
//! # CLI Commands
//!
//! - `start` - Start the HTTP server (default if no command specified)
//! - `check-config` - Validate configuration without starting the server
//! - `stats` - Show fact table statistics without starting the server
//!
//! # Configuration
//!
//! The server reads configuration from:
//! 1. `--config` flag
//! 2. `FMCG_CONFIG` environment variable (path to TOML file)
//! 3. `./fmcg.toml` in current directory
//! 4. Default configuration

mod config;

use clap::{Parser, Subcommand};
use fmcg_analytics::{
    config::Config,
    metrics::FACT_ROWS,
    query::AggregationEngine,
    server::{build_router, AppState},
    store::{FactStore, InMemoryFactStore},
};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::signal;
use tracing::{debug, info, warn};

// =============================================================================
// CLI Definition
// =============================================================================

/// FMCG Analytics - grouped aggregation query service
#[derive(Parser)]
#[command(name = "fmcg-server")]
#[command(version)]
#[command(about = "Grouped aggregation query service for FMCG sales data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (overrides FMCG_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override listen address (e.g., 0.0.0.0:8080)
    #[arg(short, long, global = true)]
    listen: Option<String>,

    /// Override fact snapshot path
    #[arg(short, long, global = true)]
    data_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Start,

    /// Validate configuration file without starting the server
    CheckConfig,

    /// Show fact table statistics without starting the server
    Stats {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

impl Cli {
    /// Resolve configuration and apply CLI overrides
    fn resolve_config(&self) -> Config {
        let mut config = config::load_config(self.config.as_deref());
        if let Some(listen) = &self.listen {
            config.server.listen_addr = listen.clone();
        }
        if let Some(data_file) = &self.data_file {
            config.store.data_file = Some(data_file.clone());
        }
        config
    }
}

// =============================================================================
// Startup
// =============================================================================

/// Initialize tracing from RUST_LOG or the configured level
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.server.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load the fact store named by the configuration
///
/// With no data file configured the service starts empty.
fn load_store(config: &Config) -> Result<InMemoryFactStore, Box<dyn std::error::Error>> {
    let store = match &config.store.data_file {
        Some(path) => InMemoryFactStore::load_json(path)?,
        None => {
            warn!("No data file configured, starting with an empty fact store");
            InMemoryFactStore::new()
        },
    };
    FACT_ROWS.set(store.row_count() as f64);
    Ok(store)
}

/// Resolve once Ctrl-C or SIGTERM arrives
///
/// A handler that fails to install is logged and never resolves, leaving
/// the other one in charge.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };

    info!(signal = received, "Draining in-flight requests before exit");
}

// =============================================================================
// CLI Command Handlers
// =============================================================================

/// Validate configuration and print summary
fn cmd_check_config(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.resolve_config();
    config.validate()?;

    println!("Configuration is valid!");
    println!();
    println!("Server Settings:");
    println!("  Listen address: {}", config.server.listen_addr);
    println!("  Log level: {}", config.server.log_level);
    println!("  Log format: {}", config.server.log_format);
    if config.server.cors_allowed_origins.is_empty() {
        println!("  CORS origins: any");
    } else {
        println!(
            "  CORS origins: {}",
            config.server.cors_allowed_origins.join(", ")
        );
    }
    println!();
    println!("Store Settings:");
    match &config.store.data_file {
        Some(path) => println!("  Data file: {}", path.display()),
        None => println!("  Data file: (none, empty store)"),
    }
    println!();
    println!("Query Settings:");
    println!("  Raw row limit: {}", config.query.raw_row_limit);
    println!("  Filter policy: {:?}", config.query.filter_policy);

    Ok(())
}

/// Show fact table statistics without starting the server
fn cmd_stats(cli: &Cli, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.resolve_config();
    let store = load_store(&config)?;
    let distinct = store.distinct_counts();

    if format == "json" {
        let dimensions: serde_json::Map<String, serde_json::Value> = distinct
            .iter()
            .map(|(dim, count)| (dim.as_str().to_string(), serde_json::json!(count)))
            .collect();
        let stats = serde_json::json!({
            "data_file": config.store.data_file,
            "row_count": store.row_count(),
            "distinct_values": dimensions,
        });
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("FMCG Fact Table Statistics");
        println!("==========================");
        println!();
        println!("Data file: {:?}", config.store.data_file);
        println!("Row count: {}", store.row_count());
        println!();
        println!("Distinct values:");
        for (dim, count) in &distinct {
            println!("  {}: {}", dim, count);
        }
    }

    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::CheckConfig) => return cmd_check_config(&cli),
        Some(Commands::Stats { format }) => return cmd_stats(&cli, format),
        Some(Commands::Start) | None => {},
    }

    let config = cli.resolve_config();
    config.validate()?;
    init_tracing(&config);

    info!("Starting FMCG Analytics Server v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        listen_addr = %config.server.listen_addr,
        data_file = ?config.store.data_file,
        filter_policy = ?config.query.filter_policy,
        "Configuration"
    );

    let store = load_store(&config)?;
    info!(rows = store.row_count(), "Fact store loaded");

    let engine =
        AggregationEngine::new(Arc::new(store)).with_raw_row_limit(config.query.raw_row_limit);
    let addr: SocketAddr = config.server.listen_addr.parse()?;
    let state = Arc::new(AppState::new(engine, config));
    let app = build_router(state);

    info!("Server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
