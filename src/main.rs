//! County health lookup service and CSV importer entry point.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use county_health::api::{create_router_with_limit, AppState};
use county_health::config::Config;
use county_health::error::AppError;
use county_health::import::import_csv;
use county_health::metrics;
use county_health::utils::shutdown_signal;

/// County health-ranking lookup by ZIP code.
#[derive(Parser, Debug)]
#[command(name = "county-health")]
#[command(about = "Serve county health rankings by ZIP code, or import CSV data into the store")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP lookup service (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite store to read (overrides DB_PATH).
        #[arg(long)]
        db_path: Option<PathBuf>,
    },

    /// Import a CSV file into a table named after the file.
    Import {
        /// SQLite store to write; created if missing.
        store_path: PathBuf,

        /// CSV file whose header row names the columns.
        csv_path: PathBuf,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Configuration feeds the log setup, so a load failure is reported after it
    let loaded = Config::load();
    let log_json = loaded.as_ref().map(|c| c.log_json).unwrap_or(false);
    let verbose = args.verbose || loaded.as_ref().map(|c| c.verbose).unwrap_or(false);

    // Initialize logging (stderr keeps stdout free for command output)
    let filter = if verbose {
        EnvFilter::new("county_health=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| {
                EnvFilter::try_new(
                    loaded
                        .as_ref()
                        .map(|c| c.rust_log.as_str())
                        .unwrap_or("info"),
                )
            })
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    // Handle subcommands; the importer needs no service configuration
    match args.command {
        Some(Command::Import {
            store_path,
            csv_path,
        }) => cmd_import(store_path, csv_path).await?,
        Some(Command::CheckConfig) => cmd_check_config(&loaded.map_err(AppError::from)?)?,
        Some(Command::Serve { port, db_path }) => {
            cmd_serve(loaded.map_err(AppError::from)?, port, db_path).await?
        }
        None => cmd_serve(loaded.map_err(AppError::from)?, None, None).await?,
    }

    Ok(())
}

/// Import one CSV file into the store.
async fn cmd_import(store_path: PathBuf, csv_path: PathBuf) -> county_health::Result<()> {
    let summary = import_csv(&store_path, &csv_path).await?;
    info!(
        table = %summary.table,
        columns = summary.columns.len(),
        rows = summary.rows,
        "Import complete"
    );
    Ok(())
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> county_health::Result<()> {
    println!("======================================================================");
    println!("COUNTY HEALTH LOOKUP - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    if let Err(e) = config.validate() {
        println!("FAILED");
        println!("  Error: {}", e);
        return Err(AppError::InvalidConfig(e));
    }
    println!("OK");

    let allowed = config.allow_list();
    let exists = config.db_path.exists();

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Store: {} ({})", config.db_path.display(), if exists { "present" } else { "MISSING" });
    println!("  Listen: {}:{}", config.host, config.port);
    println!("  Max Body: {} bytes", config.max_body_bytes);
    println!("  Allowed Measures: {}", allowed.len());
    for name in allowed.iter() {
        println!("    - {}", name);
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP lookup service until a shutdown signal arrives.
async fn cmd_serve(
    mut config: Config,
    port: Option<u16>,
    db_path: Option<PathBuf>,
) -> county_health::Result<()> {
    // Override with CLI args if provided
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(db_path) = db_path {
        config.db_path = db_path;
    }

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        AppError::InvalidConfig(e)
    })?;

    let mut state = AppState::from_config(&config);
    match metrics::install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Metrics recorder unavailable: {}", e),
    }

    let probe = state.store.probe().await;
    if probe.exists {
        info!(db_path = %probe.db_path, size = probe.size, "Store found");
    } else {
        warn!(db_path = %probe.db_path, "Store file missing; lookups will fail until it is imported");
    }
    info!(measures = state.measures.len(), "Allow-list loaded");

    let host: IpAddr = config
        .host
        .parse()
        .map_err(|_| AppError::InvalidConfig(format!("HOST is not an IP address: {}", config.host)))?;
    let addr = SocketAddr::new(host, config.port);
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router_with_limit(state, config.max_body_bytes);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
