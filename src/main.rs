//! Vector Health Server
//!
//! Serves health checks and Prometheus metrics for the ticket-routing vector index.

use clap::{Arg, ArgAction, Command};
use tokio::signal;
use tracing::{error, info, warn};
use vector_health::{
    api::start_server,
    core::{
        app_state::create_client,
        config::{parse_provider, ClientProvider},
        AppState, Config,
    },
    Error, Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("vector-health")
        .version(vector_health::VERSION)
        .about("Health checks and metrics for the ticket-routing vector index.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("HTTP server bind address")
        )
        .arg(
            Arg::new("index-name")
                .long("index-name")
                .value_name("NAME")
                .help("Vector index name")
        )
        .arg(
            Arg::new("provider")
                .long("provider")
                .value_name("PROVIDER")
                .help("Vector index client (pinecone, memory)")
        )
        .arg(
            Arg::new("environment")
                .long("environment")
                .value_name("ENV")
                .help("Deployment environment reported in responses")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("demo")
                .long("demo")
                .action(ArgAction::SetTrue)
                .help("Serve an in-memory index with sample ticket namespaces")
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Run one detailed health check, print it and exit")
        )
        .get_matches();

    // Load configuration
    let mut config = if let Some(config_path) = matches.get_one::<String>("config") {
        Config::load_from(config_path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    // Initialize logging
    vector_health::init(&config)?;

    // Connect to the vector index
    let client = create_client(&config)?;
    if let Err(e) = client.initialize(config.client.create_if_missing).await {
        // Keep serving: the health endpoints will report the index as unhealthy
        warn!(
            error = %e,
            index = %config.client.index_name,
            "Vector index initialization failed"
        );
    } else {
        info!(
            index = %config.client.index_name,
            provider = %client.descriptor().provider,
            "Vector index client ready"
        );
    }

    let http_addr = config.server.http_addr;
    let check_only = matches.get_flag("check");
    let state = AppState::new(config, client)?.shared();

    if check_only {
        return run_check(&state).await;
    }

    info!("Starting {} v{}", vector_health::NAME, vector_health::VERSION);
    start_server(http_addr, state, setup_shutdown_handler()).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr.parse()
            .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
    }

    if let Some(index_name) = matches.get_one::<String>("index-name") {
        config.client.index_name = index_name.clone();
    }

    if let Some(provider) = matches.get_one::<String>("provider") {
        config.client.provider = parse_provider(provider)?;
    }

    if let Some(environment) = matches.get_one::<String>("environment") {
        config.environment = Some(environment.clone());
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    if matches.get_flag("demo") {
        config.client.provider = ClientProvider::Memory;
    }

    Ok(())
}

/// Run a single detailed check and print the result as JSON.
///
/// Exits with status 1 when the index is not healthy enough to serve traffic.
async fn run_check(state: &AppState) -> Result<()> {
    match state.health.detailed_check().await {
        Ok((code, body)) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            if !code.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(failure) => {
            error!(error = %failure.error, "Vector index check failed");
            println!("{}", serde_json::to_string_pretty(&failure)?);
            std::process::exit(1);
        }
    }
}

/// Setup graceful shutdown signal handling
async fn setup_shutdown_handler() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
    warn!("Received shutdown signal, initiating graceful shutdown...");
}
