//! swarm-probe: Docker Swarm membership liveness probe.
//!
//! This is the application entry point. It loads configuration, initializes
//! tracing, builds the Docker status source and the probe router, and runs
//! the HTTP server until SIGINT/SIGTERM.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swarm_probe::config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use swarm_probe::docker::DockerStatusSource;
use swarm_probe::http::{shutdown_signal, ProbeServer};
use swarm_probe::routes::create_router;
use swarm_probe::state::AppState;
use swarm_probe::StatusSource;

/// swarm-probe: reports whether this node is an active Docker Swarm member
#[derive(Parser, Debug)]
#[command(name = "swarm-probe", version, about)]
struct Args {
    /// Path to configuration file (optional when left at the default)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "swarm_probe=debug")
    #[arg(short, long)]
    log_level: Option<String>,
}

fn init_tracing(log_level: Option<String>, logging: &LoggingConfig) {
    // Priority: CLI > env > default
    let log_filter = log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));

    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Tracing depends on the configured format, so config errors go to stderr via main's Err
    let config = AppConfig::load_or_default(&args.config)?;
    init_tracing(args.log_level, &config.logging);

    tracing::info!(
        config = %args.config,
        host = %config.http.host,
        port = config.http.port,
        shutdown_grace_seconds = config.http.shutdown_grace_seconds,
        docker_socket = ?config.docker.socket,
        request_timeout_seconds = config.docker.request_timeout_seconds,
        "Loaded configuration"
    );

    let source: Arc<dyn StatusSource> = Arc::new(DockerStatusSource::new(config.docker.clone()));
    let state = AppState::new(source, config.docker.request_timeout());
    let app = create_router(state);

    let server = ProbeServer::from_config(&config.http)?;

    // The router holds the only handle to the docker client; it is released
    // once the server and its last connection are gone
    if let Err(e) = server.run(app, shutdown_signal()).await {
        tracing::error!(error = %e, "Probe server failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
