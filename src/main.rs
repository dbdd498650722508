//! hookgate: health probes and webhook verification.
//!
//! This is the application entry point. It initializes tracing, loads configuration
//! from a TOML file, builds the readiness dependency checker, sets up the Axum
//! router and starts the HTTP server.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hookgate::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use hookgate::health::build_checker;
use hookgate::http::start_server;
use hookgate::{create_router, AppState};

/// hookgate: health probes and webhook subscription verification
#[derive(Parser, Debug)]
#[command(name = "hookgate", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "hookgate=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration first: it decides the log format
    let config = AppConfig::load(&args.config)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(path = %args.config, "Loaded configuration");

    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let checker = build_checker(&config.dependency);
    tracing::info!(
        probe = config.dependency.kind(),
        target = %config.dependency.target(),
        "Readiness dependency configured"
    );

    if config.webhook.is_some() {
        tracing::info!("Webhook verification enabled");
    }

    let http_config = config.http.clone();
    let state = AppState::new(config, checker);
    let app = create_router(state);

    start_server(app, &http_config).await?;

    tracing::info!("Server stopped");
    Ok(())
}
