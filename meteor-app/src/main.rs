//! meteor-app - Traffic camera & weather viewer
//!
//! Serves a single page on which the user picks a date/time; the server
//! fetches traffic-camera and 2-hour forecast snapshots for that instant,
//! joins them by proximity, resolves street names, and streams notifications
//! back to the page.

use anyhow::Result;
use clap::Parser;
use meteor_common::config::{load_toml_config, resolve_config_path};
use meteor_common::events::EventBus;
use meteor_common::time::now_timestamp;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use meteor_app::config::{resolve_log_level, AppConfig, Overrides};
use meteor_app::services::HttpSources;
use meteor_app::{build_router, AppState, Dashboard};

/// Traffic camera & weather viewer
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "METEOR_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "METEOR_HOST")]
    host: Option<String>,

    /// Port to bind the HTTP server to
    #[arg(short, long, env = "METEOR_PORT")]
    port: Option<u16>,

    /// positionstack access key for street names
    #[arg(long, env = "METEOR_GEOCODE_API_KEY", hide_env_values = true)]
    geocode_api_key: Option<String>,

    /// Use the strict north-east, last-match-wins area rule
    #[arg(long, env = "METEOR_LITERAL_MATCH")]
    literal_match: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, env = "METEOR_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    let toml = load_toml_config(config_path.as_deref())?;

    let log_level = resolve_log_level(cli.log_level.as_deref(), &toml);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    let config = AppConfig::resolve(
        toml,
        Overrides {
            host: cli.host,
            port: cli.port,
            geocode_api_key: cli.geocode_api_key,
            literal_match: cli.literal_match,
        },
    );

    // Build identification first, before any network activity
    info!(
        "Starting Meteor (meteor-app) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_path {
        Some(path) if path.exists() => info!("Configuration: {}", path.display()),
        _ => info!("Configuration: compiled defaults"),
    }
    info!("Area matching: {:?}", config.strategy);

    let sources = match HttpSources::from_config(&config.toml.apis, config.geocode_api_key.clone()) {
        Ok(sources) => sources,
        Err(e) => {
            error!("Failed to create HTTP clients: {}", e);
            return Err(e.into());
        }
    };

    let event_bus = EventBus::new(256);
    let dashboard = Dashboard::new(
        sources.traffic,
        sources.weather,
        sources.geocoder,
        config.strategy,
        event_bus,
    );

    // Initial fetch for "now", as the page shows data on first load
    let initial = dashboard.refresh_at(now_timestamp()).await;
    info!("Initial fetch for {}", initial.timestamp);

    let state = AppState::new(dashboard);
    let app = build_router(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("meteor-app listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
