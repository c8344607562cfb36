//! Baken Predictor
//!
//! Reconstructs which horse a bettor implicitly treated as favorite (本命)
//! and rival (対抗) in each race, inferred from how money was distributed
//! across the bet tickets placed on that race.

mod assemble;
mod cli;
mod config;
mod error;
mod predictor;
mod resolver;
mod routes;
mod tiebreak;
mod types;
mod votes;

use axum::{routing::get, routing::post, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => run_server(Some(host), Some(port)).await,
        Commands::Resolve {
            input,
            format,
            output,
        } => cli::run_resolve(input, format, output),
    }
}

/// Run the API server.
async fn run_server(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "baken_predictor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = AppConfig::load()?;

    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!(
        "Win stake-share threshold: {}",
        config.predictor.win_stake_share_threshold
    );

    // Create application state
    let state = Arc::new(AppState {
        config: config.clone(),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/resolve", post(routes::resolve))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
