// Main entry point - Dependency injection, CLI and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::design_service::DesignService;
use crate::domain::design::DesignInputs;
use crate::infrastructure::chart_store::load_charts;
use crate::infrastructure::config::{AppConfig, DEFAULT_CONFIG_PATH, load_config};
use crate::infrastructure::session_store::{load_session, save_session};
use crate::presentation::app_state::AppState;

#[derive(Parser)]
#[command(name = "hopper-design", version, about = "Silo hopper design from shear-test data and Jenike charts")]
struct Cli {
    /// Configuration file; HOPPER__* environment variables override it
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the design API over HTTP
    Serve,
    /// Run a saved design session and print the report as JSON
    Design { session: PathBuf },
    /// Write the example session to a file
    InitSession { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config).with_context(|| format!("Failed to load config {}", cli.config))?;

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Design { session } => {
            let service = design_service(&config)?;
            let inputs = load_session(&session)?;
            let report = service.design(&inputs)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::InitSession { path } => save_session(&path, &DesignInputs::default()),
    }
}

fn design_service(config: &AppConfig) -> anyhow::Result<DesignService> {
    // Load chart dataset (infrastructure layer)
    let charts = load_charts(config.charts.path.as_deref().map(std::path::Path::new))?;

    // Create service (application layer)
    Ok(DesignService::new(Arc::new(charts), config.design.clone()))
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        design_service: design_service(&config)?,
    });

    // Build router (presentation layer)
    let router = presentation::router(state);

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting hopper-design service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
