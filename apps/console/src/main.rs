mod commands;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{ClientConfig, ConsoleClient, FileCredentialStore};
use regions::RegionCatalog;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fundi", about = "Contractor console for the FundiPro API")]
struct Args {
    /// Overrides `api_url` from console.toml and the environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    debug!(?settings, "console: settings loaded");

    let catalog = match &settings.regions_path {
        Some(path) => RegionCatalog::load(path)
            .with_context(|| format!("failed to load region catalog {}", path.display()))?,
        None => RegionCatalog::bundled().context("bundled region catalog is invalid")?,
    };

    let client_config =
        ClientConfig::new(&settings.api_url)?.with_timeout(settings.request_timeout());
    let persistence = Arc::new(FileCredentialStore::in_dir(&settings.state_dir));
    let client = ConsoleClient::connect(&client_config, persistence).await?;

    commands::run(&client, &catalog, args.command).await
}
