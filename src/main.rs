mod cli;
mod collector;
mod credentials;
mod kubernetes;
mod ledger;
mod metrics;
mod probe;
mod types;
mod utils;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use cli::Cli;
use kubernetes::KubeTransport;
use types::{BearerToken, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from(&cli);
    let now = chrono::Local::now();

    let summary = collector::run(&settings, now, || connect(&settings)).await?;

    if let Some(summary) = summary {
        info!(
            "Wrote {} lines to {}: {} namespaces, {} pods probed, {} with API access, {} duplicate lines rejected",
            summary.lines,
            settings.output.display(),
            summary.namespaces,
            summary.pods,
            summary.accessible,
            summary.duplicates
        );
    }

    Ok(())
}

/// Loads the exporter's own identity and builds the API client for it.
async fn connect(settings: &Settings) -> anyhow::Result<(KubeTransport, BearerToken)> {
    let identity = read_identity(settings)?;
    let transport = KubeTransport::connect(settings, identity.clone())
        .await
        .with_context(|| format!("Failed to build client for {}", settings.api_server))?;
    info!("Using API server {}", settings.api_server);
    Ok((transport, identity))
}

fn read_identity(settings: &Settings) -> anyhow::Result<BearerToken> {
    let raw = std::fs::read_to_string(&settings.token_file).with_context(|| {
        format!(
            "Failed to read service account token from {}",
            settings.token_file.display()
        )
    })?;
    BearerToken::new(raw).ok_or_else(|| {
        anyhow::anyhow!(
            "Service account token at {} is empty",
            settings.token_file.display()
        )
    })
}
