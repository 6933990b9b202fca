//! Stockwatch prediction server

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use stockwatch_api::create_router;
use stockwatch_core::{ArtifactBundle, PipelineConfig, Predictor};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "stockwatch-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve trade profitability predictions over HTTP", long_about = None)]
struct Cli {
    /// Pipeline configuration file
    #[arg(short, long, default_value = "config/pipeline.yaml")]
    config: PathBuf,

    /// Bind address, overrides the configured one
    #[arg(long)]
    bind: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        PipelineConfig::load(&cli.config)
            .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?
    } else {
        let mut config = PipelineConfig::default();
        config.apply_env_overrides().context("Invalid environment override")?;
        config
    };

    let level = if cli.verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log level")?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;
    config.log_summary(cli.config.exists().then_some(cli.config.as_path()));

    let paths = config.artifacts.paths();
    let bundle = ArtifactBundle::load(&paths)
        .with_context(|| format!("Failed to load artifacts from {}", paths.model.display()))?;
    let predictor = Predictor::new(bundle).context("Artifacts cannot serve predictions")?;
    info!("Loaded artifact bundle {}", predictor.bundle().bundle_id());

    let app = create_router(Arc::new(predictor));
    let addr = cli.bind.unwrap_or(config.api.bind);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind listener on {addr}"))?;
    info!("Stockwatch API listening on {}", addr);

    axum::serve(listener, app)
        .await
        .context("API server terminated unexpectedly")
}
