//! Stockwatch CLI
//!
//! Cleans raw disclosures, trains the classifier and scores single trades.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stockwatch_core::{ArtifactBundle, PipelineConfig, Predictor, TransactionQuery};
use stockwatch_trainer::{pipeline, trainer, TransactionStore};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "stockwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Profitability classifier for disclosed congressional trades", long_about = None)]
struct Cli {
    /// Pipeline configuration file
    #[arg(short, long, global = true, default_value = "config/pipeline.yaml")]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join raw transactions with prices and write the cleaned table
    Clean,
    /// Train and evaluate the classifier on the cleaned table
    Train,
    /// Score a single transaction with the saved artifacts
    Predict {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        ticker: String,
        #[arg(long = "type")]
        transaction_type: String,
        /// Amount bucket label, e.g. "$1,001 - $15,000"
        #[arg(long)]
        amount: String,
        #[arg(long)]
        representative: String,
        /// Price on the transaction date
        #[arg(long)]
        trans_price: f64,
    },
    /// Replace the local record store contents with the joined records
    Ingest,
    /// Show the saved bundle id and coefficients
    Inspect,
}

fn load_config(path: &Path) -> Result<PipelineConfig> {
    if path.exists() {
        return PipelineConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }
    let mut config = PipelineConfig::default();
    config.apply_env_overrides().context("Invalid environment override")?;
    let problems = config.validate();
    anyhow::ensure!(problems.is_empty(), "Invalid configuration: {}", problems.join("; "));
    Ok(config)
}

fn init_logging(level: &str, verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .context("Invalid log level")?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(&config.logging.level, cli.verbose)?;

    info!("Stockwatch v{}", env!("CARGO_PKG_VERSION"));
    if cli.config.exists() {
        config.log_summary(Some(cli.config.as_path()));
    } else {
        warn!("{} not found", cli.config.display());
        config.log_summary(None);
    }

    match cli.command {
        Command::Clean => {
            let frame = pipeline::clean(&config.clean).context("Cleaning failed")?;
            info!("✓ Cleaned {} rows", frame.len());
        }
        Command::Train => {
            let (bundle, report) = trainer::train(&config.train, &config.artifacts).context("Training failed")?;
            info!("✓ Training completed successfully");
            info!("  Accuracy: {:.3}", report.classification_report.accuracy);
            match report.auc {
                Some(auc) => info!("  AUC: {:.3}", auc),
                None => info!("  AUC: undefined"),
            }
            info!("  Log loss: {:.4}", report.log_loss);
            info!("  Bundle: {}", bundle.bundle_id());
        }
        Command::Predict {
            owner,
            ticker,
            transaction_type,
            amount,
            representative,
            trans_price,
        } => {
            let predictor = load_predictor(&config)?;
            let query = TransactionQuery {
                owner,
                ticker,
                transaction_type,
                amount,
                representative,
                trans_price,
            };
            let probability = predictor.predict(&query).context("Prediction failed")?;
            println!("{probability}");
        }
        Command::Ingest => {
            let records = pipeline::joined_records(&config.clean).context("Failed to build joined records")?;
            let store = TransactionStore::open(&config.store.path)
                .with_context(|| format!("Failed to open record store at {}", config.store.path.display()))?;
            let written = store.replace_all(&records).context("Failed to write records")?;
            let total = store.len();
            store.close().context("Failed to close record store")?;
            info!("✓ Ingested {} records ({} stored)", written, total);
        }
        Command::Inspect => {
            let predictor = load_predictor(&config)?;
            let bundle = predictor.bundle();
            println!("bundle_id: {}", bundle.bundle_id());
            println!("features: {}", bundle.model().width());
            println!("intercept: {}", bundle.model().intercept);
            for (name, coefficient) in bundle.model().coefficient_map() {
                println!("  {name}: {coefficient}");
            }
        }
    }

    Ok(())
}

fn load_predictor(config: &PipelineConfig) -> Result<Predictor> {
    let paths = config.artifacts.paths();
    let bundle = ArtifactBundle::load(&paths)
        .with_context(|| format!("Failed to load artifacts from {}", paths.model.display()))?;
    Predictor::new(bundle).context("Artifacts cannot serve predictions")
}
