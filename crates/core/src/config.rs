//! Pipeline configuration
//!
//! One YAML document drives cleaning, training, artifact locations, the
//! record store and the prediction endpoint. Every section has defaults so
//! a partial file is enough; a handful of knobs can be overridden from the
//! environment.

use crate::artifact::ArtifactPaths;
use crate::errors::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub clean: CleanConfig,
    pub train: TrainConfig,
    pub artifacts: ArtifactConfig,
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// Cleaning and joining of the raw tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    pub transactions_path: PathBuf,
    pub transaction_prices_path: PathBuf,
    pub current_prices_path: PathBuf,
    pub output_path: PathBuf,
    /// Keep the N most frequent representatives
    pub top_representatives: usize,
    pub exclude_representatives: Vec<String>,
    pub include_representatives: Vec<String>,
    /// Keep the N most frequent tickers (before exclusions)
    pub top_tickers: usize,
    pub exclude_tickers: Vec<String>,
    pub impute: ImputeConfig,
    pub columns_to_drop: Vec<String>,
}

/// Replacement of missing categorical values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputeConfig {
    pub column: String,
    pub replacement: String,
    pub sentinel: String,
}

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub categorical_columns: Vec<String>,
    pub response_column: String,
    pub test_size: f64,
    pub random_state: u64,
    pub max_iter: usize,
    /// Inverse L2 regularization strength
    pub c: f64,
    /// Gradient tolerance for the solver
    pub tol: f64,
}

/// Output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub model_path: PathBuf,
    pub encoder_path: PathBuf,
    pub scaler_path: PathBuf,
    pub report_path: PathBuf,
    pub confusion_matrix_path: Option<PathBuf>,
    pub roc_path: Option<PathBuf>,
}

/// Local record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

/// Prediction endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: String,
}

/// Logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            transactions_path: PathBuf::from("data/raw/all_transactions.csv"),
            transaction_prices_path: PathBuf::from("data/raw/transaction_prices.csv"),
            current_prices_path: PathBuf::from("data/raw/current_prices.csv"),
            output_path: PathBuf::from("data/clean/transactions.csv"),
            top_representatives: 15,
            exclude_representatives: vec!["Hon. Donna Shalala".to_string()],
            include_representatives: vec!["Hon. Nancy Pelosi".to_string()],
            top_tickers: 11,
            exclude_tickers: vec!["--".to_string()],
            impute: ImputeConfig::default(),
            columns_to_drop: vec![
                "transaction_date".to_string(),
                "current_date".to_string(),
                "current_price".to_string(),
            ],
        }
    }
}

impl Default for ImputeConfig {
    fn default() -> Self {
        Self {
            column: "owner".to_string(),
            replacement: "undisclosed".to_string(),
            sentinel: "--".to_string(),
        }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/clean/transactions.csv"),
            categorical_columns: ["owner", "ticker", "type", "amount", "representative"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            response_column: "response".to_string(),
            test_size: 0.25,
            random_state: 42,
            max_iter: 100,
            c: 1.0,
            tol: 1e-4,
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/model.json"),
            encoder_path: PathBuf::from("models/encoder.json"),
            scaler_path: PathBuf::from("models/scaler.json"),
            report_path: PathBuf::from("models/results.yaml"),
            confusion_matrix_path: Some(PathBuf::from("figures/confusion_matrix.svg")),
            roc_path: Some(PathBuf::from("figures/roc_curve.svg")),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/store"),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ArtifactConfig {
    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.model_path.clone(),
            encoder: self.encoder_path.clone(),
            scaler: self.scaler_path.clone(),
        }
    }
}

impl PipelineConfig {
    /// Load a YAML file, apply environment overrides and validate.
    ///
    /// Nothing is logged here: callers usually install their subscriber
    /// from the loaded `logging` section and then call [`Self::log_summary`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: PipelineConfig = serde_yaml::from_str(&content)?;
        config.apply_env_overrides()?;

        let problems = config.validate();
        if !problems.is_empty() {
            return Err(CoreError::Config(problems.join("; ")));
        }

        Ok(config)
    }

    /// Override selected values from `STOCKWATCH_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("STOCKWATCH_TEST_SIZE") {
            self.train.test_size = val
                .parse()
                .map_err(|e| CoreError::Config(format!("STOCKWATCH_TEST_SIZE: {e}")))?;
        }

        if let Ok(val) = std::env::var("STOCKWATCH_RANDOM_STATE") {
            self.train.random_state = val
                .parse()
                .map_err(|e| CoreError::Config(format!("STOCKWATCH_RANDOM_STATE: {e}")))?;
        }

        if let Ok(val) = std::env::var("STOCKWATCH_MAX_ITER") {
            self.train.max_iter = val
                .parse()
                .map_err(|e| CoreError::Config(format!("STOCKWATCH_MAX_ITER: {e}")))?;
        }

        if let Ok(val) = std::env::var("STOCKWATCH_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Ok(val) = std::env::var("STOCKWATCH_API_BIND") {
            self.api.bind = val;
        }

        Ok(())
    }

    /// Problems that would make a run meaningless.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !(self.train.test_size > 0.0 && self.train.test_size < 1.0) {
            problems.push(format!(
                "train.test_size must be in (0, 1), got {}",
                self.train.test_size
            ));
        }
        if self.train.max_iter == 0 {
            problems.push("train.max_iter must be positive".to_string());
        }
        if self.train.c <= 0.0 {
            problems.push(format!("train.c must be positive, got {}", self.train.c));
        }
        if self.train.categorical_columns.is_empty() {
            problems.push("train.categorical_columns must not be empty".to_string());
        }
        if self
            .train
            .categorical_columns
            .contains(&self.train.response_column)
        {
            problems.push("train.response_column cannot also be categorical".to_string());
        }
        problems
    }

    /// Settings that are valid but probably unintended.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.clean.top_representatives == 0 {
            warnings.push("clean.top_representatives of zero selects no rows".to_string());
        }
        if self.clean.top_tickers == 0 {
            warnings.push("clean.top_tickers of zero selects no rows".to_string());
        }
        warnings
    }

    /// Log where the configuration came from and any [`Self::warnings`].
    pub fn log_summary(&self, source: Option<&Path>) {
        match source {
            Some(path) => info!("Configuration loaded from {}", path.display()),
            None => info!("Using built-in configuration defaults"),
        }
        info!(
            test_size = self.train.test_size,
            random_state = self.train.random_state,
            max_iter = self.train.max_iter,
            "training settings"
        );
        for warning in self.warnings() {
            warn!("{warning}");
        }
    }
}
