use std::path::PathBuf;
use stockwatch_core::CoreError;
use thiserror::Error;

/// Errors returned by the offline pipeline.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot parse {column} at row {row}: {message}")]
    Parse {
        column: String,
        row: usize,
        message: String,
    },

    #[error("invalid split: {0}")]
    InvalidSplit(String),

    #[error("plot error: {0}")]
    Plot(String),

    #[error("record store error: {0}")]
    Store(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, TrainerError>;
