//! Error types for the model core

use thiserror::Error;

/// Errors that can occur while encoding, scaling, scoring or loading artifacts
#[derive(Error, Debug)]
pub enum CoreError {
    /// Categorical value absent from the training-time vocabulary
    #[error("Unseen category {value:?} for column {column:?}")]
    UnseenCategory { column: String, value: String },

    /// Categorical inputs supplied in a different column order than at fit time
    #[error("Input order mismatch: expected columns {expected:?}, got {actual:?}")]
    InputOrderMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// Model, encoder and scaler do not belong to the same training run
    #[error("Artifact mismatch: {0}")]
    ArtifactMismatch(String),

    /// A raw record could not be interpreted
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Feature width disagreement
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for model core operations
pub type Result<T> = std::result::Result<T, CoreError>;
