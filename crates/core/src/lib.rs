//! Model core for disclosure-trade profitability prediction
//!
//! Everything the offline trainer and the online endpoint must agree on
//! lives here: the record types, the one-hot encoder with its frozen
//! vocabulary, the standard scaler, the fitted logistic model, the
//! artifact bundle that ties the three together, and the single-record
//! inference transform.
//!
//! Modules:
//! - `types`: Disclosure records, price points and joined rows
//! - `labels`: Readable one-hot column names
//! - `encoder`: One-hot encoder
//! - `scaler`: Standard scaler
//! - `logistic`: Fitted logistic classifier
//! - `artifact`: Versioned model/encoder/scaler bundle
//! - `inference`: Training-identical transform and prediction
//! - `config`: Pipeline configuration
//! - `serialization`: Canonical JSON and digests

pub mod artifact;
pub mod config;
pub mod encoder;
pub mod errors;
pub mod inference;
pub mod labels;
pub mod logistic;
pub mod scaler;
pub mod serialization;
pub mod types;

pub use artifact::{ArtifactBundle, ArtifactKind, ArtifactPaths, FORMAT_VERSION};
pub use config::PipelineConfig;
pub use encoder::OneHotEncoder;
pub use errors::{CoreError, Result};
pub use inference::{predict, transform, FeatureVector, Predictor};
pub use logistic::{sigmoid, LogisticModel};
pub use scaler::StandardScaler;
pub use types::{
    AmountBucket, JoinedRecord, Owner, PricePoint, PricedTransaction, TransactionQuery,
    TransactionRecord, TransactionType,
};

/// Crate version string for reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
