//! Stockwatch trainer - offline cleaning and deterministic model training
//!
//! Joins disclosed trades with transaction-day and current prices, labels
//! each trade by whether the price rose since, and fits a reproducible
//! L2-regularised logistic classifier whose artifacts are bundled for
//! inference by `stockwatch-core`.

pub mod deterministic;
pub mod errors;
pub mod frame;
pub mod join;
pub mod metrics;
pub mod pipeline;
pub mod plots;
pub mod prepare;
pub mod report;
pub mod solver;
pub mod store;
pub mod trainer;

pub use deterministic::{permutation, train_test_split, LcgRng, Split};
pub use errors::{Result, TrainerError};
pub use frame::Frame;
pub use join::{compute_response, join_current_price, join_transaction_price, usable_prices};
pub use metrics::{ClassificationReport, ConfusionMatrix, RocPoint};
pub use pipeline::{clean, joined_records, modelling_frame};
pub use prepare::{deduplicate, filter_columns, impute_missing};
pub use report::TrainingReport;
pub use solver::LogisticRegression;
pub use store::TransactionStore;
pub use trainer::{train, train_evaluate, EvaluationParams, TrainingSet};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
