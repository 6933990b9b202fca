//! Single-record scoring with the training-time transform
//!
//! `transform` rebuilds exactly what the trainer fed the classifier: the
//! one-hot block in encoder column order, then the raw transaction price,
//! then the scaler. Nothing here mutates the artifacts, so one loaded
//! [`Predictor`] can serve any number of concurrent callers.

use crate::artifact::ArtifactBundle;
use crate::encoder::OneHotEncoder;
use crate::errors::{CoreError, Result};
use crate::logistic::LogisticModel;
use crate::scaler::StandardScaler;
use crate::types::TransactionQuery;
use serde::{Deserialize, Serialize};

/// Scaled model input for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Round a probability for display.
pub fn round3(p: f64) -> f64 {
    (p * 1000.0).round() / 1000.0
}

/// Encode `(column, value)` inputs, append `trans_price`, scale.
pub fn transform(
    encoder: &OneHotEncoder,
    scaler: &StandardScaler,
    categorical_inputs: &[(&str, &str)],
    trans_price: f64,
) -> Result<FeatureVector> {
    if !trans_price.is_finite() {
        return Err(CoreError::InvalidRecord(format!(
            "transaction price must be finite, got {trans_price}"
        )));
    }
    let mut row = encoder.transform_named(categorical_inputs)?;
    row.push(trans_price);
    Ok(FeatureVector(scaler.transform_row(&row)?))
}

/// Probability that the position is worth more now, rounded to 3 decimals.
pub fn predict(
    model: &LogisticModel,
    encoder: &OneHotEncoder,
    scaler: &StandardScaler,
    categorical_inputs: &[(&str, &str)],
    trans_price: f64,
) -> Result<f64> {
    let features = transform(encoder, scaler, categorical_inputs, trans_price)?;
    Ok(round3(model.predict_proba(features.as_slice())?))
}

/// Read-only scorer over a validated artifact bundle.
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: ArtifactBundle,
}

impl Predictor {
    /// Wrap a bundle; the only numeric feature must be the transaction price.
    pub fn new(bundle: ArtifactBundle) -> Result<Self> {
        if bundle.numeric_columns() != ["trans_price"] {
            return Err(CoreError::ArtifactMismatch(format!(
                "expected trans_price as the only numeric feature, bundle has {:?}",
                bundle.numeric_columns()
            )));
        }
        Ok(Self { bundle })
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    pub fn transform(&self, query: &TransactionQuery) -> Result<FeatureVector> {
        transform(
            self.bundle.encoder(),
            self.bundle.scaler(),
            &query.categorical_inputs(),
            query.trans_price,
        )
    }

    pub fn predict(&self, query: &TransactionQuery) -> Result<f64> {
        predict(
            self.bundle.model(),
            self.bundle.encoder(),
            self.bundle.scaler(),
            &query.categorical_inputs(),
            query.trans_price,
        )
    }
}
