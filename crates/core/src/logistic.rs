//! Fitted binary logistic classifier

use crate::errors::{CoreError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Linear decision function plus logistic link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Feature names in coefficient order (readable form)
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Solver iterations used during fitting
    pub iterations: usize,
    pub converged: bool,
}

impl LogisticModel {
    pub fn width(&self) -> usize {
        self.coefficients.len()
    }

    pub fn decision(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.width() {
            return Err(CoreError::DimensionMismatch {
                expected: self.width(),
                got: x.len(),
            });
        }
        let w = ArrayView1::from(&self.coefficients[..]);
        Ok(w.dot(&ArrayView1::from(x)) + self.intercept)
    }

    /// Probability of class 1 for one scaled feature row.
    pub fn predict_proba(&self, x: &[f64]) -> Result<f64> {
        Ok(sigmoid(self.decision(x)?))
    }

    /// Probability of class 1 for every row of a scaled matrix.
    pub fn predict_proba_matrix(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.width() {
            return Err(CoreError::DimensionMismatch {
                expected: self.width(),
                got: x.ncols(),
            });
        }
        let w = ArrayView1::from(&self.coefficients[..]);
        Ok((x.dot(&w) + self.intercept).mapv(sigmoid))
    }

    /// Hard labels at the 0.5 threshold.
    pub fn predict_matrix(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u8>> {
        Ok(self.predict_proba_matrix(x)?.mapv(|p| u8::from(p > 0.5)))
    }

    /// `(feature, coefficient)` pairs in feature order.
    pub fn coefficient_map(&self) -> Vec<(String, f64)> {
        self.feature_names
            .iter()
            .cloned()
            .zip(self.coefficients.iter().copied())
            .collect()
    }
}
