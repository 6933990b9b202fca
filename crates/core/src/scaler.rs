//! Per-column standardization (zero mean, unit variance)

use crate::errors::{CoreError, Result};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Column means and scales learned from training rows only.
///
/// Variance is the population variance. A column whose variance is within
/// rounding error of zero counts as constant and keeps a scale of `1.0`,
/// so it maps to (nearly) zero instead of blowing up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Variance no larger than the accumulated rounding error of computing it.
fn is_constant(var: f64, mean: f64, n: f64) -> bool {
    let bound = n * f64::EPSILON * var + (n * mean * f64::EPSILON).powi(2);
    var <= bound
}

impl StandardScaler {
    pub fn fit(x: ArrayView2<'_, f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(CoreError::InvalidRecord("cannot fit scaler on zero rows".into()));
        }
        let n = x.nrows() as f64;
        let mut mean = Vec::with_capacity(x.ncols());
        let mut scale = Vec::with_capacity(x.ncols());

        for column in x.axis_iter(Axis(1)) {
            let mu = column.iter().sum::<f64>() / n;
            let var = column.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / n;
            mean.push(mu);
            scale.push(if is_constant(var, mu, n) { 1.0 } else { var.sqrt() });
        }

        Ok(Self { mean, scale })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.width() {
            return Err(CoreError::DimensionMismatch {
                expected: self.width(),
                got: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (mu, sd))| (v - mu) / sd)
            .collect())
    }

    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.width() {
            return Err(CoreError::DimensionMismatch {
                expected: self.width(),
                got: x.ncols(),
            });
        }
        let mut out = x.to_owned();
        for (mut column, (mu, sd)) in out
            .axis_iter_mut(Axis(1))
            .zip(self.mean.iter().zip(&self.scale))
        {
            column.mapv_inplace(|v| (v - mu) / sd);
        }
        Ok(out)
    }
}
