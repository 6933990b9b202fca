//! Human-readable results of a training run

use crate::errors::Result;
use crate::metrics::{ClassificationReport, ConfusionMatrix, RocPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Evaluation on the held-out split plus the fitted coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub classification_report: ClassificationReport,
    /// Absent when the test split holds a single class
    pub auc: Option<f64>,
    pub log_loss: f64,
    pub confusion_matrix: ConfusionMatrix,
    /// Readable feature name -> coefficient
    pub coefficients: BTreeMap<String, f64>,
    pub intercept: f64,
    pub iterations: usize,
    pub converged: bool,
    pub n_train: usize,
    pub n_test: usize,
    /// Set once the artifacts have been bundled
    pub bundle_id: Option<String>,
    #[serde(skip)]
    pub roc_curve: Vec<RocPoint>,
}

impl TrainingReport {
    pub fn write_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        info!("Model results written to: {}", path.display());
        Ok(())
    }

    pub fn read_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}
