//! Versioned artifact bundle: model, encoder and scaler of one training run
//!
//! The three components are written to separate files so each can be
//! inspected on its own, but every file carries the same `bundle_id`
//! (BLAKE3 over the canonical JSON of all three payloads). Loading reads
//! all three, checks tags, format version, bundle id and shapes, and only
//! then hands out a bundle.

use crate::encoder::OneHotEncoder;
use crate::errors::{CoreError, Result};
use crate::logistic::LogisticModel;
use crate::scaler::StandardScaler;
use crate::serialization::{canonical_digest_hex, canonical_json_string};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Artifact layout version understood by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Which component an artifact file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Model,
    Encoder,
    Scaler,
}

/// On-disk wrapper around one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEnvelope<T> {
    pub kind: ArtifactKind,
    pub format_version: u32,
    pub bundle_id: String,
    pub payload: T,
}

/// Locations of the three component files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub encoder: PathBuf,
    pub scaler: PathBuf,
}

#[derive(Serialize)]
struct BundleDigest<'a> {
    format_version: u32,
    model: &'a LogisticModel,
    encoder: &'a OneHotEncoder,
    scaler: &'a StandardScaler,
    numeric_columns: &'a [String],
}

/// Matched model, encoder and scaler.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    model: LogisticModel,
    encoder: OneHotEncoder,
    scaler: StandardScaler,
    numeric_columns: Vec<String>,
    bundle_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EncoderPayload {
    encoder: OneHotEncoder,
    numeric_columns: Vec<String>,
}

impl ArtifactBundle {
    /// Assemble a bundle, validating that the three pieces fit together.
    pub fn new(
        model: LogisticModel,
        encoder: OneHotEncoder,
        scaler: StandardScaler,
        numeric_columns: Vec<String>,
    ) -> Result<Self> {
        check_shapes(&model, &encoder, &scaler, &numeric_columns)?;
        let bundle_id = digest(&model, &encoder, &scaler, &numeric_columns)?;
        Ok(Self {
            model,
            encoder,
            scaler,
            numeric_columns,
            bundle_id,
        })
    }

    pub fn model(&self) -> &LogisticModel {
        &self.model
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Numeric columns appended after the one-hot block, in order.
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    /// Write all three component files.
    pub fn save(&self, paths: &ArtifactPaths) -> Result<()> {
        write_envelope(&paths.model, ArtifactKind::Model, &self.bundle_id, &self.model)?;
        write_envelope(
            &paths.encoder,
            ArtifactKind::Encoder,
            &self.bundle_id,
            &EncoderPayload {
                encoder: self.encoder.clone(),
                numeric_columns: self.numeric_columns.clone(),
            },
        )?;
        write_envelope(&paths.scaler, ArtifactKind::Scaler, &self.bundle_id, &self.scaler)?;
        info!(bundle_id = %self.bundle_id, "artifact bundle saved");
        Ok(())
    }

    /// Read and validate all three component files as one unit.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let model: ArtifactEnvelope<LogisticModel> = read_envelope(&paths.model, ArtifactKind::Model)?;
        let encoder: ArtifactEnvelope<EncoderPayload> =
            read_envelope(&paths.encoder, ArtifactKind::Encoder)?;
        let scaler: ArtifactEnvelope<StandardScaler> =
            read_envelope(&paths.scaler, ArtifactKind::Scaler)?;

        if model.bundle_id != encoder.bundle_id || model.bundle_id != scaler.bundle_id {
            return Err(CoreError::ArtifactMismatch(format!(
                "bundle ids differ: model={}, encoder={}, scaler={}",
                model.bundle_id, encoder.bundle_id, scaler.bundle_id
            )));
        }

        let bundle = Self::new(
            model.payload,
            encoder.payload.encoder,
            scaler.payload,
            encoder.payload.numeric_columns,
        )?;
        if bundle.bundle_id != model.bundle_id {
            return Err(CoreError::ArtifactMismatch(format!(
                "bundle id {} does not match recomputed digest {}",
                model.bundle_id, bundle.bundle_id
            )));
        }

        info!(bundle_id = %bundle.bundle_id, "artifact bundle loaded");
        Ok(bundle)
    }
}

fn check_shapes(
    model: &LogisticModel,
    encoder: &OneHotEncoder,
    scaler: &StandardScaler,
    numeric_columns: &[String],
) -> Result<()> {
    let expected = encoder.width() + numeric_columns.len();
    if scaler.width() != expected {
        return Err(CoreError::ArtifactMismatch(format!(
            "scaler width {} but encoder produces {} features",
            scaler.width(),
            expected
        )));
    }
    if model.width() != expected || model.feature_names.len() != expected {
        return Err(CoreError::ArtifactMismatch(format!(
            "model has {} coefficients ({} names) but encoder produces {} features",
            model.width(),
            model.feature_names.len(),
            expected
        )));
    }
    Ok(())
}

fn digest(
    model: &LogisticModel,
    encoder: &OneHotEncoder,
    scaler: &StandardScaler,
    numeric_columns: &[String],
) -> Result<String> {
    Ok(canonical_digest_hex(&BundleDigest {
        format_version: FORMAT_VERSION,
        model,
        encoder,
        scaler,
        numeric_columns,
    })?)
}

fn write_envelope<T: Serialize + Clone>(
    path: &Path,
    kind: ArtifactKind,
    bundle_id: &str,
    payload: &T,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let envelope = ArtifactEnvelope {
        kind,
        format_version: FORMAT_VERSION,
        bundle_id: bundle_id.to_string(),
        payload: payload.clone(),
    };
    std::fs::write(path, canonical_json_string(&envelope)?)?;
    Ok(())
}

fn read_envelope<T: DeserializeOwned>(path: &Path, kind: ArtifactKind) -> Result<ArtifactEnvelope<T>> {
    let content = std::fs::read_to_string(path)?;
    let envelope: ArtifactEnvelope<T> = serde_json::from_str(&content)?;
    if envelope.kind != kind {
        return Err(CoreError::ArtifactMismatch(format!(
            "{} holds a {:?} artifact, expected {:?}",
            path.display(),
            envelope.kind,
            kind
        )));
    }
    if envelope.format_version != FORMAT_VERSION {
        return Err(CoreError::ArtifactMismatch(format!(
            "{} has format version {}, expected {}",
            path.display(),
            envelope.format_version,
            FORMAT_VERSION
        )));
    }
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    fn bundle(intercept: f64) -> ArtifactBundle {
        let encoder =
            OneHotEncoder::fit(&["owner".to_string()], &[vec!["self"], vec!["joint"]]).unwrap();
        let scaler = StandardScaler::fit(array![[0.0, 1.0, 10.0], [1.0, 0.0, 20.0]].view()).unwrap();
        let model = LogisticModel {
            feature_names: vec!["owner_joint".into(), "owner_self".into(), "trans_price".into()],
            coefficients: vec![0.1, -0.1, 0.3],
            intercept,
            iterations: 4,
            converged: true,
        };
        ArtifactBundle::new(model, encoder, scaler, vec!["trans_price".into()]).unwrap()
    }

    fn paths(dir: &TempDir) -> ArtifactPaths {
        ArtifactPaths {
            model: dir.path().join("model.json"),
            encoder: dir.path().join("encoder.json"),
            scaler: dir.path().join("scaler.json"),
        }
    }

    #[test]
    fn save_then_load_gives_same_bundle() {
        let dir = TempDir::new().unwrap();
        let original = bundle(0.2);
        original.save(&paths(&dir)).unwrap();
        let loaded = ArtifactBundle::load(&paths(&dir)).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn mixing_runs_is_rejected() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        bundle(0.2).save(&paths(&first)).unwrap();
        bundle(0.9).save(&paths(&second)).unwrap();

        let mixed = ArtifactPaths {
            model: paths(&second).model,
            ..paths(&first)
        };
        assert!(matches!(
            ArtifactBundle::load(&mixed),
            Err(CoreError::ArtifactMismatch(_))
        ));
    }

    #[test]
    fn swapped_files_are_rejected() {
        let dir = TempDir::new().unwrap();
        bundle(0.2).save(&paths(&dir)).unwrap();
        let swapped = ArtifactPaths {
            model: paths(&dir).scaler,
            ..paths(&dir)
        };
        assert!(ArtifactBundle::load(&swapped).is_err());
    }

    #[test]
    fn shape_disagreement_is_rejected() {
        let encoder = OneHotEncoder::fit(&["owner".to_string()], &[vec!["self"]]).unwrap();
        let scaler = StandardScaler::fit(array![[1.0, 2.0]].view()).unwrap();
        let model = LogisticModel {
            feature_names: vec!["a".into(), "b".into(), "c".into()],
            coefficients: vec![0.0; 3],
            intercept: 0.0,
            iterations: 0,
            converged: false,
        };
        assert!(matches!(
            ArtifactBundle::new(model, encoder, scaler, vec!["trans_price".into()]),
            Err(CoreError::ArtifactMismatch(_))
        ));
    }
}
