//! Model training and evaluation
//!
//! Turns the cleaned frame into a design matrix (one-hot block followed by
//! the numeric columns), splits it with a seeded permutation, fits the
//! scaler and the classifier on the training rows only, and scores the
//! held-out rows.

use crate::deterministic::train_test_split;
use crate::errors::{Result, TrainerError};
use crate::frame::Frame;
use crate::metrics::{log_loss, roc_auc, roc_curve, ClassificationReport, ConfusionMatrix};
use crate::plots;
use crate::report::TrainingReport;
use crate::solver::LogisticRegression;
use ndarray::{Array2, Axis};
use stockwatch_core::config::{ArtifactConfig, TrainConfig};
use stockwatch_core::labels::{tidy, unique_names};
use stockwatch_core::{ArtifactBundle, LogisticModel, OneHotEncoder, StandardScaler};
use tracing::{info, warn};

/// Design matrix, labels and the encoder that produced them
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub features: Array2<f64>,
    pub labels: Vec<u8>,
    /// Readable names, one per feature column
    pub feature_names: Vec<String>,
    pub encoder: OneHotEncoder,
    /// Numeric columns appended after the one-hot block, in frame order
    pub numeric_columns: Vec<String>,
}

impl TrainingSet {
    /// Encode `categorical_columns`, keep every other non-response column as
    /// a number, and read `response_column` as 0/1 labels.
    pub fn from_frame(frame: &Frame, categorical_columns: &[String], response_column: &str) -> Result<Self> {
        if frame.is_empty() {
            return Err(TrainerError::InvalidSplit("training data has no rows".into()));
        }

        let cat_idx: Vec<usize> = categorical_columns
            .iter()
            .map(|c| frame.column_index(c))
            .collect::<Result<_>>()?;
        let response_idx = frame.column_index(response_column)?;
        let numeric_idx: Vec<usize> = (0..frame.columns().len())
            .filter(|i| *i != response_idx && !cat_idx.contains(i))
            .collect();

        let mut categorical = Vec::with_capacity(frame.len());
        for row in 0..frame.len() {
            let values = cat_idx
                .iter()
                .map(|&c| frame.required(row, c))
                .collect::<Result<Vec<&str>>>()?;
            categorical.push(values);
        }
        let encoder = OneHotEncoder::fit(categorical_columns, &categorical)?;

        let width = encoder.width() + numeric_idx.len();
        let mut features = Array2::<f64>::zeros((frame.len(), width));
        let mut labels = Vec::with_capacity(frame.len());
        for (row, values) in categorical.iter().enumerate() {
            let mut encoded = encoder.transform_row(values)?;
            for &c in &numeric_idx {
                encoded.push(parse_number(frame, row, c)?);
            }
            features.row_mut(row).assign(&ndarray::ArrayView1::from(&encoded[..]));
            labels.push(parse_label(frame, row, response_idx)?);
        }

        let numeric_columns: Vec<String> = numeric_idx.iter().map(|&c| frame.columns()[c].clone()).collect();
        let mut readable = encoder.readable_feature_names();
        readable.extend(numeric_columns.iter().map(|c| tidy(c)));
        let feature_names = unique_names(readable.clone());
        let renamed = readable.iter().zip(&feature_names).filter(|(a, b)| a != b).count();
        if renamed > 0 {
            warn!(renamed, "readable feature names collided and were suffixed");
        }

        info!(
            rows = frame.len(),
            features = width,
            one_hot = encoder.width(),
            numeric = numeric_columns.len(),
            "training set encoded"
        );
        Ok(Self {
            features,
            labels,
            feature_names,
            encoder,
            numeric_columns,
        })
    }
}

fn parse_number(frame: &Frame, row: usize, column: usize) -> Result<f64> {
    let raw = frame.required(row, column)?;
    raw.trim().parse().map_err(|e: std::num::ParseFloatError| TrainerError::Parse {
        column: frame.columns()[column].clone(),
        row,
        message: e.to_string(),
    })
}

fn parse_label(frame: &Frame, row: usize, column: usize) -> Result<u8> {
    match frame.required(row, column)?.trim() {
        "0" => Ok(0),
        "1" => Ok(1),
        other => Err(TrainerError::Parse {
            column: frame.columns()[column].clone(),
            row,
            message: format!("expected 0 or 1, got {other:?}"),
        }),
    }
}

/// Split, scaling and solver parameters of one evaluation run
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationParams {
    pub test_fraction: f64,
    pub seed: u64,
    pub max_iter: usize,
    pub c: f64,
    pub tol: f64,
}

impl From<&TrainConfig> for EvaluationParams {
    fn from(config: &TrainConfig) -> Self {
        Self {
            test_fraction: config.test_size,
            seed: config.random_state,
            max_iter: config.max_iter,
            c: config.c,
            tol: config.tol,
        }
    }
}

/// Fit the scaler and classifier on a seeded split and evaluate on the rest.
///
/// Identical inputs and parameters give bit-identical results.
pub fn train_evaluate(
    features: &Array2<f64>,
    labels: &[u8],
    feature_names: &[String],
    params: &EvaluationParams,
) -> Result<(LogisticModel, StandardScaler, TrainingReport)> {
    if labels.len() != features.nrows() {
        return Err(TrainerError::InvalidSplit(format!(
            "{} labels for {} feature rows",
            labels.len(),
            features.nrows()
        )));
    }
    let split = train_test_split(features.nrows(), params.test_fraction, params.seed)?;
    info!(train = split.train.len(), test = split.test.len(), seed = params.seed, "data split");

    let x_train = features.select(Axis(0), &split.train);
    let x_test = features.select(Axis(0), &split.test);
    let y_train: Vec<u8> = split.train.iter().map(|&i| labels[i]).collect();
    let y_test: Vec<u8> = split.test.iter().map(|&i| labels[i]).collect();

    let scaler = StandardScaler::fit(x_train.view())?;
    let x_train = scaler.transform(x_train.view())?;
    let x_test = scaler.transform(x_test.view())?;

    let solver = LogisticRegression::new(params.c, params.max_iter, params.tol);
    let model = solver.fit(x_train.view(), &y_train, feature_names.to_vec())?;
    info!(iterations = model.iterations, converged = model.converged, "model fitted");

    let proba = model.predict_proba_matrix(x_test.view())?.to_vec();
    let predicted = model.predict_matrix(x_test.view())?.to_vec();

    let confusion_matrix = ConfusionMatrix::from_labels(&y_test, &predicted);
    let auc = roc_auc(&y_test, &proba);
    if auc.is_none() {
        warn!("test split holds a single class; AUC is undefined");
    }
    let log_loss = log_loss(&y_test, &proba);

    let report = TrainingReport {
        classification_report: ClassificationReport::from_confusion(&confusion_matrix),
        auc,
        log_loss,
        confusion_matrix,
        coefficients: model.coefficient_map().into_iter().collect(),
        intercept: model.intercept,
        iterations: model.iterations,
        converged: model.converged,
        n_train: split.train.len(),
        n_test: split.test.len(),
        bundle_id: None,
        roc_curve: roc_curve(&y_test, &proba),
    };
    info!(accuracy = report.classification_report.accuracy, ?auc, log_loss, "model evaluated");

    Ok((model, scaler, report))
}

/// Full training stage: load, encode, fit, evaluate, persist.
pub fn train(config: &TrainConfig, artifacts: &ArtifactConfig) -> Result<(ArtifactBundle, TrainingReport)> {
    info!("Loading training data from: {}", config.data_path.display());
    let frame = Frame::read_csv(&config.data_path)?;
    let set = TrainingSet::from_frame(&frame, &config.categorical_columns, &config.response_column)?;

    let (model, scaler, mut report) =
        train_evaluate(&set.features, &set.labels, &set.feature_names, &EvaluationParams::from(config))?;

    let bundle = ArtifactBundle::new(model, set.encoder, scaler, set.numeric_columns)?;
    bundle.save(&artifacts.paths())?;
    report.bundle_id = Some(bundle.bundle_id().to_string());
    report.write_yaml(&artifacts.report_path)?;

    if let Some(path) = &artifacts.confusion_matrix_path {
        plots::confusion_matrix_svg(&report.confusion_matrix, path)?;
    }
    if let Some(path) = &artifacts.roc_path {
        plots::roc_curve_svg(&report.roc_curve, report.auc, path)?;
    }

    Ok((bundle, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        let columns = ["owner", "ticker", "trans_price", "response"];
        let rows = [
            ["self", "AAPL", "120.5", "1"],
            ["joint", "MSFT", "230.0", "0"],
            ["self", "MSFT", "210.25", "1"],
            ["joint", "AAPL", "130.0", "0"],
        ];
        Frame::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn training_set_layout_is_one_hot_then_numeric() {
        let set = TrainingSet::from_frame(&frame(), &["owner".into(), "ticker".into()], "response").unwrap();
        assert_eq!(
            set.feature_names,
            vec!["owner_joint", "owner_self", "ticker_AAPL", "ticker_MSFT", "trans_price"]
        );
        assert_eq!(set.numeric_columns, vec!["trans_price"]);
        assert_eq!(set.labels, vec![1, 0, 1, 0]);
        assert_eq!(set.features.row(0).to_vec(), vec![0.0, 1.0, 1.0, 0.0, 120.5]);
    }

    #[test]
    fn colliding_readable_names_keep_every_coefficient() {
        let columns = ["representative", "trans_price", "response"];
        let rows = [
            ["Hon. Jane Doe", "120.0", "1"],
            ["Mr. Jane Doe", "130.0", "0"],
            ["Hon. Jane Doe", "125.0", "0"],
            ["Mr. Jane Doe", "110.0", "1"],
        ];
        let frame = Frame::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
                .collect(),
        )
        .unwrap();
        let set = TrainingSet::from_frame(&frame, &["representative".into()], "response").unwrap();
        assert_eq!(set.feature_names, vec!["Jane_Doe", "Jane_Doe_2", "trans_price"]);

        let params = EvaluationParams {
            test_fraction: 0.5,
            seed: 2,
            max_iter: 15,
            c: 1.0,
            tol: 1e-4,
        };
        let (model, _, report) = train_evaluate(&set.features, &set.labels, &set.feature_names, &params).unwrap();
        assert_eq!(report.coefficients.len(), model.coefficients.len());
    }

    #[test]
    fn bad_label_is_a_parse_error() {
        let mut rows: Vec<Vec<Option<String>>> = frame().rows().to_vec();
        rows[2][3] = Some("yes".into());
        let bad = Frame::new(frame().columns().to_vec(), rows).unwrap();
        assert!(matches!(
            TrainingSet::from_frame(&bad, &["owner".into()], "response"),
            Err(TrainerError::Parse { .. })
        ));
    }

    #[test]
    fn unknown_categorical_column_is_missing() {
        assert!(matches!(
            TrainingSet::from_frame(&frame(), &["party".into()], "response"),
            Err(TrainerError::MissingColumn(_))
        ));
    }
}
