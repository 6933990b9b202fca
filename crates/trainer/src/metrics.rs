//! Held-out evaluation metrics for the binary classifier

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Confusion matrix for binary classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t == 1, p == 1) {
                (true, true) => cm.tp += 1,
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }
}

/// Precision, recall, F1 and support for one class or one average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class and averaged scores, keyed like the usual text report
///
/// Undefined ratios (no predicted or no actual members of a class) are
/// reported as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    #[serde(rename = "0")]
    pub negative: ClassMetrics,
    #[serde(rename = "1")]
    pub positive: ClassMetrics,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassMetrics,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let positive = class_metrics(cm.tp, cm.fp, cm.fn_);
        let negative = class_metrics(cm.tn, cm.fn_, cm.fp);
        let total = cm.total();

        let macro_avg = ClassMetrics {
            precision: (positive.precision + negative.precision) / 2.0,
            recall: (positive.recall + negative.recall) / 2.0,
            f1_score: (positive.f1_score + negative.f1_score) / 2.0,
            support: total,
        };
        let weight = |neg: f64, pos: f64| {
            ratio(
                neg * negative.support as f64 + pos * positive.support as f64,
                total as f64,
            )
        };
        let weighted_avg = ClassMetrics {
            precision: weight(negative.precision, positive.precision),
            recall: weight(negative.recall, positive.recall),
            f1_score: weight(negative.f1_score, positive.f1_score),
            support: total,
        };

        Self {
            negative,
            positive,
            accuracy: ratio((cm.tp + cm.tn) as f64, total as f64),
            macro_avg,
            weighted_avg,
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Scores for one class from its true positives, false positives and
/// false negatives.
fn class_metrics(tp: usize, fp: usize, fn_: usize) -> ClassMetrics {
    let precision = ratio(tp as f64, (tp + fp) as f64);
    let recall = ratio(tp as f64, (tp + fn_) as f64);
    ClassMetrics {
        precision,
        recall,
        f1_score: ratio(2.0 * precision * recall, precision + recall),
        support: tp + fn_,
    }
}

/// Area under the ROC curve from positive-class scores.
///
/// Uses the rank-sum form with average ranks for tied scores. `None` when
/// the labels contain a single class.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Option<f64> {
    let n_pos = y_true.iter().filter(|&&y| y == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; tied block i..=j shares the mean rank.
        let mean_rank = (i + j) as f64 / 2.0 + 1.0;
        rank_sum_pos += mean_rank * order[i..=j].iter().filter(|&&k| y_true[k] == 1).count() as f64;
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    let u = rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0;
    Some(u / (n_pos * n_neg as f64))
}

/// Mean binary cross-entropy with probabilities clipped to `[eps, 1 - eps]`.
pub fn log_loss(y_true: &[u8], probabilities: &[f64]) -> f64 {
    const EPS: f64 = 1e-15;
    if y_true.is_empty() {
        return 0.0;
    }
    let total: f64 = y_true
        .iter()
        .zip(probabilities)
        .map(|(&y, &p)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            if y == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    total / y_true.len() as f64
}

/// One point of the ROC curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
}

/// ROC curve over every distinct score threshold, from `(0, 0)` to `(1, 1)`.
pub fn roc_curve(y_true: &[u8], scores: &[f64]) -> Vec<RocPoint> {
    let n_pos = y_true.iter().filter(|&&y| y == 1).count() as f64;
    let n_neg = y_true.len() as f64 - n_pos;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let mut points = vec![RocPoint { fpr: 0.0, tpr: 0.0 }];
    let (mut tp, mut fp) = (0.0, 0.0);
    for (pos, &k) in order.iter().enumerate() {
        if y_true[k] == 1 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_threshold = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[k]);
        if last_of_threshold {
            points.push(RocPoint {
                fpr: ratio(fp, n_neg),
                tpr: ratio(tp, n_pos),
            });
        }
    }
    points
}
