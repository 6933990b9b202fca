//! One-hot encoding with a vocabulary frozen at fit time

use crate::errors::{CoreError, Result};
use crate::labels;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder over an ordered list of categorical columns.
///
/// Categories are kept sorted per column, so the output layout only depends
/// on the set of values seen during `fit`, never on row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    /// Fit on `rows`, where each row holds one value per entry of `columns`.
    pub fn fit<R, S>(columns: &[String], rows: &[R]) -> Result<Self>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        if columns.is_empty() {
            return Err(CoreError::Config("no categorical columns to encode".into()));
        }

        let mut seen: Vec<BTreeSet<String>> = vec![BTreeSet::new(); columns.len()];
        for row in rows {
            let row = row.as_ref();
            if row.len() != columns.len() {
                return Err(CoreError::DimensionMismatch {
                    expected: columns.len(),
                    got: row.len(),
                });
            }
            for (set, value) in seen.iter_mut().zip(row) {
                set.insert(value.as_ref().to_string());
            }
        }

        Ok(Self {
            columns: columns.to_vec(),
            categories: seen.into_iter().map(|s| s.into_iter().collect()).collect(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Number of output indicator columns.
    pub fn width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Raw output names, `column_category`.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(column, cats)| cats.iter().map(move |c| format!("{column}_{c}")))
            .collect()
    }

    /// Output names after label normalization, for reports and artifacts.
    pub fn readable_feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(column, cats)| cats.iter().map(move |c| labels::feature_name(column, c)))
            .collect()
    }

    /// Encode one row of values given in fit-time column order.
    pub fn transform_row<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<f64>> {
        if values.len() != self.columns.len() {
            return Err(CoreError::DimensionMismatch {
                expected: self.columns.len(),
                got: values.len(),
            });
        }

        let mut out = vec![0.0; self.width()];
        let mut offset = 0;
        for ((column, cats), value) in self.columns.iter().zip(&self.categories).zip(values) {
            let value = value.as_ref();
            let idx = cats
                .binary_search_by(|c| c.as_str().cmp(value))
                .map_err(|_| CoreError::UnseenCategory {
                    column: column.clone(),
                    value: value.to_string(),
                })?;
            out[offset + idx] = 1.0;
            offset += cats.len();
        }
        Ok(out)
    }

    /// Encode `(column, value)` pairs, checking the columns match fit order.
    pub fn transform_named(&self, inputs: &[(&str, &str)]) -> Result<Vec<f64>> {
        let order_matches = inputs.len() == self.columns.len()
            && inputs.iter().zip(&self.columns).all(|((c, _), expected)| c == expected);
        if !order_matches {
            return Err(CoreError::InputOrderMismatch {
                expected: self.columns.clone(),
                actual: inputs.iter().map(|(c, _)| c.to_string()).collect(),
            });
        }
        let values: Vec<&str> = inputs.iter().map(|(_, v)| *v).collect();
        self.transform_row(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        vec!["owner".into(), "ticker".into()]
    }

    fn fitted() -> OneHotEncoder {
        let rows = vec![
            vec!["self", "MSFT"],
            vec!["joint", "AAPL"],
            vec!["self", "GOOG"],
        ];
        OneHotEncoder::fit(&columns(), &rows).unwrap()
    }

    #[test]
    fn vocabulary_is_sorted_per_column() {
        let enc = fitted();
        assert_eq!(enc.categories()[0], vec!["joint", "self"]);
        assert_eq!(enc.categories()[1], vec!["AAPL", "GOOG", "MSFT"]);
        assert_eq!(enc.width(), 5);
        assert_eq!(
            enc.feature_names(),
            vec!["owner_joint", "owner_self", "ticker_AAPL", "ticker_GOOG", "ticker_MSFT"]
        );
    }

    #[test]
    fn transform_sets_one_indicator_per_column() {
        let enc = fitted();
        let row = enc.transform_row(&["self", "GOOG"]).unwrap();
        assert_eq!(row, vec![0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn unseen_category_is_rejected() {
        let enc = fitted();
        let err = enc.transform_row(&["self", "TSLA"]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnseenCategory { ref column, ref value } if column == "ticker" && value == "TSLA"
        ));
    }

    #[test]
    fn named_inputs_must_follow_fit_order() {
        let enc = fitted();
        assert!(enc.transform_named(&[("owner", "self"), ("ticker", "AAPL")]).is_ok());
        let err = enc
            .transform_named(&[("ticker", "AAPL"), ("owner", "self")])
            .unwrap_err();
        assert!(matches!(err, CoreError::InputOrderMismatch { .. }));
    }
}
