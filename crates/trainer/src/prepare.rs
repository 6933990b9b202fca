//! Cleaning steps between the raw tables and the model
//!
//! Every step takes a frame and returns a new one; nothing is edited in
//! place, so each stage can be logged and tested on its own.

use crate::errors::{Result, TrainerError};
use crate::frame::{Frame, Row};
use std::collections::{HashMap, HashSet};
use stockwatch_core::types::{parse_date, DATE_FORMAT};
use stockwatch_core::{
    AmountBucket, JoinedRecord, Owner, PricePoint, TransactionRecord, TransactionType,
};
use tracing::{info, warn};

/// Columns the transaction table must provide.
pub const TRANSACTION_COLUMNS: [&str; 6] = [
    "representative",
    "ticker",
    "transaction_date",
    "type",
    "amount",
    "owner",
];

/// Columns of a cleaned, joined frame before any are dropped.
pub const JOINED_COLUMNS: [&str; 10] = [
    "representative",
    "ticker",
    "transaction_date",
    "type",
    "amount",
    "owner",
    "trans_price",
    "current_date",
    "current_price",
    "response",
];

/// Drop the named columns; naming an absent column is an error.
pub fn filter_columns<S: AsRef<str>>(frame: &Frame, columns_to_drop: &[S]) -> Result<Frame> {
    let mut drop = HashSet::new();
    for name in columns_to_drop {
        drop.insert(frame.column_index(name.as_ref())?);
    }

    let keep: Vec<usize> = (0..frame.columns().len()).filter(|i| !drop.contains(i)).collect();
    let columns = keep.iter().map(|&i| frame.columns()[i].clone()).collect();
    let rows = frame
        .rows()
        .iter()
        .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Frame::new(columns, rows)
}

/// Remove exact duplicate rows, keeping first occurrences.
///
/// Returns the deduplicated frame and how many rows were removed.
pub fn deduplicate(frame: &Frame) -> (Frame, usize) {
    let mut seen: HashSet<&Row> = HashSet::with_capacity(frame.len());
    let deduped = frame.filter_rows(|row| seen.insert(row));
    let removed = frame.len() - deduped.len();
    info!(removed, remaining = deduped.len(), "duplicate rows removed");
    (deduped, removed)
}

/// Replace missing and `sentinel` cells of `column` with `replacement`.
pub fn impute_missing(frame: &Frame, column: &str, replacement: &str, sentinel: &str) -> Result<Frame> {
    let idx = frame.column_index(column)?;
    let mut imputed = 0usize;
    let rows = frame
        .rows()
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if row[idx].as_deref().map_or(true, |v| v == sentinel) {
                row[idx] = Some(replacement.to_string());
                imputed += 1;
            }
            row
        })
        .collect();
    info!(column, imputed, "missing values imputed");
    Frame::new(frame.columns().to_vec(), rows)
}

/// The `n` most frequent non-missing values of `column`.
///
/// Ties in frequency are broken by value, ascending.
pub fn top_values(frame: &Frame, column: &str, n: usize) -> Result<Vec<String>> {
    let idx = frame.column_index(column)?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in frame.rows() {
        if let Some(value) = row[idx].as_deref() {
            *counts.entry(value).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    Ok(ranked.into_iter().take(n).map(|(v, _)| v.to_string()).collect())
}

/// Parameters of [`select_frequent`]
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub top_representatives: usize,
    pub exclude_representatives: &'a [String],
    pub include_representatives: &'a [String],
    pub top_tickers: usize,
    pub exclude_tickers: &'a [String],
}

/// Keep rows from the most active representatives and most traded tickers.
///
/// Both lists are ranked on the input frame, then adjusted by the
/// exclusion and inclusion lists, then applied together.
pub fn select_frequent(frame: &Frame, selection: &Selection<'_>) -> Result<Frame> {
    let mut names = top_values(frame, "representative", selection.top_representatives)?;
    names.retain(|n| !selection.exclude_representatives.contains(n));
    for name in selection.include_representatives {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    let mut tickers = top_values(frame, "ticker", selection.top_tickers)?;
    tickers.retain(|t| !selection.exclude_tickers.contains(t));

    let rep_idx = frame.column_index("representative")?;
    let ticker_idx = frame.column_index("ticker")?;
    let names: HashSet<String> = names.into_iter().collect();
    let tickers: HashSet<String> = tickers.into_iter().collect();

    let selected = frame.filter_rows(|row| {
        let rep_ok = row[rep_idx].as_ref().is_some_and(|r| names.contains(r));
        let ticker_ok = row[ticker_idx].as_ref().is_some_and(|t| tickers.contains(t));
        rep_ok && ticker_ok
    });
    info!(
        representatives = names.len(),
        tickers = tickers.len(),
        rows_in = frame.len(),
        rows_out = selected.len(),
        "frequent representatives and tickers selected"
    );
    Ok(selected)
}

/// Type the raw transaction rows.
///
/// Rows whose transaction type, amount range or owner fall outside the
/// known vocabularies are skipped and counted. A missing required cell or
/// an unparseable date is an error.
pub fn typed_records(frame: &Frame) -> Result<Vec<TransactionRecord>> {
    let idx: Vec<usize> = TRANSACTION_COLUMNS
        .iter()
        .map(|c| frame.column_index(c))
        .collect::<Result<_>>()?;

    let mut records = Vec::with_capacity(frame.len());
    let mut skipped = 0usize;
    for row in 0..frame.len() {
        let representative = frame.required(row, idx[0])?;
        let ticker = frame.required(row, idx[1])?;
        let date = frame.required(row, idx[2])?;
        let transaction_date = parse_date(date).map_err(|e| parse_error(frame, row, idx[2], e))?;

        let (Ok(transaction_type), Ok(amount), Ok(owner)) = (
            frame.required(row, idx[3])?.parse::<TransactionType>(),
            frame.required(row, idx[4])?.parse::<AmountBucket>(),
            frame.required(row, idx[5])?.parse::<Owner>(),
        ) else {
            skipped += 1;
            continue;
        };

        records.push(TransactionRecord {
            representative: representative.to_string(),
            ticker: ticker.to_string(),
            transaction_date,
            transaction_type,
            amount,
            owner,
        });
    }

    if skipped > 0 {
        warn!(skipped, "transactions with unknown type, amount or owner skipped");
    }
    info!(records = records.len(), "transactions typed");
    Ok(records)
}

/// Type a `ticker, date, price` table; empty or `NaN` prices become `None`.
pub fn price_points(frame: &Frame) -> Result<Vec<PricePoint>> {
    let ticker_idx = frame.column_index("ticker")?;
    let date_idx = frame.column_index("date")?;
    let price_idx = frame.column_index("price")?;

    let mut points = Vec::with_capacity(frame.len());
    for row in 0..frame.len() {
        let ticker = frame.required(row, ticker_idx)?.to_string();
        let date = parse_date(frame.required(row, date_idx)?)
            .map_err(|e| parse_error(frame, row, date_idx, e))?;
        let price = match frame.cell(row, price_idx) {
            None => None,
            Some(raw) => {
                let value: f64 = raw.trim().parse().map_err(|e: std::num::ParseFloatError| {
                    parse_error(frame, row, price_idx, e)
                })?;
                (!value.is_nan()).then_some(value)
            }
        };
        points.push(PricePoint { ticker, date, price });
    }
    Ok(points)
}

/// Lay joined records out as a frame with [`JOINED_COLUMNS`].
pub fn joined_frame(records: &[JoinedRecord]) -> Result<Frame> {
    let rows = records
        .iter()
        .map(|r| {
            vec![
                Some(r.record.representative.clone()),
                Some(r.record.ticker.clone()),
                Some(r.record.transaction_date.format(DATE_FORMAT).to_string()),
                Some(r.record.transaction_type.to_string()),
                Some(r.record.amount.to_string()),
                Some(r.record.owner.to_string()),
                Some(r.trans_price.to_string()),
                Some(r.current_date.format(DATE_FORMAT).to_string()),
                Some(r.current_price.to_string()),
                Some(r.response.to_string()),
            ]
        })
        .collect();
    Frame::new(JOINED_COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
}

fn parse_error(frame: &Frame, row: usize, column: usize, err: impl std::fmt::Display) -> TrainerError {
    TrainerError::Parse {
        column: frame.columns()[column].clone(),
        row,
        message: err.to_string(),
    }
}
