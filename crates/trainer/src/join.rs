//! Price join engine
//!
//! Attaches the transaction-day price and the current price to each
//! disclosed trade and derives the outcome label. Both joins are inner
//! joins with merge semantics: a trade without a matching price disappears,
//! a trade with several matching price rows is repeated once per match, in
//! price-table order, and the order of the trades themselves is preserved.

use crate::errors::Result;
use crate::frame::Frame;
use crate::prepare::price_points;
use chrono::{Datelike, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use stockwatch_core::{JoinedRecord, PricePoint, PricedTransaction, TransactionRecord};
use tracing::{info, warn};

/// The current-price snapshot quoted on 2022-04-06 belongs to 2022-04-07.
fn corrected_current_date(date: NaiveDate) -> NaiveDate {
    match (date.year(), date.month(), date.day()) {
        (2022, 4, 6) => date.succ_opt().unwrap_or(date),
        _ => date,
    }
}

/// Load a `ticker, date, price` CSV.
pub fn load_price_table<P: AsRef<Path>>(path: P) -> Result<Vec<PricePoint>> {
    let path = path.as_ref();
    let points = price_points(&Frame::read_csv(path)?)?;
    info!(path = %path.display(), rows = points.len(), "price table loaded");
    Ok(points)
}

/// Distinct price rows that carry a price, first occurrences in table order.
pub fn usable_prices(table: &[PricePoint]) -> Vec<(String, NaiveDate, f64)> {
    let mut seen = HashSet::new();
    table
        .iter()
        .filter_map(|p| p.price.map(|price| (p.ticker.clone(), p.date, price)))
        .filter(|(ticker, date, price)| seen.insert((ticker.clone(), *date, price.to_bits())))
        .collect()
}

/// Attach the price quoted for the trade's ticker on the trade date.
pub fn join_transaction_price(
    transactions: &[TransactionRecord],
    price_table: &[PricePoint],
) -> Vec<PricedTransaction> {
    let prices = usable_prices(price_table);
    let mut by_key: HashMap<(&str, NaiveDate), Vec<f64>> = HashMap::new();
    for (ticker, date, price) in &prices {
        by_key.entry((ticker.as_str(), *date)).or_default().push(*price);
    }

    let joined: Vec<PricedTransaction> = transactions
        .iter()
        .flat_map(|record| {
            by_key
                .get(&(record.ticker.as_str(), record.transaction_date))
                .into_iter()
                .flatten()
                .map(move |&trans_price| PricedTransaction {
                    record: record.clone(),
                    trans_price,
                })
        })
        .collect();

    log_join("transaction price", transactions.len(), joined.len());
    joined
}

/// Attach every current price quoted for the trade's ticker.
///
/// The join key is the ticker alone; the snapshot date travels along as
/// `current_date`. The one-day date correction is applied after the table
/// is deduplicated.
pub fn join_current_price(
    priced: Vec<PricedTransaction>,
    current_table: &[PricePoint],
) -> Vec<JoinedRecord> {
    let prices = usable_prices(current_table);

    let mut by_ticker: HashMap<&str, Vec<(NaiveDate, f64)>> = HashMap::new();
    for (ticker, date, price) in &prices {
        by_ticker
            .entry(ticker.as_str())
            .or_default()
            .push((corrected_current_date(*date), *price));
    }

    let rows_in = priced.len();
    let joined: Vec<JoinedRecord> = priced
        .into_iter()
        .flat_map(|p| {
            let matches = by_ticker.get(p.record.ticker.as_str()).cloned().unwrap_or_default();
            matches.into_iter().map(move |(current_date, current_price)| JoinedRecord {
                record: p.record.clone(),
                trans_price: p.trans_price,
                current_date,
                current_price,
                response: compute_response(p.trans_price, current_price),
            })
        })
        .collect();

    log_join("current price", rows_in, joined.len());
    joined
}

/// 1 when the position gained value, strictly.
pub fn compute_response(trans_price: f64, current_price: f64) -> u8 {
    u8::from(current_price > trans_price)
}

fn log_join(stage: &str, rows_in: usize, rows_out: usize) {
    if rows_out == 0 {
        warn!(stage, rows_in, "join produced no rows");
    } else {
        info!(stage, rows_in, rows_out, "join complete");
    }
}
