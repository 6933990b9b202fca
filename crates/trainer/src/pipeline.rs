//! Cleaning stage: raw tables in, modelling table out

use crate::errors::Result;
use crate::frame::Frame;
use crate::join::{join_current_price, join_transaction_price, load_price_table};
use crate::prepare::{
    deduplicate, filter_columns, impute_missing, joined_frame, select_frequent, typed_records, Selection,
};
use stockwatch_core::config::CleanConfig;
use stockwatch_core::JoinedRecord;
use tracing::info;

/// Select, impute, type and join the raw transactions with both price tables.
///
/// Any missing input file aborts the stage before anything is written.
pub fn joined_records(config: &CleanConfig) -> Result<Vec<JoinedRecord>> {
    info!("Loading transactions from: {}", config.transactions_path.display());
    let raw = Frame::read_csv(&config.transactions_path)?;
    let transaction_prices = load_price_table(&config.transaction_prices_path)?;
    let current_prices = load_price_table(&config.current_prices_path)?;

    let selected = select_frequent(
        &raw,
        &Selection {
            top_representatives: config.top_representatives,
            exclude_representatives: &config.exclude_representatives,
            include_representatives: &config.include_representatives,
            top_tickers: config.top_tickers,
            exclude_tickers: &config.exclude_tickers,
        },
    )?;
    let imputed = impute_missing(
        &selected,
        &config.impute.column,
        &config.impute.replacement,
        &config.impute.sentinel,
    )?;
    let records = typed_records(&imputed)?;

    let priced = join_transaction_price(&records, &transaction_prices);
    Ok(join_current_price(priced, &current_prices))
}

/// Drop the configured columns and duplicate rows from the joined records.
pub fn modelling_frame(records: &[JoinedRecord], columns_to_drop: &[String]) -> Result<Frame> {
    let frame = filter_columns(&joined_frame(records)?, columns_to_drop)?;
    let (frame, _) = deduplicate(&frame);
    Ok(frame)
}

/// Full cleaning stage; writes the cleaned CSV and returns it.
pub fn clean(config: &CleanConfig) -> Result<Frame> {
    let records = joined_records(config)?;
    let frame = modelling_frame(&records, &config.columns_to_drop)?;
    frame.write_csv(&config.output_path)?;
    info!(
        rows = frame.len(),
        columns = frame.columns().len(),
        "Cleaned data written to: {}",
        config.output_path.display()
    );
    Ok(frame)
}
