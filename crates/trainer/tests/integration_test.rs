//! Integration tests for the offline pipeline
//!
//! Cleaning from raw CSVs, reproducible training, and scoring with the
//! bundle written by a training run.

use anyhow::Result;
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, Axis};
use proptest::prelude::*;
use std::io::Write;
use std::path::Path;
use stockwatch_core::config::{ArtifactConfig, CleanConfig, TrainConfig};
use stockwatch_core::{
    predict, ArtifactBundle, Owner, PricePoint, PricedTransaction, Predictor, TransactionQuery, TransactionRecord,
    TransactionType,
};
use stockwatch_trainer::{
    clean, deduplicate, join_current_price, join_transaction_price, train, train_evaluate, train_test_split,
    usable_prices, EvaluationParams, Frame, TrainerError, TrainingSet,
};
use tempfile::TempDir;

fn write_file(path: &Path, lines: &[String]) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    Ok(())
}

/// Ten disclosed trades with three owners, tickers, types, amount buckets and representatives.
fn ten_trade_frame() -> Result<Frame> {
    let rows = [
        ["dependent", "AAPL", "purchase", "$1,001 - $15,000", "Hon. Alan S. Lowenthal", "150", "0"],
        ["dependent", "GOOG", "sale_full", "$50,001 - $100,000", "Hon. Alan S. Lowenthal", "165", "1"],
        ["self", "MSFT", "sale_full", "$1,001 -", "Hon. Rohit Khanna", "145", "1"],
        ["undisclosed", "GOOG", "sale_partial", "$1,001 - $15,000", "Hon. Kurt Schrader", "155", "1"],
        ["dependent", "GOOG", "purchase", "$1,001 - $15,000", "Hon. Rohit Khanna", "170", "0"],
        ["dependent", "MSFT", "purchase", "$50,001 - $100,000", "Hon. Rohit Khanna", "110", "0"],
        ["self", "AAPL", "sale_partial", "$1,001 -", "Hon. Alan S. Lowenthal", "152", "1"],
        ["undisclosed", "AAPL", "sale_full", "$1,001 - $15,000", "Hon. Kurt Schrader", "134", "1"],
        ["dependent", "GOOG", "purchase", "$1,001 -", "Hon. Alan S. Lowenthal", "170", "0"],
        ["self", "MSFT", "sale_full", "$1,001 - $15,000", "Hon. Kurt Schrader", "110", "1"],
    ];
    let columns = ["owner", "ticker", "type", "amount", "representative", "trans_price", "response"];
    Ok(Frame::new(
        columns.iter().map(|c| c.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|cell| Some(cell.to_string())).collect())
            .collect(),
    )?)
}

fn ten_trade_set() -> Result<TrainingSet> {
    let categorical: Vec<String> = ["owner", "ticker", "type", "amount", "representative"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    Ok(TrainingSet::from_frame(&ten_trade_frame()?, &categorical, "response")?)
}

fn small_params() -> EvaluationParams {
    EvaluationParams {
        test_fraction: 0.5,
        seed: 2,
        max_iter: 15,
        c: 1.0,
        tol: 1e-4,
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Population mean and deviation per column; constant columns keep unit scale.
fn column_moments(x: &Array2<f64>) -> (Vec<f64>, Vec<f64>) {
    let n = x.nrows() as f64;
    let mut means = Vec::new();
    let mut scales = Vec::new();
    for column in x.columns() {
        let mean = column.sum() / n;
        let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        means.push(mean);
        scales.push(if var < 1e-12 { 1.0 } else { var.sqrt() });
    }
    (means, scales)
}

fn standardize(x: &Array2<f64>, means: &[f64], scales: &[f64]) -> Array2<f64> {
    let mut out = x.clone();
    for mut row in out.rows_mut() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = (*v - means[j]) / scales[j];
        }
    }
    out
}

#[test]
fn test_train_evaluate_reaches_the_penalized_optimum() -> Result<()> {
    let set = ten_trade_set()?;
    assert_eq!(set.features.dim(), (10, 16));
    assert_eq!(set.feature_names.len(), 16);

    let params = small_params();
    let (model, scaler, report) = train_evaluate(&set.features, &set.labels, &set.feature_names, &params)?;

    let split = train_test_split(10, 0.5, 2)?;
    assert_eq!((split.train.len(), split.test.len()), (5, 5));
    assert_eq!((report.n_train, report.n_test), (5, 5));

    let x_train = set.features.select(Axis(0), &split.train);
    let y_train: Vec<f64> = split.train.iter().map(|&i| f64::from(set.labels[i])).collect();
    let (means, scales) = column_moments(&x_train);
    for j in 0..16 {
        assert!((scaler.mean()[j] - means[j]).abs() < 1e-9, "mean of column {j}");
        assert!((scaler.scale()[j] - scales[j]).abs() < 1e-9, "scale of column {j}");
    }

    // At the optimum of C * sum(logloss) + |w|^2 / 2 the gradient vanishes,
    // with the intercept left out of the penalty.
    assert!(model.converged);
    assert!(model.iterations <= params.max_iter);
    let z_train = standardize(&x_train, &means, &scales);
    let residuals: Vec<f64> = z_train
        .rows()
        .into_iter()
        .zip(&y_train)
        .map(|(row, y)| sigmoid(row.dot(&ArrayView1::from(&model.coefficients[..])) + model.intercept) - y)
        .collect();
    let mut worst = residuals.iter().sum::<f64>().abs() * params.c;
    for (j, w) in model.coefficients.iter().enumerate() {
        let data_term: f64 = z_train.column(j).iter().zip(&residuals).map(|(x, r)| x * r).sum();
        worst = worst.max((params.c * data_term + w).abs());
    }
    assert!(worst <= params.tol + 1e-8, "gradient {worst} above tolerance");

    // Evaluation recomputed from the held-out rows.
    let x_test = standardize(&set.features.select(Axis(0), &split.test), &means, &scales);
    let y_test: Vec<u8> = split.test.iter().map(|&i| set.labels[i]).collect();
    let proba: Vec<f64> = x_test
        .rows()
        .into_iter()
        .map(|row| sigmoid(row.dot(&ArrayView1::from(&model.coefficients[..])) + model.intercept))
        .collect();

    let positives: Vec<f64> = y_test.iter().zip(&proba).filter(|(y, _)| **y == 1).map(|(_, p)| *p).collect();
    let negatives: Vec<f64> = y_test.iter().zip(&proba).filter(|(y, _)| **y == 0).map(|(_, p)| *p).collect();
    let mut wins = 0.0;
    for p in &positives {
        for q in &negatives {
            wins += if p > q { 1.0 } else if p == q { 0.5 } else { 0.0 };
        }
    }
    let auc = wins / (positives.len() * negatives.len()) as f64;
    let reported_auc = report.auc.expect("both classes in the test split");
    assert!((reported_auc - auc).abs() < 1e-12);
    assert!((reported_auc - 5.0 / 6.0).abs() < 1e-4, "auc {reported_auc}");

    let eps = 1e-15;
    let log_loss = y_test
        .iter()
        .zip(&proba)
        .map(|(&y, &p)| {
            let p = p.clamp(eps, 1.0 - eps);
            if y == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum::<f64>()
        / y_test.len() as f64;
    assert!((report.log_loss - log_loss).abs() < 1e-12);

    let (mut tn, mut fp, mut fn_, mut tp) = (0, 0, 0, 0);
    for (&y, &p) in y_test.iter().zip(&proba) {
        match (y, p > 0.5) {
            (0, false) => tn += 1,
            (0, true) => fp += 1,
            (_, false) => fn_ += 1,
            (_, true) => tp += 1,
        }
    }
    let cm = &report.confusion_matrix;
    assert_eq!((cm.tn, cm.fp, cm.fn_, cm.tp), (tn, fp, fn_, tp));
    let classes = &report.classification_report;
    assert_eq!(classes.accuracy, (tn + tp) as f64 / 5.0);
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    assert_eq!(classes.positive.precision, ratio(tp, tp + fp));
    assert_eq!(classes.positive.recall, ratio(tp, tp + fn_));
    assert_eq!(classes.negative.precision, ratio(tn, tn + fn_));
    assert_eq!(classes.negative.recall, ratio(tn, tn + fp));
    assert_eq!(classes.positive.support + classes.negative.support, 5);

    assert_eq!(report.coefficients.len(), 16);
    for (name, w) in set.feature_names.iter().zip(&model.coefficients) {
        assert_eq!(report.coefficients.get(name), Some(w));
    }
    Ok(())
}

#[test]
fn test_train_evaluate_is_deterministic() -> Result<()> {
    let set = ten_trade_set()?;
    let (model1, scaler1, report1) = train_evaluate(&set.features, &set.labels, &set.feature_names, &small_params())?;
    let (model2, scaler2, report2) = train_evaluate(&set.features, &set.labels, &set.feature_names, &small_params())?;

    assert_eq!(model1, model2, "Models should be identical");
    assert_eq!(scaler1, scaler2, "Scalers should be identical");
    assert_eq!(report1, report2, "Reports should be identical");
    Ok(())
}

/// Raw inputs for twelve trades in two tickers, priced around the current quote.
fn write_raw_inputs(dir: &Path) -> Result<CleanConfig> {
    let mut transactions = vec![",representative,ticker,transaction_date,type,amount,owner,district".to_string()];
    let mut trans_prices = vec!["ticker,date,price".to_string()];
    for i in 0..12u32 {
        let ticker = if i % 2 == 0 { "AAPL" } else { "MSFT" };
        let base = if ticker == "AAPL" { 140.0 } else { 240.0 };
        let rep = if i % 3 == 0 { "Hon. Alan S. Lowenthal" } else { "Hon. Nancy Pelosi" };
        let kind = if i % 4 < 2 { "purchase" } else { "sale_full" };
        let owner = ["self", "joint", "--"][i as usize % 3];
        let date = format!("2021-01-{:02}", i + 4);
        transactions.push(format!(
            "{i},{rep},{ticker},{date},{kind},\"$1,001 - $15,000\",{owner},CA{i}"
        ));
        trans_prices.push(format!("{ticker},{date},{}", base + 2.0 * f64::from(i)));
    }
    // Duplicated quote and a missing quote.
    trans_prices.push("AAPL,2021-01-04,140".into());
    trans_prices.push("MSFT,2021-01-04,".into());
    let current_prices = vec![
        "ticker,date,price".to_string(),
        "AAPL,2022-04-06,150".to_string(),
        "MSFT,2022-04-06,250".to_string(),
    ];

    let config = CleanConfig {
        transactions_path: dir.join("all_transactions.csv"),
        transaction_prices_path: dir.join("transaction_prices.csv"),
        current_prices_path: dir.join("current_prices.csv"),
        output_path: dir.join("clean/transactions.csv"),
        ..CleanConfig::default()
    };
    write_file(&config.transactions_path, &transactions)?;
    write_file(&config.transaction_prices_path, &trans_prices)?;
    write_file(&config.current_prices_path, &current_prices)?;
    Ok(config)
}

#[test]
fn test_clean_train_predict_end_to_end() -> Result<()> {
    let dir = TempDir::new()?;
    let clean_config = write_raw_inputs(dir.path())?;

    let frame = clean(&clean_config)?;
    assert_eq!(frame.len(), 12);
    assert_eq!(
        frame.columns(),
        &["representative", "ticker", "type", "amount", "owner", "trans_price", "response"]
    );
    let owner = frame.column_index("owner")?;
    assert!(frame.rows().iter().any(|r| r[owner].as_deref() == Some("undisclosed")));

    let train_config = TrainConfig {
        data_path: clean_config.output_path.clone(),
        ..TrainConfig::default()
    };
    let artifacts = ArtifactConfig {
        model_path: dir.path().join("models/model.json"),
        encoder_path: dir.path().join("models/encoder.json"),
        scaler_path: dir.path().join("models/scaler.json"),
        report_path: dir.path().join("models/results.yaml"),
        confusion_matrix_path: None,
        roc_path: None,
    };
    let (bundle, report) = train(&train_config, &artifacts)?;
    assert_eq!(report.n_test, 3);
    assert_eq!(report.bundle_id.as_deref(), Some(bundle.bundle_id()));
    assert!(artifacts.report_path.exists());

    let loaded = ArtifactBundle::load(&artifacts.paths())?;
    assert_eq!(loaded.bundle_id(), bundle.bundle_id());

    let predictor = Predictor::new(loaded)?;
    let query = TransactionQuery {
        owner: "self".into(),
        ticker: "AAPL".into(),
        transaction_type: "purchase".into(),
        amount: "$1,001 - $15,000".into(),
        representative: "Hon. Nancy Pelosi".into(),
        trans_price: 145.0,
    };
    let probability = predictor.predict(&query)?;
    let expected = predict(
        bundle.model(),
        bundle.encoder(),
        bundle.scaler(),
        &query.categorical_inputs(),
        query.trans_price,
    )?;
    assert_eq!(probability, expected);
    assert!((0.0..=1.0).contains(&probability));
    Ok(())
}

#[test]
fn test_clean_fails_fast_on_missing_input() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = write_raw_inputs(dir.path())?;
    config.current_prices_path = dir.path().join("missing.csv");

    let err = clean(&config).unwrap_err();
    assert!(matches!(err, TrainerError::InputNotFound { .. }));
    assert!(!config.output_path.exists());
    Ok(())
}

fn frame_strategy() -> impl Strategy<Value = Frame> {
    let cell = prop_oneof![Just(None), "[ab]".prop_map(Some)];
    prop::collection::vec(prop::collection::vec(cell, 3), 0..20).prop_map(|rows| {
        Frame::new(vec!["x".into(), "y".into(), "z".into()], rows).expect("rows are three wide")
    })
}

fn price_strategy() -> impl Strategy<Value = Vec<PricePoint>> {
    let point = (
        prop::sample::select(vec!["AAPL", "MSFT"]),
        1u32..4,
        prop::option::of(prop::sample::select(vec![10.0, 10.5, 11.0])),
    )
        .prop_map(|(ticker, day, price)| PricePoint {
            ticker: ticker.to_string(),
            date: NaiveDate::from_ymd_opt(2021, 5, day).expect("valid day"),
            price,
        });
    prop::collection::vec(point, 0..12)
}

fn snapshot_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 4, 6).expect("valid day")
}

fn current_strategy() -> impl Strategy<Value = Vec<PricePoint>> {
    let point = (
        prop::sample::select(vec!["AAPL", "MSFT", "GOOG"]),
        prop::sample::select(vec![5u32, 6, 7]),
        prop::option::of(prop::sample::select(vec![9.0, 10.5, 12.0])),
    )
        .prop_map(|(ticker, day, price)| PricePoint {
            ticker: ticker.to_string(),
            date: NaiveDate::from_ymd_opt(2022, 4, day).expect("valid day"),
            price,
        });
    prop::collection::vec(point, 0..10)
}

fn trade(ticker: &str, day: u32) -> TransactionRecord {
    TransactionRecord {
        representative: "Hon. Nancy Pelosi".into(),
        ticker: ticker.into(),
        transaction_date: NaiveDate::from_ymd_opt(2021, 5, day).expect("valid day"),
        transaction_type: TransactionType::Purchase,
        amount: "$15,001 - $50,000".parse().expect("known bucket"),
        owner: Owner::Joint,
    }
}

proptest! {
    #[test]
    fn dedup_is_idempotent(frame in frame_strategy()) {
        let (once, _) = deduplicate(&frame);
        let (twice, removed) = deduplicate(&once);
        prop_assert_eq!(removed, 0);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn joined_prices_come_from_the_price_table(prices in price_strategy(), days in prop::collection::vec(1u32..4, 0..8)) {
        let trades: Vec<TransactionRecord> = days
            .iter()
            .enumerate()
            .map(|(i, &day)| trade(if i % 2 == 0 { "AAPL" } else { "MSFT" }, day))
            .collect();
        let usable = usable_prices(&prices);
        for priced in join_transaction_price(&trades, &prices) {
            let found = usable.iter().any(|(ticker, date, price)| {
                *ticker == priced.record.ticker
                    && *date == priced.record.transaction_date
                    && *price == priced.trans_price
            });
            prop_assert!(found);
        }
    }

    #[test]
    fn current_prices_come_from_the_current_table(
        current in current_strategy(),
        tickers in prop::collection::vec(prop::sample::select(vec!["AAPL", "MSFT"]), 0..8),
    ) {
        let priced: Vec<PricedTransaction> = tickers
            .iter()
            .map(|ticker| PricedTransaction { record: trade(ticker, 1), trans_price: 10.5 })
            .collect();
        let usable = usable_prices(&current);
        let joined = join_current_price(priced, &current);
        for row in &joined {
            let found = usable.iter().any(|(ticker, date, price)| {
                let shifted = if *date == snapshot_day() { date.succ_opt() } else { Some(*date) };
                *ticker == row.record.ticker && shifted == Some(row.current_date) && *price == row.current_price
            });
            prop_assert!(found);
            prop_assert_ne!(row.current_date, snapshot_day());
        }
        let expected: usize = tickers
            .iter()
            .map(|t| usable.iter().filter(|(ticker, _, _)| ticker == t).count())
            .sum();
        prop_assert_eq!(joined.len(), expected);
    }
}
