//! Record types shared by the offline pipeline and the inference path

use crate::errors::{CoreError, Result};
use crate::labels::AMOUNT_CODES;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Date format used by every input table.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Kind of disclosed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    SaleFull,
    SalePartial,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::SaleFull => "sale_full",
            Self::SalePartial => "sale_partial",
        }
    }
}

impl FromStr for TransactionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "purchase" => Ok(Self::Purchase),
            "sale_full" => Ok(Self::SaleFull),
            "sale_partial" => Ok(Self::SalePartial),
            other => Err(CoreError::InvalidRecord(format!(
                "unknown transaction type {other:?}"
            ))),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who held the traded asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    #[serde(rename = "self")]
    Itself,
    Joint,
    Dependent,
    Undisclosed,
}

impl Owner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Itself => "self",
            Self::Joint => "joint",
            Self::Dependent => "dependent",
            Self::Undisclosed => "undisclosed",
        }
    }
}

impl FromStr for Owner {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "self" => Ok(Self::Itself),
            "joint" => Ok(Self::Joint),
            "dependent" => Ok(Self::Dependent),
            "undisclosed" => Ok(Self::Undisclosed),
            other => Err(CoreError::InvalidRecord(format!("unknown owner {other:?}"))),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disclosed dollar range, ordered by the code table in [`crate::labels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AmountBucket(u8);

impl AmountBucket {
    /// Disclosure label, e.g. `"$1,001 - $15,000"`.
    pub fn label(&self) -> &'static str {
        AMOUNT_CODES
            .iter()
            .find(|(_, code)| *code == self.0)
            .map(|(label, _)| *label)
            .unwrap_or_default()
    }

    pub fn code(&self) -> u8 {
        self.0
    }
}

impl FromStr for AmountBucket {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        crate::labels::amount_code(s)
            .map(AmountBucket)
            .ok_or_else(|| CoreError::InvalidRecord(format!("unknown amount range {s:?}")))
    }
}

impl TryFrom<String> for AmountBucket {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AmountBucket> for String {
    fn from(bucket: AmountBucket) -> Self {
        bucket.label().to_string()
    }
}

impl fmt::Display for AmountBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One disclosed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub representative: String,
    pub ticker: String,
    pub transaction_date: NaiveDate,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: AmountBucket,
    pub owner: Owner,
}

/// A single price observation; `price` is `None` when the feed had no quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ticker: String,
    pub date: NaiveDate,
    pub price: Option<f64>,
}

/// Transaction with its transaction-day price attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedTransaction {
    pub record: TransactionRecord,
    pub trans_price: f64,
}

/// Transaction with both prices and the outcome label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedRecord {
    pub record: TransactionRecord,
    pub trans_price: f64,
    pub current_date: NaiveDate,
    pub current_price: f64,
    pub response: u8,
}

/// Raw inputs for scoring one new transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionQuery {
    pub owner: String,
    pub ticker: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub amount: String,
    pub representative: String,
    pub trans_price: f64,
}

impl TransactionQuery {
    /// Categorical inputs as `(column, value)` pairs in training column order.
    pub fn categorical_inputs(&self) -> [(&'static str, &str); 5] {
        [
            ("owner", self.owner.as_str()),
            ("ticker", self.ticker.as_str()),
            ("type", self.transaction_type.as_str()),
            ("amount", self.amount.as_str()),
            ("representative", self.representative.as_str()),
        ]
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| CoreError::InvalidRecord(format!("invalid date {value:?}: {e}")))
}
