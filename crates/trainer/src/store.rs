//! Local store of joined transaction records
//!
//! A `sled` tree of `bincode`-encoded [`JoinedRecord`]s keyed by a
//! monotonically increasing id, so iteration returns records in insertion
//! order. The handle is opened and closed explicitly by its owner.

use crate::errors::{Result, TrainerError};
use std::path::{Path, PathBuf};
use stockwatch_core::JoinedRecord;
use tracing::{debug, info};

const RECORDS_TREE: &str = "joined_records";

/// Open record store
pub struct TransactionStore {
    db: sled::Db,
    records: sled::Tree,
    path: PathBuf,
}

fn store_err(e: impl std::fmt::Display) -> TrainerError {
    TrainerError::Store(e.to_string())
}

impl TransactionStore {
    /// Open (or create) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = sled::open(&path).map_err(store_err)?;
        let records = db.open_tree(RECORDS_TREE).map_err(store_err)?;
        info!(path = %path.display(), records = records.len(), "record store opened");
        Ok(Self { db, records, path })
    }

    /// Append records; returns how many were written.
    pub fn insert_all(&self, records: &[JoinedRecord]) -> Result<usize> {
        for record in records {
            let id = self.db.generate_id().map_err(store_err)?;
            let data = bincode::serialize(record).map_err(store_err)?;
            self.records.insert(id.to_be_bytes(), data).map_err(store_err)?;
        }
        debug!(inserted = records.len(), "records inserted");
        Ok(records.len())
    }

    /// Replace the stored records with `records`; returns how many were written.
    pub fn replace_all(&self, records: &[JoinedRecord]) -> Result<usize> {
        let previous = self.records.len();
        self.records.clear().map_err(store_err)?;
        debug!(previous, "stored records cleared");
        self.insert_all(records)
    }

    /// Every record, in insertion order.
    pub fn records(&self) -> Result<Vec<JoinedRecord>> {
        self.records
            .iter()
            .map(|entry| {
                let (_, value) = entry.map_err(store_err)?;
                bincode::deserialize(&value).map_err(store_err)
            })
            .collect()
    }

    /// Records for one ticker, in insertion order.
    pub fn by_ticker(&self, ticker: &str) -> Result<Vec<JoinedRecord>> {
        Ok(self
            .records()?
            .into_iter()
            .filter(|r| r.record.ticker == ticker)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flush to disk and release the handle.
    pub fn close(self) -> Result<()> {
        self.db.flush().map_err(store_err)?;
        info!(path = %self.path.display(), records = self.records.len(), "record store closed");
        Ok(())
    }
}
