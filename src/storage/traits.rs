//! Storage traits and error types
//!
//! This module defines the trait interfaces for the durable side of a scan
//! (the checkpoint and the match log) and the associated error types.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// All of these are fatal to a scan: carrying on after a failed durable
/// write would let the checkpoint drift away from what was actually recorded.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Checkpoint {path} does not hold a page index: {content:?}")]
    CorruptCheckpoint { path: PathBuf, content: String },

    #[error("Malformed record at {path}:{line}: {content:?}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("CSV error on {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

impl StorageError {
    /// Wraps an IO error with the path it happened on
    pub fn file(path: &Path, source: std::io::Error) -> Self {
        Self::File {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Wraps a CSV error with the path it happened on
    pub fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One confirmed watch-list hit, stored as a `page,address` row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Page the address was found on
    pub page: u64,

    /// The watch-list address
    pub address: String,
}

impl MatchRecord {
    pub fn new(page: u64, address: impl Into<String>) -> Self {
        Self {
            page,
            address: address.into(),
        }
    }
}

/// Durable "next page to scan" marker
pub trait CheckpointStore: Send {
    /// Loads the saved next page index
    ///
    /// Returns `Ok(None)` when no checkpoint has been written yet.
    fn load(&self) -> StorageResult<Option<u64>>;

    /// Durably replaces the saved value with `next_page`
    fn save(&mut self, next_page: u64) -> StorageResult<()>;
}

/// Append-only destination for match records
pub trait MatchSink: Send {
    /// Appends one record; it need not be durable until `flush` returns
    fn append(&mut self, record: &MatchRecord) -> StorageResult<()>;

    /// Makes every appended record durable
    fn flush(&mut self) -> StorageResult<()>;
}
