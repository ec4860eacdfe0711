//! Storage module for persisting scan progress
//!
//! This module handles every file the scanner reads or writes:
//! - The watch-list, read once at startup
//! - The checkpoint holding the next page to scan
//! - The append-only CSV match log
//! - The optional log of every observed address

mod checkpoint;
mod match_log;
mod seen_log;
mod traits;

pub use checkpoint::FileCheckpointStore;
pub use match_log::{CsvMatchLog, MATCH_LOG_HEADER};
pub use seen_log::SeenLog;
pub use traits::{CheckpointStore, MatchRecord, MatchSink, StorageError, StorageResult};

use crate::state::WatchList;
use std::path::Path;

/// Loads the watch-list from a newline-delimited file
///
/// # Arguments
///
/// * `path` - Path to the watch-list file
///
/// # Returns
///
/// * `Ok(WatchList)` - The trimmed, non-blank lines of the file
/// * `Err(StorageError)` - The file could not be read
pub fn load_watchlist(path: &Path) -> StorageResult<WatchList> {
    let content = std::fs::read_to_string(path).map_err(|e| StorageError::file(path, e))?;
    Ok(WatchList::parse(&content))
}

/// Collects every address a previous run is known to have observed
///
/// Matched addresses always come from the match log. When `seen_path` is
/// given, the full observation log is added on top.
pub fn load_previously_seen(
    matches_path: &Path,
    seen_path: Option<&Path>,
) -> StorageResult<Vec<String>> {
    let mut seen: Vec<String> = CsvMatchLog::read_records(matches_path)?
        .into_iter()
        .map(|record| record.address)
        .collect();

    if let Some(seen_path) = seen_path {
        seen.extend(SeenLog::read_addresses(seen_path)?);
    }

    Ok(seen)
}
