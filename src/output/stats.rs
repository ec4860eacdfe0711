//! Statistics from the match log and checkpoint
//!
//! This module provides functionality for summarizing what earlier scans
//! recorded, without touching the network.

use crate::storage::{CheckpointStore, CsvMatchLog, FileCheckpointStore, MatchRecord};
use crate::ScanError;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Match log summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchStatistics {
    /// Number of match records
    pub total_matches: u64,

    /// Number of distinct pages with at least one match
    pub distinct_pages: u64,

    /// Number of distinct matched addresses
    pub distinct_addresses: u64,

    /// Highest page index with a match
    pub highest_page: Option<u64>,

    /// Saved checkpoint, if any
    pub checkpoint: Option<u64>,

    /// Matches per page, in page order
    pub matches_by_page: BTreeMap<u64, u64>,
}

impl MatchStatistics {
    /// Summarizes match records and a checkpoint value
    pub fn from_records(records: &[MatchRecord], checkpoint: Option<u64>) -> Self {
        let mut matches_by_page = BTreeMap::new();
        let mut addresses = HashSet::new();

        for record in records {
            *matches_by_page.entry(record.page).or_insert(0) += 1;
            addresses.insert(record.address.as_str());
        }

        Self {
            total_matches: records.len() as u64,
            distinct_pages: matches_by_page.len() as u64,
            distinct_addresses: addresses.len() as u64,
            highest_page: matches_by_page.keys().next_back().copied(),
            checkpoint,
            matches_by_page,
        }
    }
}

/// Loads statistics from the match log and checkpoint files
pub fn load_statistics(
    matches_path: &Path,
    checkpoint_path: &Path,
) -> Result<MatchStatistics, ScanError> {
    let records = CsvMatchLog::read_records(matches_path)?;
    let checkpoint = FileCheckpointStore::new(checkpoint_path).load()?;
    Ok(MatchStatistics::from_records(&records, checkpoint))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &MatchStatistics) {
    println!("=== Match Statistics ===\n");

    println!("Overview:");
    println!("  Total matches: {}", stats.total_matches);
    println!("  Distinct pages: {}", stats.distinct_pages);
    println!("  Distinct addresses: {}", stats.distinct_addresses);
    match stats.highest_page {
        Some(page) => println!("  Highest matched page: {}", page),
        None => println!("  Highest matched page: -"),
    }
    match stats.checkpoint {
        Some(next) => println!("  Next page to scan: {}", next),
        None => println!("  Next page to scan: 1 (no checkpoint)"),
    }

    if !stats.matches_by_page.is_empty() {
        println!("\nMatches by Page:");
        for (page, count) in &stats.matches_by_page {
            println!("  {}: {}", page, count);
        }
    }
}
