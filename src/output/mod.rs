//! Output module for reporting scan results
//!
//! This module handles:
//! - Printing the report of a finished scan
//! - Summarizing the match log for the `--stats` mode

pub mod stats;

pub use stats::{load_statistics, print_statistics, MatchStatistics};

use crate::scanner::ScanReport;

/// Prints a finished scan's report to stdout
pub fn print_report(report: &ScanReport) {
    println!("=== Scan Report ===\n");

    println!("Run:");
    println!("  Started: {}", report.started_at.to_rfc3339());
    if let Some(finished) = report.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = report.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!("  Final phase: {}", report.phase);
    println!();

    println!("Progress:");
    println!("  Start page: {}", report.start_page);
    println!("  Batches: {}", report.batches);
    println!("  Pages fetched: {}", report.pages_fetched);
    println!(
        "  Pages with new addresses: {}",
        report.pages_with_new_addresses
    );
    println!("  Matches recorded: {}", report.matches_recorded);
    match report.checkpoint {
        Some(next) => println!("  Checkpoint: {}", next),
        None => println!("  Checkpoint: unchanged"),
    }

    if !report.failed_pages.is_empty() {
        println!("\nFailed Pages ({}):", report.failed_pages.len());
        let pages: Vec<String> = report.failed_pages.iter().map(u64::to_string).collect();
        println!("  {}", pages.join(", "));
    }
}
