//! Scanner module for the paginated scan engine
//!
//! This module contains the core scanning logic, including:
//! - The global rate limiter shared by all fetch workers
//! - HTTP page fetching with retry logic
//! - Address extraction from page content
//! - The batch scheduler tying them to state and storage

mod extractor;
mod fetcher;
mod rate_limiter;
mod report;
mod scheduler;

pub use extractor::{LinkTextExtractor, PageExtractor};
pub use fetcher::{build_http_client, is_retryable_status, FetchResult, PageFetcher, RetryPolicy};
pub use rate_limiter::RateLimiter;
pub use report::ScanReport;
pub use scheduler::{BatchSummary, ScanSinks, Scanner, FIRST_PAGE};

use crate::config::Config;
use crate::ScanError;

/// Runs a complete scan
///
/// This is the main entry point for starting a scan. It will:
/// 1. Load the watch-list and previously seen addresses
/// 2. Resume from the checkpoint (or page 1)
/// 3. Scan batch after batch until the idle limit is reached
///
/// # Example
///
/// ```no_run
/// use page_sentry::config::load_config;
/// use page_sentry::scanner::scan;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sentry.toml"))?;
/// let report = scan(&config).await?;
/// println!("{} matches", report.matches_recorded);
/// # Ok(())
/// # }
/// ```
pub async fn scan(config: &Config) -> Result<ScanReport, ScanError> {
    let mut scanner = Scanner::from_config(config)?;
    scanner.run().await
}
