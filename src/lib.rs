//! Page-Sentry: a resumable watch-list scanner for paginated address listings
//!
//! This crate walks a remote site whose pages are addressed by a single increasing
//! integer, extracts the addresses listed on each page, and reports any address that
//! is on a locally held watch-list. Progress is checkpointed so an interrupted scan
//! resumes where it stopped without re-reporting earlier matches.

pub mod config;
pub mod notify;
pub mod output;
pub mod scanner;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Page-Sentry operations
///
/// Only failures that make continuing unsafe end up here. Per-page fetch and
/// extraction problems are absorbed by the scanner and never surface as errors.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Page-Sentry operations
pub type Result<T> = std::result::Result<T, ScanError>;

// Re-export commonly used types
pub use config::Config;
pub use scanner::{ScanReport, Scanner};
pub use state::{PageResult, ScanPhase, ScanState, WatchList};
