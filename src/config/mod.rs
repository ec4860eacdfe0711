//! Configuration module for Page-Sentry
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use page_sentry::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sentry.toml")).unwrap();
//! println!("Scanning {} with {} workers", config.scanner.base_url, config.scanner.threads);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ExtractorConfig, FetcherConfig, FilesConfig, ScannerConfig, TelegramConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash,
    TELEGRAM_CHAT_ID_ENV, TELEGRAM_TOKEN_ENV,
};
