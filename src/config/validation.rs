use crate::config::types::{Config, ExtractorConfig, FetcherConfig, FilesConfig, ScannerConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scanner_config(&config.scanner)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_extractor_config(&config.extractor)?;
    validate_files_config(&config.files)?;
    if let Some(telegram) = &config.telegram {
        validate_http_url("telegram api-base", &telegram.api_base)?;
    }
    Ok(())
}

/// Validates scan loop configuration
fn validate_scanner_config(config: &ScannerConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;

    if config.threads < 1 || config.threads > 64 {
        return Err(ConfigError::Validation(format!(
            "threads must be between 1 and 64, got {}",
            config.threads
        )));
    }

    if !config.max_requests_per_second.is_finite() || config.max_requests_per_second <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "max-requests-per-second must be a positive number, got {}",
            config.max_requests_per_second
        )));
    }

    if config.idle_batch_limit < 1 {
        return Err(ConfigError::Validation(
            "idle-batch-limit must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch and retry configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    if config.link_pattern.trim().is_empty() {
        return Err(ConfigError::Validation(
            "link-pattern cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates file locations
fn validate_files_config(config: &FilesConfig) -> Result<(), ConfigError> {
    let required = [
        ("watchlist-path", &config.watchlist_path),
        ("matches-path", &config.matches_path),
        ("checkpoint-path", &config.checkpoint_path),
    ];

    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if matches!(&config.seen_path, Some(p) if p.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "seen-path cannot be empty when set".to_string(),
        ));
    }

    if config.matches_path == config.checkpoint_path {
        return Err(ConfigError::Validation(
            "matches-path and checkpoint-path must differ".to_string(),
        ));
    }

    Ok(())
}

/// Checks that `value` parses as an http or https URL
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}
