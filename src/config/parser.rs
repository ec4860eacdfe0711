use crate::config::types::{default_telegram_api_base, Config, TelegramConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable consulted when the config has no Telegram token
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_TOKEN";

/// Environment variable consulted when the config has no Telegram chat id
pub const TELEGRAM_CHAT_ID_ENV: &str = "CHAT_ID";

/// Loads and parses a configuration file from the given path
///
/// Telegram credentials missing from the file are filled in from the
/// `TELEGRAM_TOKEN` and `CHAT_ID` environment variables.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use page_sentry::config::load_config;
///
/// let config = load_config(Path::new("sentry.toml")).unwrap();
/// println!("Workers: {}", config.scanner.threads);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate(&config)?;

    Ok(config)
}

/// Fills in Telegram credentials the file left out using `lookup`
///
/// Values present in the file always win. A `[telegram]` section is created
/// when the environment provides credentials and the file has none.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let token = lookup(TELEGRAM_TOKEN_ENV).filter(|v| !v.is_empty());
    let chat_id = lookup(TELEGRAM_CHAT_ID_ENV).filter(|v| !v.is_empty());

    if config.telegram.is_none() && (token.is_some() || chat_id.is_some()) {
        config.telegram = Some(TelegramConfig {
            token: None,
            chat_id: None,
            api_base: default_telegram_api_base(),
        });
    }

    if let Some(telegram) = config.telegram.as_mut() {
        if telegram.token.is_none() {
            telegram.token = token;
        }
        if telegram.chat_id.is_none() {
            telegram.chat_id = chat_id;
        }
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs with different settings can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
