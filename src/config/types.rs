use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Page-Sentry
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    pub files: FilesConfig,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

/// Scan loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// Prefix every page index is appended to
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Number of pages fetched in parallel per batch
    pub threads: u32,

    /// Global request ceiling shared by all workers
    #[serde(rename = "max-requests-per-second")]
    pub max_requests_per_second: f64,

    /// Consecutive batches without new addresses before the scan halts
    #[serde(rename = "idle-batch-limit", default = "default_idle_batch_limit")]
    pub idle_batch_limit: u32,
}

/// HTTP fetch and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Total attempts per page, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds); doubles on each further retry
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Timeout for a single attempt (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Address extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Substring an anchor's href must contain for its text to count as an address
    #[serde(rename = "link-pattern", default = "default_link_pattern")]
    pub link_pattern: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            link_pattern: default_link_pattern(),
        }
    }
}

/// Locations of the files the scanner reads and writes
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    #[serde(rename = "watchlist-path")]
    pub watchlist_path: String,

    #[serde(rename = "matches-path")]
    pub matches_path: String,

    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,

    /// Optional log of every observed address, used to widen deduplication across restarts
    #[serde(rename = "seen-path", default)]
    pub seen_path: Option<String>,
}

/// Telegram bot credentials for match alerts
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(rename = "chat-id", default)]
    pub chat_id: Option<String>,

    #[serde(rename = "api-base", default = "default_telegram_api_base")]
    pub api_base: String,
}

fn default_idle_batch_limit() -> u32 {
    5
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("page-sentry/{}", env!("CARGO_PKG_VERSION"))
}

fn default_link_pattern() -> String {
    "blockchain.info/address".to_string()
}

pub(crate) fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}
