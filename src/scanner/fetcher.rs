//! HTTP page fetcher
//!
//! This module handles every request the scanner makes for a page:
//! - Building the HTTP client with the configured user agent and timeout
//! - Waiting on the shared rate limiter before each attempt
//! - Retrying transient failures with exponential backoff
//! - Classifying the final outcome

use crate::config::FetcherConfig;
use crate::scanner::rate_limiter::RateLimiter;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Result of fetching one page
#[derive(Debug)]
pub enum FetchResult {
    /// The page answered with a success status
    Success {
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
        /// Attempts used, including the successful one
        attempts: u32,
    },

    /// The server answered with a status that is not retried, or kept
    /// answering with a retryable status until attempts ran out
    HttpError {
        /// The last HTTP status code received
        status_code: u16,
        /// Attempts used
        attempts: u32,
    },

    /// The request never produced a response (timeout, connection failure)
    NetworkError {
        /// Error description
        error: String,
        /// Attempts used
        attempts: u32,
    },
}

/// How often and how patiently a page is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; each further retry doubles it
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(1 << exponent)
    }
}

impl From<&FetcherConfig> for RetryPolicy {
    fn from(config: &FetcherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: config.backoff_base(),
        }
    }
}

/// Returns true for statuses worth retrying
///
/// | Status | Action |
/// |--------|--------|
/// | 429 Too Many Requests | Retry |
/// | 500, 502, 503, 504 | Retry |
/// | Anything else non-2xx | Give up |
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Builds an HTTP client with the configured user agent and per-attempt timeout
///
/// # Example
///
/// ```no_run
/// use page_sentry::config::FetcherConfig;
/// use page_sentry::scanner::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .connect_timeout(config.timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches numbered pages under a base URL
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            limiter,
            policy,
        }
    }

    /// URL of page `page`: the base URL with the index appended
    pub fn page_url(&self, page: u64) -> String {
        format!("{}{}", self.base_url, page)
    }

    /// Fetches one page, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Success |
    /// | 429, 500, 502, 503, 504 | Retry with backoff |
    /// | Timeout / connection failure | Retry with backoff |
    /// | Other status | Immediate HttpError |
    /// | Attempts exhausted | Last error |
    ///
    /// Every attempt, retries included, first waits on the rate limiter.
    pub async fn fetch(&self, page: u64) -> FetchResult {
        let url = self.page_url(page);
        let mut attempt = 1;

        loop {
            let result = self.attempt(&url, attempt).await;

            let retry = match &result {
                FetchResult::Success { .. } => false,
                FetchResult::HttpError { status_code, .. } => StatusCode::from_u16(*status_code)
                    .map(is_retryable_status)
                    .unwrap_or(false),
                FetchResult::NetworkError { .. } => true,
            };

            if !retry || attempt >= self.policy.max_attempts {
                return result;
            }

            let delay = self.policy.backoff(attempt);
            tracing::debug!(
                "Page {} attempt {}/{} failed ({:?}); retrying in {:?}",
                page,
                attempt,
                self.policy.max_attempts,
                result,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, url: &str, attempt: u32) -> FetchResult {
        self.limiter.wait().await;

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return network_error(e, attempt),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchResult::HttpError {
                status_code: status.as_u16(),
                attempts: attempt,
            };
        }

        match response.text().await {
            Ok(body) => FetchResult::Success {
                status_code: status.as_u16(),
                body,
                attempts: attempt,
            },
            Err(e) => network_error(e, attempt),
        }
    }
}

fn network_error(e: reqwest::Error, attempts: u32) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection failed".to_string()
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error, attempts }
}
