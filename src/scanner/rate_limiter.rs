//! Global request rate limiter
//!
//! One limiter instance is shared by every fetch worker. It enforces a
//! minimum spacing between any two permitted requests across all callers.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Spaces permitted requests at least `interval` apart
///
/// The lock is held across the sleep on purpose: the limiter is the
/// serialization point, so callers queue behind whoever is currently waiting.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_permitted: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing at most `requests_per_second` requests per second
    ///
    /// Non-positive or non-finite rates disable spacing entirely.
    pub fn new(requests_per_second: f64) -> Self {
        let interval = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };
        Self::with_interval(interval)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_permitted: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until a request is permitted and returns the permission time
    ///
    /// Consecutive permission times, across all callers, are never closer
    /// together than the configured interval.
    pub async fn wait(&self) -> Instant {
        let mut last = self.last_permitted.lock().await;

        if let Some(previous) = *last {
            let earliest = previous + self.interval;
            if Instant::now() < earliest {
                sleep_until(earliest).await;
            }
        }

        let now = Instant::now();
        *last = Some(now);
        now
    }
}
