//! Rate-limit backoff policy and the delay seam used by the collectors.

use async_trait::async_trait;
use std::time::Duration;

/// Suspends the current task. Injected so tests never wait on the wall clock.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How paginated fetches back off.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Wait before retrying a page that hit the rate limit.
    pub cooldown: Duration,
    /// Pause between successive page fetches.
    pub page_delay: Duration,
    /// Consecutive rate-limit retries allowed per page; `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(60),
            page_delay: Duration::from_secs(1),
            max_retries: None,
        }
    }
}

impl RetryPolicy {
    /// Whether another retry is allowed after `attempts` consecutive failures.
    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts < max)
    }
}

impl From<&crate::config::RateLimitConfig> for RetryPolicy {
    fn from(config: &crate::config::RateLimitConfig) -> Self {
        Self {
            cooldown: Duration::from_secs(config.cooldown_seconds),
            page_delay: Duration::from_millis(config.page_delay_ms),
            max_retries: config.max_retries,
        }
    }
}

/// Sleeper that records requested delays and returns immediately.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    pub calls: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(duration);
        }
    }
}
