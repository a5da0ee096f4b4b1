//! Retry configuration.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for retry behavior.
///
/// The wait before retry `n` (zero-based) is `base * 2^n` plus a random
/// jitter of up to `max_jitter`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Base delay in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on random jitter in milliseconds.
    pub max_jitter_ms: u64,
    /// Upper bound on the total delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_jitter_ms: 500,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config that never retries.
    pub fn no_retry() -> Self {
        Self::new().max_retries(0)
    }

    /// Set max retries.
    #[must_use]
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the base delay.
    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the jitter bound.
    #[must_use]
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter_ms = jitter.as_millis() as u64;
        self
    }

    /// Disable jitter.
    #[must_use]
    pub fn no_jitter(self) -> Self {
        self.jitter(Duration::ZERO)
    }

    /// Set the delay cap.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Delay before retry `retry` (zero-based), honouring a server hint.
    ///
    /// The result never exceeds `max_delay_ms`, hint included.
    pub fn delay_for(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(1u64.checked_shl(retry).unwrap_or(u64::MAX));
        let jitter = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.max_jitter_ms)
        };
        let computed = Duration::from_millis(
            exponential
                .saturating_add(jitter)
                .min(self.max_delay_ms),
        );
        match retry_after {
            Some(hint) => computed
                .max(hint)
                .min(Duration::from_millis(self.max_delay_ms)),
            None => computed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.max_jitter_ms, 500);
    }

    #[test]
    fn test_exponential_without_jitter() {
        let config = RetryConfig::new().base_delay(Duration::from_millis(100)).no_jitter();
        assert_eq!(config.delay_for(0, None), Duration::from_millis(100));
        assert_eq!(config.delay_for(1, None), Duration::from_millis(200));
        assert_eq!(config.delay_for(3, None), Duration::from_millis(800));
    }

    #[test]
    fn test_jitter_bounds() {
        let config = RetryConfig::default();
        for _ in 0..50 {
            let delay = config.delay_for(1, None).as_millis();
            assert!((2000..=2500).contains(&delay), "delay {delay}");
        }
    }

    #[test]
    fn test_cap_and_retry_after() {
        let config = RetryConfig::new()
            .no_jitter()
            .max_delay(Duration::from_secs(5));
        assert_eq!(config.delay_for(10, None), Duration::from_secs(5));
        assert_eq!(config.delay_for(63, None), Duration::from_secs(5));
        assert_eq!(
            config.delay_for(0, Some(Duration::from_secs(3))),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_retry_after_capped_by_max_delay() {
        let config = RetryConfig::new()
            .no_jitter()
            .max_delay(Duration::from_secs(5));
        assert_eq!(
            config.delay_for(0, Some(Duration::from_secs(3600))),
            Duration::from_secs(5)
        );
        assert_eq!(
            config.delay_for(4, Some(Duration::from_secs(3600))),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RetryConfig = serde_json::from_str(r#"{"max_retries": 5}"#).unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay_ms, 1000);
    }
}
