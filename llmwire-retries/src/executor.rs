//! Retry executor for running operations with retries.

use crate::config::RetryConfig;
use crate::error::{RetryError, RetryResult, RetryableError};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// State of a retry run.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Current attempt number (1-indexed).
    pub attempt: u32,
    /// Last error message.
    pub last_error: Option<String>,
    /// Total time spent waiting.
    pub total_wait_time: Duration,
    /// History of attempts.
    pub history: Vec<AttemptInfo>,
}

impl RetryState {
    /// Waits between consecutive attempts, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.history
            .iter()
            .filter(|a| !a.success)
            .filter_map(|a| a.wait_time)
            .collect()
    }
}

/// Information about a single attempt.
#[derive(Debug, Clone)]
pub struct AttemptInfo {
    /// Attempt number.
    pub attempt: u32,
    /// Whether it succeeded.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Time waited after this attempt, if another one followed.
    pub wait_time: Option<Duration>,
}

/// Execute an operation with retries.
///
/// Transient failures are retried up to `max_retries` times with backoff.
/// A non-transient failure is returned at once as [`RetryError::Permanent`];
/// running out of retries yields [`RetryError::Exhausted`].
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RetryResult<T>>,
{
    with_retry_state(config, operation).await.0
}

/// Execute with retries and get state information.
pub async fn with_retry_state<F, Fut, T>(
    config: &RetryConfig,
    mut operation: F,
) -> (Result<T, RetryError>, RetryState)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RetryResult<T>>,
{
    let mut state = RetryState::default();
    let max_attempts = config.max_retries.saturating_add(1);

    loop {
        state.attempt += 1;

        match operation().await {
            Ok(result) => {
                state.history.push(AttemptInfo {
                    attempt: state.attempt,
                    success: true,
                    error: None,
                    wait_time: None,
                });
                return (Ok(result), state);
            }
            Err(error) => {
                let message = error.to_string();
                state.last_error = Some(message.clone());

                if !error.is_retryable() {
                    debug!(attempt = state.attempt, error = %error, "Error not retryable");
                    state.history.push(failed(state.attempt, message, None));
                    return (Err(RetryError::Permanent(error)), state);
                }

                if state.attempt >= max_attempts {
                    warn!(
                        attempts = state.attempt,
                        error = %error,
                        "Retries exhausted"
                    );
                    state.history.push(failed(state.attempt, message.clone(), None));
                    return (
                        Err(RetryError::Exhausted {
                            attempts: state.attempt,
                            last_error: message,
                            source: error,
                        }),
                        state,
                    );
                }

                let wait = config.delay_for(state.attempt - 1, error.retry_after());
                state.total_wait_time += wait;
                state.history.push(failed(state.attempt, message, Some(wait)));

                debug!(
                    attempt = state.attempt,
                    wait_ms = wait.as_millis() as u64,
                    error = %error,
                    "Waiting before retry"
                );

                sleep(wait).await;
            }
        }
    }
}

fn failed(attempt: u32, error: String, wait_time: Option<Duration>) -> AttemptInfo {
    AttemptInfo {
        attempt,
        success: false,
        error: Some(error),
        wait_time,
    }
}

/// Wrap a result type for retry compatibility.
pub trait IntoRetryable<T> {
    /// Convert into a retryable result.
    fn into_retryable(self) -> RetryResult<T>;
}

impl<T, E: Into<RetryableError>> IntoRetryable<T> for Result<T, E> {
    fn into_retryable(self) -> RetryResult<T> {
        self.map_err(Into::into)
    }
}
