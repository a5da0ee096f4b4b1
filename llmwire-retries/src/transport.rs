//! Mapping HTTP outcomes onto [`RetryableError`].

use crate::error::{RetryResult, RetryableError};
use reqwest::Response;
use std::time::Duration;

impl From<reqwest::Error> for RetryableError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RetryableError::Timeout
        } else if err.is_connect() {
            RetryableError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            RetryableError::http(status.as_u16(), err.to_string())
        } else {
            RetryableError::Other(err.into())
        }
    }
}

/// Pass a successful response through; turn anything else into an error.
///
/// The body of a failed response is read into the error.
pub async fn check_response(response: Response) -> RetryResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = parse_retry_after(&response);
    let body = response.text().await.unwrap_or_default();
    Err(RetryableError::Http {
        status: status.as_u16(),
        body,
        retry_after,
    })
}

/// Parse a Retry-After header given in seconds.
pub fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
