//! # llmwire-retries
//!
//! Retry layer for llmwire requests.
//!
//! - **[`RetryConfig`]**: attempt limit and exponential backoff with jitter
//! - **[`RetryableError`]**: one failed attempt, classified transient or not
//! - **[`RetryError`]**: terminal outcome, embedding the attempt count
//! - **[`with_retry`]**: run an async operation under a config
//!
//! ## Example
//!
//! ```ignore
//! use llmwire_retries::{with_retry, RetryConfig, RetryableError};
//!
//! let config = RetryConfig::new().max_retries(3);
//! let body = with_retry(&config, || async {
//!     Ok::<_, RetryableError>("success")
//! })
//! .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod executor;
pub mod transport;

pub use config::RetryConfig;
pub use error::{RetryError, RetryResult, RetryableError};
pub use executor::{with_retry, with_retry_state, AttemptInfo, IntoRetryable, RetryState};
pub use transport::{check_response, parse_retry_after};
