//! Pipeline configuration.

use llmwire_retries::RetryConfig;
use llmwire_streaming::{SseConfig, DEFAULT_MAX_BUFFER, DEFAULT_MAX_SUMMARY_CHARS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where requests are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transport {
    /// Post to the provider endpoint.
    #[default]
    Direct,
    /// Post an envelope to a local proxy that forwards it.
    Proxy {
        /// Proxy endpoint.
        url: String,
    },
}

/// Tunables shared by every request a [`ChatPipeline`](crate::ChatPipeline) makes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Hard limit on buffered SSE text, in bytes.
    pub max_sse_buffer: usize,
    /// Cap on the thinking summary, in characters.
    pub max_summary_chars: usize,
    /// Retry policy for the initial request.
    pub retry: RetryConfig,
    /// Reconnections allowed after a read error mid-stream.
    pub stream_max_retries: u32,
    /// Base reconnection delay in milliseconds.
    pub reconnect_base_ms: u64,
    /// Transport.
    pub transport: Transport,
    /// Per-request timeout in seconds. Zero disables it.
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_sse_buffer: DEFAULT_MAX_BUFFER,
            max_summary_chars: DEFAULT_MAX_SUMMARY_CHARS,
            retry: RetryConfig::default(),
            stream_max_retries: 3,
            reconnect_base_ms: 1000,
            transport: Transport::Direct,
            request_timeout_secs: 120,
        }
    }
}

impl PipelineConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SSE buffer limit.
    #[must_use]
    pub fn with_max_sse_buffer(mut self, bytes: usize) -> Self {
        self.max_sse_buffer = bytes;
        self
    }

    /// Set the summary cap.
    #[must_use]
    pub fn with_max_summary_chars(mut self, chars: usize) -> Self {
        self.max_summary_chars = chars;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the mid-stream reconnection limit and base delay.
    #[must_use]
    pub fn with_stream_retries(mut self, max_retries: u32, base: Duration) -> Self {
        self.stream_max_retries = max_retries;
        self.reconnect_base_ms = base.as_millis() as u64;
        self
    }

    /// Set the transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Route requests through a local proxy.
    #[must_use]
    pub fn with_proxy(self, url: impl Into<String>) -> Self {
        self.with_transport(Transport::Proxy { url: url.into() })
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Parser settings for one stream.
    #[must_use]
    pub fn sse_config(&self) -> SseConfig {
        SseConfig::default()
            .max_buffer(self.max_sse_buffer)
            .max_retries(self.stream_max_retries)
            .reconnect_base(Duration::from_millis(self.reconnect_base_ms))
    }

    /// Request timeout, if any.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}
