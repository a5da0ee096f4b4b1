//! Server-Sent Events (SSE) parsing.
//!
//! [`SseParser`] is an incremental, line-oriented parser owned by exactly one
//! response stream. Bytes go in through [`SseParser::process_chunk`], complete
//! events come out; the last, possibly incomplete, line is always held back
//! until more bytes arrive or [`SseParser::flush`] is called.

use crate::decode::Utf8Decoder;
use crate::error::{StreamError, StreamResult};
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Duration;

/// Default buffer limit: 1 MiB.
pub const DEFAULT_MAX_BUFFER: usize = 1024 * 1024;

/// A parsed SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type (if specified).
    pub event: Option<String>,
    /// Event data; multiple `data:` lines joined by `\n`.
    pub data: String,
    /// Last event id in effect when the event was dispatched.
    pub id: Option<String>,
    /// Retry timeout (if specified).
    pub retry: Option<u64>,
}

impl SseEvent {
    /// Create a new SSE event with just data.
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
            id: None,
            retry: None,
        }
    }

    /// Set the event type.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Set the event ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whether the payload is the `[DONE]` terminator.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }

    /// Parse the data as JSON.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}

/// Parser limits and reconnection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SseConfig {
    /// Hard limit on buffered text, in bytes.
    pub max_buffer: usize,
    /// Reconnection attempts allowed by [`SseParser::handle_error`].
    pub max_retries: u32,
    /// Base reconnection delay.
    pub reconnect_base: Duration,
    /// Upper bound on the reconnection delay.
    pub reconnect_cap: Duration,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            max_buffer: DEFAULT_MAX_BUFFER,
            max_retries: 3,
            reconnect_base: Duration::from_millis(1000),
            reconnect_cap: Duration::from_millis(10_000),
        }
    }
}

impl SseConfig {
    /// Set the buffer limit.
    #[must_use]
    pub fn max_buffer(mut self, bytes: usize) -> Self {
        self.max_buffer = bytes;
        self
    }

    /// Set the reconnection attempt limit.
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the base reconnection delay.
    #[must_use]
    pub fn reconnect_base(mut self, delay: Duration) -> Self {
        self.reconnect_base = delay;
        self
    }

    /// Delay before reconnection attempt `n` (zero-based): `min(base * 2^n, cap)`.
    #[must_use]
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.reconnect_base
            .saturating_mul(factor)
            .min(self.reconnect_cap)
    }
}

/// What to do after a read error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Reconnect after `delay`.
    Retry {
        /// One-based reconnection attempt.
        attempt: u32,
        /// Wait before reconnecting.
        delay: Duration,
    },
    /// Give up and surface the error.
    Stop,
}

type ErrorCallback = Box<dyn FnMut(&StreamError) + Send>;

/// Incremental parser for one Server-Sent Events stream.
pub struct SseParser {
    config: SseConfig,
    decoder: Utf8Decoder,
    buffer: String,
    data_lines: Vec<String>,
    event: Option<String>,
    retry: Option<u64>,
    last_event_id: Option<String>,
    retry_count: u32,
    bytes_consumed: u64,
    on_error: Option<ErrorCallback>,
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SseParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseParser")
            .field("config", &self.config)
            .field("buffered", &self.buffer.len())
            .field("last_event_id", &self.last_event_id)
            .field("retry_count", &self.retry_count)
            .field("bytes_consumed", &self.bytes_consumed)
            .finish_non_exhaustive()
    }
}

impl SseParser {
    /// Create a parser with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SseConfig::default())
    }

    /// Create a parser with the given limits.
    #[must_use]
    pub fn with_config(config: SseConfig) -> Self {
        Self {
            config,
            decoder: Utf8Decoder::new(),
            buffer: String::new(),
            data_lines: Vec::new(),
            event: None,
            retry: None,
            last_event_id: None,
            retry_count: 0,
            bytes_consumed: 0,
            on_error: None,
        }
    }

    /// Register a callback invoked by [`Self::handle_error`].
    #[must_use]
    pub fn on_error(mut self, callback: impl FnMut(&StreamError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Seed the last event id, e.g. when resuming a stream.
    pub fn set_last_event_id(&mut self, id: Option<String>) {
        self.last_event_id = id;
    }

    /// Get the last event ID.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Reconnection attempts made so far.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Total bytes handed to [`Self::process_chunk`].
    #[must_use]
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    /// Parser configuration.
    #[must_use]
    pub fn config(&self) -> &SseConfig {
        &self.config
    }

    /// Feed a chunk of bytes and return every event it completes.
    ///
    /// Exceeding the buffer limit resets the parser and returns
    /// [`StreamError::BufferOverflow`].
    pub fn process_chunk(&mut self, bytes: &[u8]) -> StreamResult<Vec<SseEvent>> {
        self.bytes_consumed += bytes.len() as u64;
        let text = self.decoder.decode(bytes);
        self.buffer.push_str(&text);

        if self.buffer.len() > self.config.max_buffer {
            let size = self.buffer.len();
            let limit = self.config.max_buffer;
            tracing::warn!(size, limit, "SSE buffer overflow, resetting parser");
            self.reset();
            return Err(StreamError::BufferOverflow { size, limit });
        }

        let Some(end) = self.buffer.rfind('\n') else {
            return Ok(Vec::new());
        };
        let complete: String = self.buffer.drain(..=end).collect();

        Ok(complete
            .lines()
            .filter_map(|line| self.process_line(line))
            .collect())
    }

    /// Feed a string. Convenience for tests and already-decoded input.
    pub fn process_str(&mut self, text: &str) -> StreamResult<Vec<SseEvent>> {
        self.process_chunk(text.as_bytes())
    }

    /// Drain everything still buffered at end of stream.
    ///
    /// An unterminated last line is parsed as if it ended with a newline and
    /// any in-progress event is emitted.
    pub fn flush(&mut self) -> Vec<SseEvent> {
        let tail = self.decoder.finish();
        self.buffer.push_str(&tail);

        let remaining = std::mem::take(&mut self.buffer);
        let mut events: Vec<SseEvent> = remaining
            .lines()
            .filter_map(|line| self.process_line(line))
            .collect();
        events.extend(self.dispatch());
        events
    }

    /// Decide whether to reconnect after a read error.
    ///
    /// Invokes the error callback, then either schedules reconnection attempt
    /// `n + 1` with a delay of `min(base * 2^n, cap)` or gives up once
    /// `max_retries` attempts have been made.
    pub fn handle_error(&mut self, error: &StreamError) -> ErrorAction {
        if let Some(callback) = self.on_error.as_mut() {
            callback(error);
        }

        if self.retry_count >= self.config.max_retries {
            tracing::warn!(
                attempts = self.retry_count,
                error = %error,
                "SSE reconnection attempts exhausted"
            );
            return ErrorAction::Stop;
        }

        let delay = self.config.reconnect_delay(self.retry_count);
        self.retry_count += 1;
        tracing::debug!(
            attempt = self.retry_count,
            wait_ms = delay.as_millis() as u64,
            error = %error,
            "Scheduling SSE reconnection"
        );
        ErrorAction::Retry {
            attempt: self.retry_count,
            delay,
        }
    }

    /// Drop a half-received event before reading from a new connection.
    ///
    /// Keeps `last_event_id` and the retry count.
    pub fn prepare_reconnect(&mut self) {
        self.decoder.reset();
        self.buffer.clear();
        self.clear_pending();
    }

    /// Reset all parsing state.
    pub fn reset(&mut self) {
        self.prepare_reconnect();
        self.last_event_id = None;
        self.retry_count = 0;
    }

    fn clear_pending(&mut self) {
        self.data_lines.clear();
        self.event = None;
        self.retry = None;
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data_lines.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.last_event_id = Some(value.to_string()),
            "retry" => match value.trim().parse() {
                Ok(ms) => self.retry = Some(ms),
                Err(_) => tracing::trace!(value, "Ignoring non-numeric SSE retry field"),
            },
            other => tracing::trace!(field = other, "Ignoring unknown SSE field"),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data_lines.is_empty() {
            self.clear_pending();
            return None;
        }

        let event = SseEvent {
            event: self.event.take(),
            data: self.data_lines.join("\n"),
            id: self.last_event_id.clone(),
            retry: self.retry.take(),
        };
        self.data_lines.clear();
        Some(event)
    }
}

pin_project! {
    /// Stream adapter that parses SSE from a byte stream.
    ///
    /// The parser can be recovered with [`SseStream::into_parser`] after a
    /// read error so its state survives a reconnect.
    pub struct SseStream<S> {
        #[pin]
        inner: S,
        parser: SseParser,
        pending: VecDeque<SseEvent>,
        finished: bool,
    }
}

impl<S> SseStream<S> {
    /// Create a new SSE stream from a byte stream.
    pub fn new(inner: S) -> Self {
        Self::with_parser(inner, SseParser::new())
    }

    /// Create a stream that continues with an existing parser.
    pub fn with_parser(inner: S, parser: SseParser) -> Self {
        Self {
            inner,
            parser,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Borrow the parser.
    pub fn parser(&self) -> &SseParser {
        &self.parser
    }

    /// Take the parser back, dropping the byte stream.
    pub fn into_parser(self) -> SseParser {
        self.parser
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: fmt::Display,
{
    type Item = StreamResult<SseEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if *this.finished {
                return Poll::Ready(None);
            }

            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => match this.parser.process_chunk(&bytes) {
                    Ok(events) => this.pending.extend(events),
                    Err(err) => return Poll::Ready(Some(Err(err))),
                },
                Some(Err(err)) => {
                    return Poll::Ready(Some(Err(StreamError::Connection(err.to_string()))));
                }
                None => {
                    *this.finished = true;
                    this.pending.extend(this.parser.flush());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn datas(events: &[SseEvent]) -> Vec<String> {
        events.iter().map(|e| e.data.clone()).collect()
    }

    #[test]
    fn test_multiline_data_single_chunk() {
        let mut parser = SseParser::new();
        let events = parser.process_str("data: foo\ndata: bar\n\n").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "foo\nbar");
    }

    #[test]
    fn test_event_type_and_id() {
        let mut parser = SseParser::new();
        let events = parser
            .process_str("event: message\nid: 7\ndata: hello\n\n")
            .unwrap();
        assert_eq!(events[0].event.as_deref(), Some("message"));
        assert_eq!(events[0].id.as_deref(), Some("7"));
        assert_eq!(parser.last_event_id(), Some("7"));
    }

    #[test]
    fn test_last_event_id_persists() {
        let mut parser = SseParser::new();
        let events = parser
            .process_str("id: 1\ndata: a\n\ndata: b\n\n")
            .unwrap();
        assert_eq!(events[1].id.as_deref(), Some("1"));
    }

    #[test]
    fn test_retry_field() {
        let mut parser = SseParser::new();
        let events = parser
            .process_str("retry: 5000\ndata: a\n\nretry: soon\ndata: b\n\n")
            .unwrap();
        assert_eq!(events[0].retry, Some(5000));
        assert_eq!(events[1].retry, None);
    }

    #[test]
    fn test_comments_unknown_fields_and_stray_blanks() {
        let mut parser = SseParser::new();
        let events = parser
            .process_str("\n\n: keep-alive\nfoo: bar\nevent: ping\n\ndata: x\n\n")
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, None);
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_value_trims_exactly_one_space() {
        let mut parser = SseParser::new();
        let events = parser.process_str("data:  two\ndata:none\n\n").unwrap();
        assert_eq!(events[0].data, " two\nnone");
    }

    #[test]
    fn test_crlf_lines() {
        let mut parser = SseParser::new();
        let events = parser.process_str("data: a\r\n\r\ndata: b\r\n\r\n").unwrap();
        assert_eq!(datas(&events), vec!["a", "b"]);
    }

    #[test]
    fn test_holds_back_incomplete_line() {
        let mut parser = SseParser::new();
        assert!(parser.process_str("data: hel").unwrap().is_empty());
        assert!(parser.process_str("lo\n").unwrap().is_empty());
        let events = parser.process_str("\n").unwrap();
        assert_eq!(events[0].data, "hello");
    }

    #[test]
    fn test_flush_emits_unterminated_event() {
        let mut parser = SseParser::new();
        assert!(parser.process_str("data: {\"a\":1}\ndata: tail").unwrap().is_empty());
        let events = parser.flush();
        assert_eq!(events[0].data, "{\"a\":1}\ntail");
        assert!(parser.flush().is_empty());
    }

    #[test]
    fn test_arbitrary_chunking_conserves_data() {
        let stream = "id: 1\ndata: {\"text\":\"héllo\"}\n\n: ping\nevent: delta\ndata: 世界\ndata: two\n\ndata: [DONE]\n\ndata: tail";
        let bytes = stream.as_bytes();

        let mut whole = SseParser::new();
        let mut expected = whole.process_chunk(bytes).unwrap();
        expected.extend(whole.flush());

        for size in 1..=bytes.len() {
            let mut parser = SseParser::new();
            let mut events = Vec::new();
            for chunk in bytes.chunks(size) {
                events.extend(parser.process_chunk(chunk).unwrap());
            }
            events.extend(parser.flush());
            assert_eq!(datas(&events), datas(&expected), "chunk size {size}");
            assert_eq!(parser.bytes_consumed(), bytes.len() as u64);
        }
    }

    #[test]
    fn test_buffer_overflow_resets() {
        let mut parser = SseParser::with_config(SseConfig::default().max_buffer(16));
        parser.process_str("id: 3\n").unwrap();
        let err = parser.process_str("data: this line is far too long").unwrap_err();
        assert!(matches!(err, StreamError::BufferOverflow { limit: 16, .. }));
        assert_eq!(parser.last_event_id(), None);

        let events = parser.process_str("data: ok\n\n").unwrap();
        assert_eq!(events[0].data, "ok");
    }

    #[test]
    fn test_handle_error_backoff_and_bound() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut parser = SseParser::with_config(SseConfig::default().max_retries(5))
            .on_error(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });
        let err = StreamError::Connection("reset".into());

        let delays: Vec<_> = (0..5)
            .map(|_| match parser.handle_error(&err) {
                ErrorAction::Retry { delay, .. } => delay.as_millis(),
                ErrorAction::Stop => panic!("stopped early"),
            })
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10_000]);
        assert_eq!(parser.handle_error(&err), ErrorAction::Stop);
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_prepare_reconnect_keeps_id() {
        let mut parser = SseParser::new();
        parser.process_str("id: 9\ndata: partial\n").unwrap();
        parser.prepare_reconnect();
        assert_eq!(parser.last_event_id(), Some("9"));
        assert!(parser.flush().is_empty());
    }

    #[test]
    fn test_is_done() {
        assert!(SseEvent::data("[DONE]").is_done());
        assert!(!SseEvent::data("{}").is_done());
    }

    #[tokio::test]
    async fn test_sse_stream_over_bytes() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: one\n")),
            Ok(Bytes::from_static(b"\ndata: t")),
            Ok(Bytes::from_static(b"wo")),
        ];
        let stream = SseStream::new(futures::stream::iter(chunks));
        let events: Vec<_> = stream.map(|e| e.unwrap().data).collect().await;
        assert_eq!(events, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_sse_stream_surfaces_read_error() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"id: 4\ndata: a\n\n")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let mut stream = SseStream::new(futures::stream::iter(chunks));
        assert_eq!(stream.next().await.unwrap().unwrap().data, "a");
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(stream.into_parser().last_event_id(), Some("4"));
    }
}
