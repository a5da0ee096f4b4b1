//! # llmwire-streaming
//!
//! Stream decoding for llmwire.
//!
//! Bytes from the network pass through three stages, all owned by a single
//! response stream:
//!
//! - **[`Utf8Decoder`]**: multi-byte-safe incremental decoding
//! - **[`SseParser`]**: Server-Sent Events framing with reconnection policy
//! - **[`TagMachine`]**: splits the logical text stream into thinking,
//!   summary and response channels and picks up token usage
//!
//! ## Example
//!
//! ```rust
//! use llmwire_streaming::{Channel, SseParser, TagMachine};
//!
//! let mut parser = SseParser::new();
//! let events = parser.process_str("data: __THINKING__hmm\n\ndata: __END_THINKING__\n\ndata: 4\n\n").unwrap();
//!
//! let mut machine = TagMachine::new();
//! for event in &events {
//!     machine.ingest(&event.data);
//! }
//! let output = machine.finalize();
//! assert_eq!(output.thinking, "hmm");
//! assert_eq!(output.response, "4");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod decode;
pub mod error;
pub mod sanitize;
pub mod sse;
pub mod tagger;

pub use decode::Utf8Decoder;
pub use error::{StreamError, StreamResult};
pub use sanitize::sanitize;
pub use sse::{ErrorAction, SseConfig, SseEvent, SseParser, SseStream, DEFAULT_MAX_BUFFER};
pub use tagger::{Channel, ChannelDelta, TagMachine, TaggedOutput, DEFAULT_MAX_SUMMARY_CHARS};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        Channel, ChannelDelta, SseConfig, SseEvent, SseParser, SseStream, StreamError,
        StreamResult, TagMachine, TaggedOutput,
    };
}
