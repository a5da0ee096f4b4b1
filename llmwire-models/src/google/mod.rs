//! Google `generateContent` dialect.
//!
//! History turns become `contents` with `user`/`model` roles, system
//! directives become `systemInstruction`, and uploaded files become
//! `fileData` parts.

pub mod adapter;
pub mod stream;
pub mod types;

// Re-exports
pub use adapter::GoogleAdapter;
pub use stream::GoogleStreamDecoder;
pub use types::{Content, FileData, GenerateContentResponse, GenerationConfig, Part, ThinkingConfig};
