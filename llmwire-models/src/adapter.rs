//! The adapter trait and the closed registry of adapters.
//!
//! Adapters are pure: they turn an [`AdapterContext`] into an
//! [`AdapterResult`] without I/O. Dispatch goes through [`adapter_for`],
//! which is total over [`ProviderKind`], so an unknown provider can only
//! come from parsing an id with [`lookup`].

use crate::anthropic::AnthropicAdapter;
use crate::catalog::{spec, Dialect};
use crate::context::{AdapterContext, AdapterResult};
use crate::decode::{Completion, StreamDecoder};
use crate::error::{ModelError, ModelResult};
use crate::google::GoogleAdapter;
use crate::openai::OpenAiAdapter;
use llmwire_core::ProviderKind;
use serde_json::Value;

/// One wire dialect.
pub trait Adapter: Send + Sync {
    /// Dialect this adapter speaks.
    fn dialect(&self) -> Dialect;

    /// Build the request for one turn.
    fn build(&self, ctx: &AdapterContext<'_>) -> ModelResult<AdapterResult>;

    /// A fresh decoder for one streamed response.
    fn decoder(&self) -> Box<dyn StreamDecoder>;

    /// Read a non-streaming response body.
    fn extract_completion(&self, body: &Value) -> ModelResult<Completion>;
}

static OPENAI: OpenAiAdapter = OpenAiAdapter;
static ANTHROPIC: AnthropicAdapter = AnthropicAdapter;
static GOOGLE: GoogleAdapter = GoogleAdapter;

/// Adapter serving a provider.
#[must_use]
pub fn adapter_for(kind: ProviderKind) -> &'static dyn Adapter {
    match spec(kind).dialect {
        Dialect::OpenAi => &OPENAI,
        Dialect::Anthropic => &ANTHROPIC,
        Dialect::Google => &GOOGLE,
    }
}

/// Resolve a provider id to its kind and adapter.
pub fn lookup(id: &str) -> ModelResult<(ProviderKind, &'static dyn Adapter)> {
    let kind: ProviderKind = id
        .parse()
        .map_err(|_| ModelError::UnknownProvider(id.to_string()))?;
    Ok((kind, adapter_for(kind)))
}

/// Build a request with the provider's adapter.
pub fn build_request(ctx: &AdapterContext<'_>) -> ModelResult<AdapterResult> {
    adapter_for(ctx.provider).build(ctx)
}

/// Reject a context whose provider speaks another dialect.
pub(crate) fn ensure_dialect(dialect: Dialect, ctx: &AdapterContext<'_>) -> ModelResult<()> {
    if ctx.spec().dialect == dialect {
        Ok(())
    } else {
        Err(ModelError::DialectMismatch {
            adapter: dialect.name(),
            provider: ctx.provider.to_string(),
        })
    }
}
