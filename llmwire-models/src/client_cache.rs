//! Per-provider HTTP clients.
//!
//! One `reqwest::Client` is kept per provider and reused across requests.
//! Each entry remembers the fingerprint of the settings it was built from;
//! a changed API key, base URL or timeout replaces the entry on the next
//! lookup.

use crate::error::ModelResult;
use llmwire_core::{ProviderConfig, ProviderKind};
use parking_lot::RwLock;
use reqwest::Client;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint(u64);

impl Fingerprint {
    fn of(config: &ProviderConfig, timeout: Option<Duration>) -> Self {
        let mut hasher = DefaultHasher::new();
        config.api_key.hash(&mut hasher);
        config.base_url.hash(&mut hasher);
        timeout.hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// Cache of HTTP clients keyed by provider.
#[derive(Debug, Default)]
pub struct ClientCache {
    timeout: Option<Duration>,
    entries: RwLock<HashMap<ProviderKind, (Fingerprint, Client)>>,
}

impl ClientCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build clients with a request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The client for `provider`, building one if the cached entry is missing or stale.
    pub fn get_or_create(&self, provider: ProviderKind, config: &ProviderConfig) -> ModelResult<Client> {
        let fingerprint = Fingerprint::of(config, self.timeout);

        if let Some((cached, client)) = self.entries.read().get(&provider) {
            if *cached == fingerprint {
                return Ok(client.clone());
            }
        }

        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        debug!(provider = %provider, "created http client");
        self.entries
            .write()
            .insert(provider, (fingerprint, client.clone()));
        Ok(client)
    }

    /// Drop the client for one provider. Returns whether one was cached.
    pub fn invalidate(&self, provider: ProviderKind) -> bool {
        self.entries.write().remove(&provider).is_some()
    }

    /// Drop every client.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    #[cfg(test)]
    fn fingerprint(&self, provider: ProviderKind) -> Option<Fingerprint> {
        self.entries.read().get(&provider).map(|(f, _)| *f)
    }
}
