//! A process-wide registry of named provider clients, and the
//! object-safe erasure that lets the pipeline executor hold them as
//! trait objects despite [`Provider`] itself using `impl Future` return
//! types (not object-safe).

use crate::provider::{Provider, ProviderError, TextDeltaStream};
use crate::types::{EmbedRequest, EmbedResponse, GenerateRequest, GenerateResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Object-safe facade over [`Provider`]. Every `T: Provider` gets this
/// for free via the blanket impl below — callers never implement it
/// directly.
#[async_trait]
pub trait DynProvider: Send + Sync {
    /// See [`Provider::name`].
    fn name(&self) -> &str;
    /// See [`Provider::generate`].
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError>;
    /// See [`Provider::generate_stream`].
    async fn generate_stream(&self, request: GenerateRequest)
        -> Result<TextDeltaStream, ProviderError>;
    /// See [`Provider::embed`].
    async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, ProviderError>;
    /// See [`Provider::close`].
    async fn close(&self);
}

#[async_trait]
impl<T: Provider> DynProvider for T {
    fn name(&self) -> &str {
        Provider::name(self)
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        Provider::generate(self, request).await
    }

    async fn generate_stream(
        &self,
        request: GenerateRequest,
    ) -> Result<TextDeltaStream, ProviderError> {
        Provider::generate_stream(self, request).await
    }

    async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, ProviderError> {
        Provider::embed(self, request).await
    }

    async fn close(&self) {
        Provider::close(self).await
    }
}

/// A process-wide map of provider name to a cached, shared client.
/// Construction of each backend's HTTP client is comparatively
/// expensive (connection pools, TLS config) so the registry keeps one
/// instance per name rather than letting callers construct ad hoc.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn DynProvider>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under its own [`Provider::name`].
    pub fn register(&mut self, provider: Arc<dyn DynProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Look up a registered provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn DynProvider>> {
        self.providers.get(name).cloned()
    }

    /// Names of every registered provider, in no particular order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Close every registered provider. Idempotent, since
    /// [`DynProvider::close`] is — safe to call during shutdown even if a
    /// provider was already closed elsewhere.
    pub async fn close_all(&self) {
        for provider in self.providers.values() {
            provider.close().await;
        }
    }
}
