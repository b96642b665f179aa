//! Static configuration for a provider client.

/// Static configuration for a [`crate::Provider`] implementation.
///
/// Per-run overrides come from `PipelineContext.config` (layer0's
/// [`layer0::StageConfig`]); this struct holds the defaults those
/// overrides fall back to.
pub struct ProviderConfig {
    /// Base system prompt prepended to every generation call.
    pub system_prompt: String,

    /// Default chat-completion model identifier.
    pub default_model: String,

    /// Default embedding model identifier.
    pub default_embedding_model: String,

    /// Default maximum output tokens per generation call.
    pub default_max_tokens: u32,

    /// Maximum number of concurrent in-flight requests to this provider,
    /// used by [`crate::batch::embed_batched`].
    pub max_concurrency: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant answering questions grounded in the \
                            provided documents."
                .into(),
            default_model: String::new(),
            default_embedding_model: String::new(),
            default_max_tokens: 1024,
            max_concurrency: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = ProviderConfig::default();
        assert!(config.default_model.is_empty());
        assert_eq!(config.default_max_tokens, 1024);
        assert_eq!(config.max_concurrency, 8);
    }

    #[test]
    fn custom_config_values() {
        let config = ProviderConfig {
            system_prompt: "Custom prompt".into(),
            default_model: "gpt-4o".into(),
            default_embedding_model: "text-embedding-3-small".into(),
            default_max_tokens: 2048,
            max_concurrency: 4,
        };
        assert_eq!(config.system_prompt, "Custom prompt");
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.max_concurrency, 4);
    }
}
