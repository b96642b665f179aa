#![deny(missing_docs)]
//! # quarry — umbrella crate
//!
//! Single import surface for the quarry retrieval-augmented generation
//! pipeline. Re-exports each component crate behind a feature flag, plus
//! a `prelude` module for the common case of wiring a full pipeline.

#[cfg(feature = "core")]
pub use layer0;
#[cfg(feature = "core")]
pub use quarry_config;
#[cfg(feature = "provider")]
pub use quarry_context;
#[cfg(feature = "conversation")]
pub use quarry_conversation;
#[cfg(feature = "cot")]
pub use quarry_cot;
#[cfg(feature = "hooks")]
pub use quarry_hooks;
#[cfg(feature = "pipeline")]
pub use quarry_pipeline;
#[cfg(feature = "provider")]
pub use quarry_provider;
#[cfg(feature = "provider-anthropic")]
pub use quarry_provider_anthropic;
#[cfg(feature = "provider-granite")]
pub use quarry_provider_granite;
#[cfg(feature = "provider-ollama")]
pub use quarry_provider_ollama;
#[cfg(feature = "provider-openai")]
pub use quarry_provider_openai;
#[cfg(feature = "retrieval")]
pub use quarry_retrieval;
#[cfg(feature = "core")]
pub use quarry_rewrite;
#[cfg(feature = "search")]
pub use quarry_search;
#[cfg(feature = "store-fs")]
pub use quarry_store_fs;
#[cfg(feature = "store-memory")]
pub use quarry_store_memory;
#[cfg(feature = "template")]
pub use quarry_template;
#[cfg(feature = "core")]
pub use quarry_tokens;

/// Happy-path imports for composing a quarry search pipeline.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use layer0::{
        CollectionId, Content, Effect, ParameterSetId, PipelineContext, PipelineId, ProviderId,
        RetrievedDocument, Scope, SessionId, Stage, StageOutcome, StateReader, StateStore,
        TemplateId, UserId,
    };

    #[cfg(feature = "core")]
    pub use quarry_config::Settings;

    #[cfg(feature = "hooks")]
    pub use quarry_hooks::HookRegistry;

    #[cfg(feature = "provider")]
    pub use quarry_provider::{
        params::{LlmParameters, ParameterRegistry},
        provider::{Provider, ProviderError},
        registry::ProviderRegistry,
    };

    #[cfg(feature = "retrieval")]
    pub use quarry_retrieval::{rerank::Reranker, store::VectorStore};

    #[cfg(feature = "template")]
    pub use quarry_template::{PromptTemplate, TemplateRegistry};

    #[cfg(feature = "cot")]
    pub use quarry_cot::{CotConfig, CotEngine};

    #[cfg(feature = "pipeline")]
    pub use quarry_pipeline::{PipelineError, PipelineExecutor};

    #[cfg(feature = "search")]
    pub use quarry_search::{SearchError, SearchInput, SearchOutput, SearchService};

    #[cfg(feature = "conversation")]
    pub use quarry_conversation::{
        ConversationManager, ConversationMessage, ConversationSession, ConversationSummary, MessageRole, MessageType,
    };

    #[cfg(feature = "store-memory")]
    pub use quarry_store_memory::MemoryStore;

    #[cfg(feature = "store-fs")]
    pub use quarry_store_fs::FsStore;
}
