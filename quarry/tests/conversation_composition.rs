//! Verifies that `quarry-conversation` composes with the rest of the
//! pipeline behind the `conversation` feature, exercised through
//! `quarry::prelude` rather than through any single component crate
//! directly.

#![cfg(feature = "conversation")]

use quarry::prelude::*;
use quarry_conversation::SummarizationStrategy;
use quarry_retrieval::memory::InMemoryVectorStore;
use quarry_retrieval::rerank::NoopReranker;
use quarry_retrieval::types::VectorRecord;
use quarry_search::{ResolvedPipeline, StaticPipelineResolver};
use quarry_template::TemplateType;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

struct MockProvider;

impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        _request: quarry_provider::types::GenerateRequest,
    ) -> Result<quarry_provider::types::GenerateResponse, ProviderError> {
        Ok(quarry_provider::types::GenerateResponse {
            content: vec![quarry_provider::types::ContentPart::text("IBM's 2021 revenue was $57.4 billion.")],
            stop_reason: quarry_provider::types::StopReason::EndTurn,
            usage: quarry_provider::types::TokenUsage { input_tokens: 15, output_tokens: 6 },
            model: "mock".into(),
            cost: Decimal::ZERO,
        })
    }

    async fn embed(
        &self,
        request: quarry_provider::types::EmbedRequest,
    ) -> Result<quarry_provider::types::EmbedResponse, ProviderError> {
        Ok(quarry_provider::types::EmbedResponse {
            embeddings: request.input.iter().map(|_| vec![1.0, 0.0]).collect(),
            model: "mock-embed".into(),
            usage: quarry_provider::types::TokenUsage::default(),
            cost: Decimal::ZERO,
        })
    }
}

fn settings() -> Arc<Settings> {
    Arc::new(Settings {
        jwt_secret: "secret".into(),
        vector_store_host: "localhost".into(),
        vector_store_port: 6333,
        embedding_model_id: "mock-embed".into(),
        provider_credentials: HashMap::new(),
        chunking_strategy: "fixed_size".into(),
        min_chunk_size: 256,
        max_chunk_size: 1024,
        chunk_overlap: 64,
        retrieval_type: quarry_config::RetrievalKind::Vector,
        number_of_results: 3,
        vector_weight: 0.5,
        keyword_weight: 0.5,
        enable_reranking: false,
        reranker_type: "noop".into(),
        reranker_top_k: 3,
        cot_max_reasoning_depth: 3,
        cot_reasoning_strategy: "decomposition".into(),
        cot_token_budget_multiplier: 1.5,
        context_window_threshold: 0.8,
    })
}

async fn manager() -> ConversationManager {
    let mut providers = ProviderRegistry::new();
    providers.register(Arc::new(MockProvider));

    let store = InMemoryVectorStore::new();
    store.ensure_collection("filings", 2).await.unwrap();
    store
        .upsert("filings", vec![VectorRecord::new("f1", "IBM's 2021 revenue was $57.4 billion.", vec![1.0, 0.0])])
        .await
        .unwrap();

    let templates = Arc::new(TemplateRegistry::new());
    let mut template = PromptTemplate::new(
        TemplateId::new("rag-default"),
        UserId::new("system"),
        "default-rag",
        TemplateType::RagQuery,
        "Context:\n{context}\n\nQuestion: {question}",
        HashMap::from([("context".to_string(), String::new()), ("question".to_string(), String::new())]),
    )
    .unwrap();
    template.is_default = true;
    templates.put(template);

    let parameters = Arc::new(ParameterRegistry::new());
    let mut params = LlmParameters::new(ParameterSetId::new("default-params"), UserId::new("system"), "default", 1024, 0.7, 40, 0.9, None).unwrap();
    params.is_default = true;
    parameters.put(params);

    let resolver = StaticPipelineResolver::new();
    resolver.set_user_default(
        UserId::new("alice"),
        ResolvedPipeline {
            id: PipelineId::new("filings-pipeline"),
            embedding_provider: ProviderId::new("mock"),
            embedding_model: "mock-embed".into(),
            generation_provider: ProviderId::new("mock"),
            generation_model: "mock".into(),
            template_id: None,
            config_metadata: HashMap::new(),
        },
    );

    let search = Arc::new(SearchService::new(
        providers,
        Arc::new(store),
        Arc::new(NoopReranker),
        templates,
        parameters,
        Arc::new(resolver),
        HookRegistry::new(),
        None,
        settings(),
    ));

    ConversationManager::new(Arc::new(MemoryStore::new()), search, "mock")
}

#[tokio::test]
async fn ambiguous_follow_up_resolves_against_the_prior_turn_without_leaking_the_answer() {
    let manager = manager().await;
    let session = manager
        .create_session(SessionId::new("s1"), UserId::new("alice"), CollectionId::new("filings"), "ibm research", 4000)
        .await
        .unwrap();

    manager.process_user_message(&session.id, "m1", "m2", "what was IBM's revenue in 2021?").await.unwrap();

    let enhanced = manager.enhance_question(&session.id, "tell me more").await.unwrap();
    assert!(enhanced.contains("IBM's revenue in 2021"));
    assert!(!enhanced.contains("57.4"));
}

#[tokio::test]
async fn context_window_overflow_triggers_summarization_and_bounds_the_next_window() {
    let manager = manager().await;
    let session = manager
        .create_session(SessionId::new("s1"), UserId::new("alice"), CollectionId::new("filings"), "long chat", 500)
        .await
        .unwrap();

    for i in 0..40u64 {
        manager
            .add_message(
                &session.id,
                ConversationMessage::new(
                    format!("m{i}"),
                    session.id.clone(),
                    if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant },
                    MessageType::Question,
                    Content::text("a message about quarterly revenue filings and trends"),
                    i,
                ),
            )
            .await
            .unwrap();
    }

    let summary = manager
        .summarize_if_needed(&session.id, SummarizationStrategy::RecentPlusSummary, 5, "sum1")
        .await
        .unwrap()
        .expect("40 messages over a 500-token window should trigger a summary");

    assert!(summary.summarized_message_count >= 30);
    assert!(summary.tokens_saved > 0);

    let context = manager.get_context(&session.id, None).await.unwrap();
    assert!(context.total_tokens <= 500);
}
