//! End-to-end RAG query against a real OpenAI-compatible provider.
//!
//! Embeds two short documents into an in-memory vector store, then asks
//! a question and prints the generated answer along with the documents
//! it drew on.
//!
//! Set OPENAI_API_KEY, then run:
//!   cargo run --example rag_query -p quarry --features "search,provider-openai"

use quarry::prelude::*;
use quarry_provider_openai::OpenAIProvider;
use quarry_retrieval::memory::InMemoryVectorStore;
use quarry_retrieval::rerank::NoopReranker;
use quarry_retrieval::types::VectorRecord;
use quarry_search::{ResolvedPipeline, SearchInput, StaticPipelineResolver};
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");

    let mut providers = ProviderRegistry::new();
    providers.register(Arc::new(OpenAIProvider::new(api_key)));

    let store = InMemoryVectorStore::new();
    store.ensure_collection("handbook", 1536).await?;

    let embed_model = "text-embedding-3-small";
    let provider = providers.get("openai").expect("just registered");
    for (id, text) in [
        ("pto-policy", "Employees accrue 1.5 days of paid time off per month."),
        ("remote-policy", "Remote work is approved on a per-team basis by the manager."),
    ] {
        let embedded = provider
            .embed(quarry_provider::types::EmbedRequest::single(embed_model, text))
            .await?;
        store
            .upsert("handbook", vec![VectorRecord::new(id, text, embedded.embeddings[0].clone())])
            .await?;
    }

    let templates = Arc::new(TemplateRegistry::new());
    let mut default_template = PromptTemplate::new(
        TemplateId::new("rag-default"),
        UserId::new("system"),
        "default-rag",
        quarry_template::TemplateType::RagQuery,
        "Answer the question using only the context below.\n\nContext:\n{context}\n\nQuestion: {question}",
        HashMap::from([("context".to_string(), String::new()), ("question".to_string(), String::new())]),
    )?;
    default_template.is_default = true;
    templates.put(default_template);

    let parameters = Arc::new(ParameterRegistry::new());
    let mut default_params = LlmParameters::new(
        ParameterSetId::new("default-params"),
        UserId::new("system"),
        "default",
        1024,
        0.7,
        40,
        0.9,
        None,
    )?;
    default_params.is_default = true;
    parameters.put(default_params);

    let resolver = StaticPipelineResolver::new();
    resolver.set_user_default(
        UserId::new("demo-user"),
        ResolvedPipeline {
            id: PipelineId::new("handbook-pipeline"),
            embedding_provider: ProviderId::new("openai"),
            embedding_model: embed_model.to_string(),
            generation_provider: ProviderId::new("openai"),
            generation_model: "gpt-4o-mini".to_string(),
            template_id: None,
            config_metadata: HashMap::new(),
        },
    );

    let service = SearchService::new(
        providers,
        Arc::new(store),
        Arc::new(NoopReranker),
        templates,
        parameters,
        Arc::new(resolver),
        HookRegistry::new(),
        None,
        Arc::new(quarry_config::Settings::from_env().unwrap_or_else(|_| demo_settings())),
    );

    let input = SearchInput::new("How much PTO do employees accrue per month?", CollectionId::new("handbook"), UserId::new("demo-user"));
    let output = service.search(input, None).await?;

    println!("Answer: {}", output.answer);
    println!("Sources:");
    for doc in &output.documents {
        println!("  - {}", doc.document_name);
    }

    Ok(())
}

fn demo_settings() -> quarry_config::Settings {
    quarry_config::Settings {
        jwt_secret: "demo".into(),
        vector_store_host: "localhost".into(),
        vector_store_port: 6333,
        embedding_model_id: "text-embedding-3-small".into(),
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
    }
}
