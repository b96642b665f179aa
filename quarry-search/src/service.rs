//! [`SearchService`] — the facade that resolves a pipeline, wires the
//! stage sequence, and runs it end to end for one request.

use crate::error::SearchError;
use crate::input::{SearchContext, SearchInput};
use crate::output::SearchOutput;
use crate::resolver::{PipelineResolver, ResolvedPipeline};
use layer0::duration::DurationMs;
use layer0::stage::{PipelineContext, Stage};
use layer0::state::StateStore;
use quarry_config::Settings;
use quarry_cot::{CotConfig, CotEngine};
use quarry_hooks::HookRegistry;
use quarry_pipeline::stages::{EvaluationStage, GenerationStage, RerankingStage, RetrievalStage, RewriteStage};
use quarry_pipeline::PipelineExecutor;
use quarry_provider::params::ParameterRegistry;
use quarry_provider::registry::{DynProvider, ProviderRegistry};
use quarry_retrieval::rerank::Reranker;
use quarry_retrieval::store::VectorStore;
use quarry_template::TemplateRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The facade described by spec.md §4.K: resolves the pipeline for
/// `(user, collection)`, builds the canonical stage sequence from it,
/// and runs the whole thing through `quarry_pipeline::PipelineExecutor`.
///
/// Every dependency is injected at construction — no global state, no
/// lazily-constructed singletons — matching the teacher's
/// explicit-dependency-injection constructors (`ReactOperator::new(provider,
/// tools, ..., config)`).
pub struct SearchService {
    providers: ProviderRegistry,
    vector_store: Arc<dyn VectorStore>,
    reranker: Arc<dyn Reranker>,
    templates: Arc<TemplateRegistry>,
    parameters: Arc<ParameterRegistry>,
    resolver: Arc<dyn PipelineResolver>,
    hooks: HookRegistry,
    state: Option<Arc<dyn StateStore>>,
    settings: Arc<Settings>,
}

impl SearchService {
    /// Build a search service from its dependencies.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        providers: ProviderRegistry,
        vector_store: Arc<dyn VectorStore>,
        reranker: Arc<dyn Reranker>,
        templates: Arc<TemplateRegistry>,
        parameters: Arc<ParameterRegistry>,
        resolver: Arc<dyn PipelineResolver>,
        hooks: HookRegistry,
        state: Option<Arc<dyn StateStore>>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            providers,
            vector_store,
            reranker,
            templates,
            parameters,
            resolver,
            hooks,
            state,
            settings,
        }
    }

    /// Run one search request end to end.
    pub async fn search(&self, input: SearchInput, context: Option<SearchContext>) -> Result<SearchOutput, SearchError> {
        let correlation_id = context.and_then(|c| c.correlation_id);

        if input.trimmed_question().is_empty() {
            return Err(SearchError::ValidationError("question must not be empty".into()));
        }

        let resolved = self
            .resolver
            .resolve(&input.user_id, &input.collection_id)
            .await
            .ok_or_else(|| {
                SearchError::ConfigurationMissing(format!(
                    "no pipeline configured for user {} (collection {})",
                    input.user_id, input.collection_id
                ))
            })?;

        let embed_provider = self.lookup_provider(&resolved.embedding_provider)?;
        let generate_provider = self.lookup_provider(&resolved.generation_provider)?;

        let metadata = merged_metadata(&resolved, &input);

        let retrieval_k = quarry_config::resolve("number_of_results", &metadata, Some(self.settings.number_of_results), 5);
        let enable_reranking = quarry_config::resolve("enable_reranking", &metadata, Some(self.settings.enable_reranking), false);
        let reranker_top_k = quarry_config::resolve("reranker_top_k", &metadata, Some(self.settings.reranker_top_k), retrieval_k);
        let cot_max_reasoning_depth =
            quarry_config::resolve("cot_max_reasoning_depth", &metadata, Some(self.settings.cot_max_reasoning_depth), 3);
        let cot_token_budget_multiplier = quarry_config::resolve(
            "cot_token_budget_multiplier",
            &metadata,
            Some(self.settings.cot_token_budget_multiplier),
            1.5,
        );
        let deadline_secs: u64 = quarry_config::resolve("pipeline_timeout_secs", &metadata, None, 60);

        tracing::debug!(
            user = %input.user_id,
            collection = %input.collection_id,
            pipeline = %resolved.id,
            correlation_id = correlation_id.as_deref().unwrap_or("none"),
            "initializing pipeline run"
        );

        let cot_config = CotConfig {
            embedding_model: resolved.embedding_model.clone(),
            generation_model: resolved.generation_model.clone(),
            max_reasoning_depth: cot_max_reasoning_depth,
            token_budget_multiplier: cot_token_budget_multiplier,
            ..CotConfig::default()
        };

        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(RewriteStage::new()),
            Arc::new(RetrievalStage::new(
                self.vector_store.clone(),
                embed_provider.clone(),
                resolved.embedding_model.clone(),
                retrieval_k,
            )),
            Arc::new(RerankingStage::new(self.reranker.clone(), reranker_top_k, enable_reranking)),
            Arc::new(CotEngine::new(
                self.vector_store.clone(),
                embed_provider,
                generate_provider.clone(),
                self.templates.clone(),
                cot_config,
            )),
            Arc::new(GenerationStage::new(
                self.templates.clone(),
                generate_provider,
                resolved.generation_model.clone(),
                self.parameters.clone(),
            )),
            Arc::new(EvaluationStage::classical_only()),
        ];

        let executor = PipelineExecutor::new(stages, self.hooks.clone(), self.state.clone(), Duration::from_secs(deadline_secs));

        let ctx = PipelineContext::new(input.user_id.clone(), input.collection_id.clone(), input.question.trim());

        let started = Instant::now();
        let result = executor.run(ctx).await?;
        let execution_time = DurationMs::from(started.elapsed());

        Ok(SearchOutput::from_context(result, execution_time))
    }

    fn lookup_provider(&self, name: &layer0::id::ProviderId) -> Result<Arc<dyn DynProvider>, SearchError> {
        self.providers
            .get(name.as_str())
            .ok_or_else(|| SearchError::ConfigurationMissing(format!("provider '{name}' is not registered")))
    }
}

fn merged_metadata(resolved: &ResolvedPipeline, input: &SearchInput) -> HashMap<String, serde_json::Value> {
    let mut metadata = resolved.config_metadata.clone();
    if let Some(overrides) = &input.config_metadata {
        metadata.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    metadata
}
