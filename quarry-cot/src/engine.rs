use crate::complexity::Complexity;
use crate::llm_classify::classify_via_llm;
use crate::llm_decompose::decompose_via_llm;
use crate::summarize::key_points_only;
use async_trait::async_trait;
use layer0::error::StageError;
use layer0::stage::{PipelineContext, ReasoningStep, ReasoningTrace, RetrievedDocument, Stage, StageOutcome};
use quarry_provider::registry::DynProvider;
use quarry_provider::types::{EmbedRequest, GenerateRequest, ProviderMessage, Role, StopReason};
use quarry_retrieval::store::VectorStore;
use quarry_template::TemplateRegistry;
use std::sync::Arc;

/// Construction-time configuration for [`CotEngine`].
#[derive(Debug, Clone)]
pub struct CotConfig {
    /// Embedding model used to embed each decomposed sub-question.
    pub embedding_model: String,
    /// Generation model used to answer each sub-question.
    pub generation_model: String,
    /// Maximum number of sub-questions to decompose a query into.
    pub max_reasoning_depth: u32,
    /// Multiplier applied to `base_max_tokens` for each sub-question call.
    pub token_budget_multiplier: f64,
    /// Base max-new-tokens per sub-question call before the multiplier.
    pub base_max_tokens: u32,
    /// Context window, in tokens, above which prior answers get summarized.
    pub context_window_tokens: u64,
    /// Number of passages to retrieve per sub-question.
    pub retrieval_k: usize,
}

impl Default for CotConfig {
    fn default() -> Self {
        Self {
            embedding_model: "text-embedding-3-small".into(),
            generation_model: "gpt-4o-mini".into(),
            max_reasoning_depth: 3,
            token_budget_multiplier: 1.5,
            base_max_tokens: 512,
            context_window_tokens: 8192,
            retrieval_k: 5,
        }
    }
}

/// Chain-of-thought engine: decomposes a complex query into ordered
/// sub-questions, answers each with its own retrieval pass while
/// threading prior answers forward, and leaves the accumulated
/// [`ReasoningTrace`] for the generation stage to draw on.
///
/// Implements [`Stage`] directly (`name() == "reasoning"`) so the
/// pipeline executor treats it like any other stage. Simple queries are
/// a no-op: `execute` returns the context unchanged with `reasoning` left
/// `None`.
pub struct CotEngine {
    vector_store: Arc<dyn VectorStore>,
    embed_provider: Arc<dyn DynProvider>,
    generate_provider: Arc<dyn DynProvider>,
    templates: Arc<TemplateRegistry>,
    config: CotConfig,
}

impl CotEngine {
    /// Build a chain-of-thought engine from its dependencies and config.
    ///
    /// `templates` supplies the `CLASSIFICATION`/`DECOMPOSITION` templates
    /// used to drive question classification and sub-question generation
    /// via the LLM; when neither is configured for a caller, the engine
    /// falls back to the lexical heuristics in [`crate::complexity`] and
    /// [`crate::decompose`].
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embed_provider: Arc<dyn DynProvider>,
        generate_provider: Arc<dyn DynProvider>,
        templates: Arc<TemplateRegistry>,
        config: CotConfig,
    ) -> Self {
        Self {
            vector_store,
            embed_provider,
            generate_provider,
            templates,
            config,
        }
    }

    fn max_tokens_for_step(&self) -> u32 {
        (self.config.base_max_tokens as f64 * self.config.token_budget_multiplier).floor() as u32
    }

    fn build_prompt(sub_question: &str, previous_answers: &[String], documents: &[RetrievedDocument]) -> String {
        let mut prompt = String::new();
        if !previous_answers.is_empty() {
            prompt.push_str("Prior findings:\n");
            for (i, answer) in previous_answers.iter().enumerate() {
                prompt.push_str(&format!("{}. {answer}\n", i + 1));
            }
            prompt.push('\n');
        }
        if !documents.is_empty() {
            prompt.push_str("Retrieved context:\n");
            for doc in documents {
                prompt.push_str(&format!("- {}\n", doc.content));
            }
            prompt.push('\n');
        }
        prompt.push_str("Question: ");
        prompt.push_str(sub_question);
        prompt
    }

    async fn answer_sub_question(
        &self,
        collection: &str,
        sub_question: &str,
        previous_answers: &[String],
    ) -> Result<ReasoningStep, StageError> {
        let embed_request = EmbedRequest::single(&self.config.embedding_model, sub_question);
        let embed_response = self
            .embed_provider
            .embed(embed_request)
            .await
            .map_err(|e| StageError::Provider(e.to_string()))?;
        let vector = embed_response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| StageError::Provider("embedding response was empty".into()))?;

        let hits = self
            .vector_store
            .search(collection, &vector, self.config.retrieval_k, None)
            .await
            .map_err(|e| StageError::Retrieval(e.to_string()))?;

        let documents: Vec<RetrievedDocument> = hits
            .into_iter()
            .map(|hit| RetrievedDocument::new(hit.id, hit.text, hit.score))
            .collect();

        let mut effective_previous = previous_answers.to_vec();
        let mut prompt = Self::build_prompt(sub_question, &effective_previous, &documents);
        let budget = quarry_tokens::check_budget(
            quarry_tokens::estimate_tokens(&prompt, &self.config.generation_model),
            self.config.context_window_tokens,
        );
        if budget.is_some() {
            tracing::debug!(sub_question, "reasoning prompt near context window, summarizing prior answers");
            effective_previous = key_points_only(&effective_previous);
            prompt = Self::build_prompt(sub_question, &effective_previous, &documents);
        }

        let request = GenerateRequest::new(
            self.config.generation_model.clone(),
            vec![ProviderMessage::text(Role::User, prompt)],
            self.max_tokens_for_step(),
        );
        let response = self
            .generate_provider
            .generate(request)
            .await
            .map_err(|e| StageError::Provider(e.to_string()))?;

        let sub_answer = response.text();
        let confidence = if response.stop_reason == StopReason::EndTurn && !sub_answer.trim().is_empty() {
            0.9
        } else {
            0.5
        };

        Ok(ReasoningStep {
            sub_question: sub_question.to_string(),
            sub_answer,
            supporting_documents: documents,
            confidence,
        })
    }
}

#[async_trait]
impl Stage for CotEngine {
    fn name(&self) -> &str {
        "reasoning"
    }

    async fn execute(&self, mut ctx: PipelineContext) -> Result<StageOutcome, StageError> {
        let query = ctx.effective_query().to_string();

        let complexity = classify_via_llm(
            &self.templates,
            self.generate_provider.as_ref(),
            &self.config.generation_model,
            &ctx.user,
            &query,
        )
        .await;

        if complexity == Complexity::Simple {
            ctx.metadata.stages_completed += 1;
            return Ok(StageOutcome::ok(ctx));
        }

        let max_depth = ctx
            .config
            .as_ref()
            .and_then(|c| c.max_reasoning_depth)
            .unwrap_or(self.config.max_reasoning_depth);
        let sub_questions = decompose_via_llm(
            &self.templates,
            self.generate_provider.as_ref(),
            &self.config.generation_model,
            &ctx.user,
            &query,
            max_depth,
        )
        .await;

        let mut steps = Vec::with_capacity(sub_questions.len());
        let mut previous_answers = Vec::with_capacity(sub_questions.len());
        let mut aborted = false;

        for sub_question in &sub_questions {
            let step = match self.answer_sub_question(ctx.collection.as_str(), sub_question, &previous_answers).await {
                Ok(step) => step,
                Err(first_err) => {
                    tracing::warn!(sub_question = %sub_question, error = %first_err, "reasoning step failed, retrying once");
                    match self.answer_sub_question(ctx.collection.as_str(), sub_question, &previous_answers).await {
                        Ok(step) => step,
                        Err(second_err) => {
                            tracing::warn!(
                                sub_question = %sub_question,
                                error = %second_err,
                                "reasoning step failed twice, aborting CoT in favor of single-shot generation"
                            );
                            aborted = true;
                            break;
                        }
                    }
                }
            };
            previous_answers.push(step.sub_answer.clone());
            steps.push(step);
        }

        ctx.metadata.stages_completed += 1;

        if aborted {
            ctx.reasoning = None;
            return Ok(StageOutcome::ok(ctx));
        }

        let total_confidence = steps
            .iter()
            .map(|s| s.confidence)
            .fold(1.0_f64, f64::min);

        ctx.reasoning = Some(ReasoningTrace {
            steps,
            total_confidence,
        });

        Ok(StageOutcome::ok(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer0::id::{CollectionId, UserId};
    use quarry_provider::provider::{Provider, ProviderError};
    use quarry_provider::types::{ContentPart, EmbedResponse, GenerateResponse, TokenUsage};
    use quarry_retrieval::memory::InMemoryVectorStore;
    use quarry_retrieval::types::VectorRecord;
    use rust_decimal::Decimal;

    struct StubProvider {
        text: String,
    }

    impl Provider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
            Ok(GenerateResponse {
                content: vec![ContentPart::text(self.text.clone())],
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
                model: "stub".into(),
                cost: Decimal::ZERO,
            })
        }

        async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, ProviderError> {
            Ok(EmbedResponse {
                embeddings: request.input.iter().map(|_| vec![1.0, 0.0]).collect(),
                model: "stub-embed".into(),
                usage: TokenUsage::default(),
                cost: Decimal::ZERO,
            })
        }
    }

    async fn seeded_store() -> Arc<dyn VectorStore> {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("docs", 2).await.unwrap();
        store
            .upsert(
                "docs",
                vec![VectorRecord::new("doc-1", "Rust has no garbage collector.", vec![1.0, 0.0])],
            )
            .await
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn simple_query_is_a_no_op() {
        let engine = CotEngine::new(
            seeded_store().await,
            Arc::new(StubProvider { text: "answer".into() }),
            Arc::new(StubProvider { text: "answer".into() }),
            Arc::new(TemplateRegistry::new()),
            CotConfig::default(),
        );
        let ctx = PipelineContext::new(UserId::new("u"), CollectionId::new("docs"), "What is Rust?");
        let outcome = engine.execute(ctx).await.unwrap();
        assert!(outcome.success);
        assert!(outcome.context.reasoning.is_none());
    }

    #[tokio::test]
    async fn complex_query_decomposes_and_threads_answers() {
        let engine = CotEngine::new(
            seeded_store().await,
            Arc::new(StubProvider { text: "sub answer".into() }),
            Arc::new(StubProvider { text: "sub answer".into() }),
            Arc::new(TemplateRegistry::new()),
            CotConfig::default(),
        );
        let ctx = PipelineContext::new(
            UserId::new("u"),
            CollectionId::new("docs"),
            "What is ownership and how does borrowing work?",
        );
        let outcome = engine.execute(ctx).await.unwrap();
        assert!(outcome.success);
        let trace = outcome.context.reasoning.expect("reasoning trace");
        assert_eq!(trace.steps.len(), 2);
        assert_eq!(trace.total_confidence, 0.9);
        assert!(!trace.steps[0].supporting_documents.is_empty());
    }

    #[test]
    fn stage_name_is_reasoning() {
        // compile-time + runtime check without constructing providers
        fn assert_stage<T: Stage>() {}
        assert_stage::<CotEngine>();
    }

    struct FlakyProvider {
        failures_remaining: std::sync::atomic::AtomicU32,
    }

    impl Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
            if self.failures_remaining.load(std::sync::atomic::Ordering::SeqCst) > 0 {
                self.failures_remaining.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
                return Err(ProviderError::RequestFailed("transient".into()));
            }
            Ok(GenerateResponse {
                content: vec![ContentPart::text("recovered answer")],
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
                model: "flaky".into(),
                cost: Decimal::ZERO,
            })
        }

        async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, ProviderError> {
            Ok(EmbedResponse {
                embeddings: request.input.iter().map(|_| vec![1.0, 0.0]).collect(),
                model: "flaky-embed".into(),
                usage: TokenUsage::default(),
                cost: Decimal::ZERO,
            })
        }
    }

    #[tokio::test]
    async fn a_step_that_fails_once_is_retried_and_recovers() {
        let generate_provider = Arc::new(FlakyProvider {
            failures_remaining: std::sync::atomic::AtomicU32::new(1),
        });
        let engine = CotEngine::new(
            seeded_store().await,
            Arc::new(StubProvider { text: "embed-ok".into() }),
            generate_provider,
            Arc::new(TemplateRegistry::new()),
            CotConfig::default(),
        );
        let ctx = PipelineContext::new(
            UserId::new("u"),
            CollectionId::new("docs"),
            "What is ownership and how does borrowing work?",
        );
        let outcome = engine.execute(ctx).await.unwrap();
        assert!(outcome.success);
        let trace = outcome.context.reasoning.expect("reasoning trace survives one retry");
        assert_eq!(trace.steps[0].sub_answer, "recovered answer");
    }

    #[tokio::test]
    async fn a_step_that_fails_twice_aborts_cot_in_favor_of_single_shot() {
        let generate_provider = Arc::new(FlakyProvider {
            failures_remaining: std::sync::atomic::AtomicU32::new(u32::MAX),
        });
        let engine = CotEngine::new(
            seeded_store().await,
            Arc::new(StubProvider { text: "embed-ok".into() }),
            generate_provider,
            Arc::new(TemplateRegistry::new()),
            CotConfig::default(),
        );
        let ctx = PipelineContext::new(
            UserId::new("u"),
            CollectionId::new("docs"),
            "What is ownership and how does borrowing work?",
        );
        let outcome = engine.execute(ctx).await.unwrap();
        assert!(outcome.success, "abort falls back to single-shot rather than failing the stage");
        assert!(outcome.context.reasoning.is_none());
    }
}
