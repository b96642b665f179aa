use async_trait::async_trait;
use layer0::content::Content;
use layer0::error::StageError;
use layer0::stage::{PipelineContext, Stage, StageOutcome};
use quarry_provider::params::ParameterRegistry;
use quarry_provider::registry::DynProvider;
use quarry_provider::types::{GenerateRequest, ProviderMessage, Role};
use quarry_template::{TemplateRegistry, TemplateType};
use std::collections::HashMap;
use std::sync::Arc;

/// Selects the RAG_QUERY template, assembles a context string from the
/// effective retrieved documents, renders the final prompt, and calls
/// generation. Fills in `ctx.answer` and accumulates token usage.
pub struct GenerationStage {
    templates: Arc<TemplateRegistry>,
    generate_provider: Arc<dyn DynProvider>,
    generation_model: String,
    parameters: Arc<ParameterRegistry>,
}

impl GenerationStage {
    /// Build a generation stage from its dependencies. Generation
    /// parameters (max tokens, temperature, top-k/p, repetition penalty)
    /// are resolved per-call from `parameters` rather than fixed here.
    pub fn new(
        templates: Arc<TemplateRegistry>,
        generate_provider: Arc<dyn DynProvider>,
        generation_model: impl Into<String>,
        parameters: Arc<ParameterRegistry>,
    ) -> Self {
        Self {
            templates,
            generate_provider,
            generation_model: generation_model.into(),
            parameters,
        }
    }

    fn assemble_context(ctx: &PipelineContext) -> String {
        ctx.effective_documents()
            .iter()
            .map(|doc| doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn assemble_reasoning(ctx: &PipelineContext) -> String {
        match &ctx.reasoning {
            Some(trace) => trace
                .steps
                .iter()
                .map(|step| format!("{}: {}", step.sub_question, step.sub_answer))
                .collect::<Vec<_>>()
                .join("\n"),
            None => String::new(),
        }
    }
}

#[async_trait]
impl Stage for GenerationStage {
    fn name(&self) -> &str {
        "generation"
    }

    async fn execute(&self, mut ctx: PipelineContext) -> Result<StageOutcome, StageError> {
        let template = self
            .templates
            .resolve(None, &ctx.user, TemplateType::RagQuery)
            .map_err(|e| StageError::ContextAssembly(e.to_string()))?;

        let mut variables = HashMap::new();
        variables.insert(
            "question".to_string(),
            serde_json::Value::String(ctx.effective_query().to_string()),
        );
        variables.insert(
            "context".to_string(),
            serde_json::Value::String(Self::assemble_context(&ctx)),
        );
        if template.input_variables.contains_key("reasoning") {
            variables.insert(
                "reasoning".to_string(),
                serde_json::Value::String(Self::assemble_reasoning(&ctx)),
            );
        }

        let rendered = template
            .render(&variables)
            .map_err(|e| StageError::ContextAssembly(e.to_string()))?;

        let parameter_id = ctx.config.as_ref().and_then(|c| c.parameter_id.as_ref());
        let params = self
            .parameters
            .resolve(parameter_id, &ctx.user)
            .map_err(|e| StageError::Provider(e.to_string()))?;

        let request = GenerateRequest::from_llm_parameters(
            self.generation_model.clone(),
            vec![ProviderMessage::text(Role::User, rendered.prompt)],
            &params,
        );
        let response = self
            .generate_provider
            .generate(request)
            .await
            .map_err(|e| StageError::Provider(e.to_string()))?;

        ctx.metadata.tokens_in += response.usage.input_tokens;
        ctx.metadata.tokens_out += response.usage.output_tokens;
        ctx.metadata.cost += response.cost;
        ctx.answer = Some(Content::text(response.text()));
        ctx.metadata.stages_completed += 1;

        Ok(StageOutcome::ok(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer0::id::{CollectionId, ParameterSetId, TemplateId, UserId};
    use layer0::stage::RetrievedDocument;
    use quarry_provider::params::LlmParameters;
    use quarry_provider::provider::{Provider, ProviderError};
    use quarry_provider::types::{ContentPart, EmbedRequest, EmbedResponse, GenerateResponse, StopReason, TokenUsage};
    use quarry_template::PromptTemplate;
    use rust_decimal::Decimal;

    struct StubProvider;

    impl Provider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
            Ok(GenerateResponse {
                content: vec![ContentPart::text("Rust has no garbage collector.")],
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 5,
                },
                model: "stub".into(),
                cost: Decimal::ZERO,
            })
        }

        async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, ProviderError> {
            Ok(EmbedResponse {
                embeddings: request.input.iter().map(|_| vec![0.0]).collect(),
                model: "stub-embed".into(),
                usage: TokenUsage::default(),
                cost: Decimal::ZERO,
            })
        }
    }

    fn registry_with_default_template() -> Arc<TemplateRegistry> {
        let registry = TemplateRegistry::new();
        let mut template = PromptTemplate::new(
            TemplateId::new("rag-default"),
            UserId::new("system"),
            "default-rag",
            TemplateType::RagQuery,
            "Context:\n{context}\n\nQuestion: {question}",
            HashMap::from([
                ("context".to_string(), String::new()),
                ("question".to_string(), String::new()),
            ]),
        )
        .unwrap();
        template.is_default = true;
        registry.put(template);
        Arc::new(registry)
    }

    fn registry_with_default_parameters() -> Arc<ParameterRegistry> {
        let registry = ParameterRegistry::new();
        let mut params = LlmParameters::new(
            ParameterSetId::new("default-params"),
            UserId::new("system"),
            "default",
            256,
            0.7,
            40,
            0.9,
            None,
        )
        .unwrap();
        params.is_default = true;
        registry.put(params);
        Arc::new(registry)
    }

    #[tokio::test]
    async fn generation_stage_sets_answer_and_token_usage() {
        let stage = GenerationStage::new(
            registry_with_default_template(),
            Arc::new(StubProvider),
            "stub",
            registry_with_default_parameters(),
        );
        let mut ctx = PipelineContext::new(UserId::new("u"), CollectionId::new("docs"), "does rust have a gc?");
        ctx.retrieved = vec![RetrievedDocument::new("doc-1", "Rust has no garbage collector.", 0.9)];

        let outcome = stage.execute(ctx).await.unwrap();
        assert!(outcome.success);
        let answer = outcome.context.answer.expect("answer set");
        assert_eq!(answer.as_text(), Some("Rust has no garbage collector."));
        assert_eq!(outcome.context.metadata.tokens_in, 10);
        assert_eq!(outcome.context.metadata.tokens_out, 5);
    }

    #[tokio::test]
    async fn generation_stage_errors_when_no_default_template() {
        let stage = GenerationStage::new(
            Arc::new(TemplateRegistry::new()),
            Arc::new(StubProvider),
            "stub",
            registry_with_default_parameters(),
        );
        let ctx = PipelineContext::new(UserId::new("u"), CollectionId::new("docs"), "q");
        let err = stage.execute(ctx).await.unwrap_err();
        assert!(matches!(err, StageError::ContextAssembly(_)));
    }

    #[tokio::test]
    async fn generation_stage_errors_when_no_default_parameters() {
        let stage = GenerationStage::new(
            registry_with_default_template(),
            Arc::new(StubProvider),
            "stub",
            Arc::new(ParameterRegistry::new()),
        );
        let mut ctx = PipelineContext::new(UserId::new("u"), CollectionId::new("docs"), "does rust have a gc?");
        ctx.retrieved = vec![RetrievedDocument::new("doc-1", "Rust has no garbage collector.", 0.9)];
        let err = stage.execute(ctx).await.unwrap_err();
        assert!(matches!(err, StageError::Provider(_)));
    }
}
