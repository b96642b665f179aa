use async_trait::async_trait;
use layer0::error::StageError;
use layer0::stage::{PipelineContext, Stage, StageOutcome};
use quarry_provider::registry::DynProvider;
use quarry_provider::types::{GenerateRequest, ProviderMessage, Role};
use serde::Deserialize;
use std::sync::Arc;

/// Computes classical IR metrics (hit-rate, MRR) when ground-truth
/// document ids were supplied via `ctx.extra["ground_truth_ids"]`, and
/// LLM-as-judge ratings (faithfulness, answer-relevance, context-relevance)
/// when a judge provider is configured and enabled. Neither kind of
/// metric is computed unless its precondition is met, per the
/// classical-only-with-ground-truth / judge-only-when-enabled defaults.
pub struct EvaluationStage {
    judge: Option<Arc<dyn DynProvider>>,
    judge_model: String,
}

impl EvaluationStage {
    /// An evaluation stage with no LLM-as-judge: only classical metrics run.
    pub fn classical_only() -> Self {
        Self {
            judge: None,
            judge_model: String::new(),
        }
    }

    /// An evaluation stage that also runs LLM-as-judge ratings.
    pub fn with_judge(judge: Arc<dyn DynProvider>, judge_model: impl Into<String>) -> Self {
        Self {
            judge: Some(judge),
            judge_model: judge_model.into(),
        }
    }

    fn classical_metrics(ctx: &PipelineContext) -> Option<serde_json::Value> {
        let ground_truth: Vec<String> = ctx
            .extra
            .get("ground_truth_ids")?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect();
        if ground_truth.is_empty() {
            return None;
        }

        let retrieved_ids: Vec<&str> = ctx.effective_documents().iter().map(|d| d.id.as_str()).collect();
        let hits = retrieved_ids.iter().filter(|id| ground_truth.iter().any(|g| g == *id)).count();
        let hit_rate = hits as f64 / ground_truth.len() as f64;

        let mrr = retrieved_ids
            .iter()
            .position(|id| ground_truth.iter().any(|g| g == id))
            .map(|rank| 1.0 / (rank + 1) as f64)
            .unwrap_or(0.0);

        Some(serde_json::json!({ "hit_rate": hit_rate, "mrr": mrr }))
    }

    async fn judge_metrics(&self, ctx: &PipelineContext) -> Result<Option<serde_json::Value>, StageError> {
        let Some(judge) = &self.judge else {
            return Ok(None);
        };
        let answer = ctx.answer.as_ref().and_then(|a| a.as_text()).unwrap_or_default();
        let context = ctx
            .effective_documents()
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Rate the following answer on three axes, each from 0.0 to 1.0, \
             and respond with only a JSON object {{\"faithfulness\": .., \"answer_relevance\": .., \"context_relevance\": ..}}.\n\n\
             Question: {}\nContext: {context}\nAnswer: {answer}",
            ctx.effective_query(),
        );
        let request = GenerateRequest::new(self.judge_model.clone(), vec![ProviderMessage::text(Role::User, prompt)], 128);
        let response = judge.generate(request).await.map_err(|e| StageError::Provider(e.to_string()))?;

        #[derive(Deserialize)]
        struct JudgeRatings {
            faithfulness: f64,
            answer_relevance: f64,
            context_relevance: f64,
        }

        match serde_json::from_str::<JudgeRatings>(&response.text()) {
            Ok(ratings) => Ok(Some(serde_json::json!({
                "faithfulness": ratings.faithfulness,
                "answer_relevance": ratings.answer_relevance,
                "context_relevance": ratings.context_relevance,
            }))),
            Err(_) => {
                tracing::warn!("llm-as-judge response was not parseable JSON, skipping judge metrics");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Stage for EvaluationStage {
    fn name(&self) -> &str {
        "evaluation"
    }

    async fn execute(&self, mut ctx: PipelineContext) -> Result<StageOutcome, StageError> {
        let classical = Self::classical_metrics(&ctx);
        let judged = self.judge_metrics(&ctx).await?;

        let mut metrics = serde_json::Map::new();
        if let Some(serde_json::Value::Object(map)) = classical {
            metrics.extend(map);
        }
        if let Some(serde_json::Value::Object(map)) = judged {
            metrics.extend(map);
        }

        ctx.evaluation = Some(serde_json::Value::Object(metrics));
        ctx.metadata.stages_completed += 1;

        Ok(StageOutcome::ok(ctx))
    }
}
