//! Response DTO for [`crate::SearchService::search`].

use layer0::duration::DurationMs;
use layer0::stage::{PipelineContext, ReasoningTrace, RetrievedDocument};
use serde::Serialize;
use std::collections::HashMap;

/// One source document cited in the answer.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRef {
    /// Human-readable source label — the document's `source` tag if
    /// retrieval set one, otherwise its chunk id.
    pub document_name: String,
    /// Optional display title, read from the chunk's `metadata.title` field.
    pub title: Option<String>,
    /// Passthrough metadata carried from retrieval.
    pub metadata: Option<serde_json::Value>,
}

impl From<&RetrievedDocument> for DocumentRef {
    fn from(doc: &RetrievedDocument) -> Self {
        let title = doc
            .metadata
            .get("title")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        Self {
            document_name: doc.source.clone().unwrap_or_else(|| doc.id.clone()),
            title,
            metadata: (!doc.metadata.is_null()).then(|| doc.metadata.clone()),
        }
    }
}

/// One retrieved chunk, with its relevance score.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// The chunk's id in the vector store.
    pub chunk_id: String,
    /// The chunk's text.
    pub text: String,
    /// Relevance score (post-reranking if reranking ran).
    pub score: f64,
}

impl From<&RetrievedDocument> for QueryResult {
    fn from(doc: &RetrievedDocument) -> Self {
        Self {
            chunk_id: doc.id.clone(),
            text: doc.content.clone(),
            score: doc.score,
        }
    }
}

/// Execution metadata describing how the answer was produced.
#[derive(Debug, Clone, Serialize)]
pub struct SearchMetadata {
    /// Whether chain-of-thought decomposition ran for this query.
    pub cot_used: bool,
    /// The reasoning strategy used, if CoT ran.
    pub reasoning_strategy: Option<String>,
    /// Total input + output tokens consumed across every stage.
    pub token_usage: u64,
    /// Wall-clock time for the whole run.
    pub execution_time: DurationMs,
}

/// The result of a [`crate::SearchService::search`] call.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutput {
    /// The generated answer text.
    pub answer: String,
    /// Source documents the answer drew on.
    pub documents: Vec<DocumentRef>,
    /// Raw retrieved/reranked chunks with scores.
    pub query_results: Vec<QueryResult>,
    /// The query after rewrite, if rewrite ran.
    pub rewritten_query: Option<String>,
    /// Evaluation metric name -> value.
    pub evaluation: HashMap<String, f64>,
    /// The chain-of-thought trace, if reasoning ran for this query.
    pub cot_output: Option<ReasoningTrace>,
    pub metadata: SearchMetadata,
}

impl SearchOutput {
    pub(crate) fn from_context(ctx: PipelineContext, execution_time: DurationMs) -> Self {
        let documents = ctx.effective_documents().iter().map(DocumentRef::from).collect();
        let query_results = ctx.effective_documents().iter().map(QueryResult::from).collect();

        let evaluation = ctx
            .evaluation
            .as_ref()
            .and_then(serde_json::Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
                    .collect()
            })
            .unwrap_or_default();

        let cot_used = ctx.reasoning.is_some();
        let reasoning_strategy = cot_used.then(|| "decomposition".to_string());

        Self {
            answer: ctx.answer.as_ref().and_then(|c| c.as_text()).unwrap_or_default().to_string(),
            documents,
            query_results,
            rewritten_query: ctx.rewritten_query.clone(),
            evaluation,
            cot_output: ctx.reasoning.clone(),
            metadata: SearchMetadata {
                cot_used,
                reasoning_strategy,
                token_usage: ctx.metadata.tokens_in + ctx.metadata.tokens_out,
                execution_time,
            },
        }
    }
}
