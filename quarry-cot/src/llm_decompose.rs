//! LLM-driven query decomposition, with the lexical heuristic in
//! [`crate::decompose`] as its fallback.

use crate::decompose::decompose_query;
use layer0::id::UserId;
use quarry_provider::registry::DynProvider;
use quarry_provider::types::{GenerateRequest, ProviderMessage, Role};
use quarry_template::{TemplateRegistry, TemplateType};
use std::collections::HashMap;

const DECOMPOSITION_MAX_TOKENS: u32 = 256;

/// Ask the LLM to split `question` into an ordered list of sub-questions
/// bounded by `max_depth`, using a dedicated `DECOMPOSITION` template and a
/// model call against `provider`. Falls back to the lexical splitter in
/// [`crate::decompose::decompose_query`] when no such template is
/// configured for `user`, the call fails, or the response doesn't parse
/// into a non-empty list.
pub async fn decompose_via_llm(
    templates: &TemplateRegistry,
    provider: &dyn DynProvider,
    model: &str,
    user: &UserId,
    question: &str,
    max_depth: u32,
) -> Vec<String> {
    match try_decompose(templates, provider, model, user, question, max_depth).await {
        Some(sub_questions) => sub_questions,
        None => {
            tracing::debug!(question, "LLM decomposition unavailable, using lexical splitter");
            decompose_query(question, max_depth)
        }
    }
}

async fn try_decompose(
    templates: &TemplateRegistry,
    provider: &dyn DynProvider,
    model: &str,
    user: &UserId,
    question: &str,
    max_depth: u32,
) -> Option<Vec<String>> {
    let template = templates.resolve(None, user, TemplateType::Decomposition).ok()?;

    let mut variables = HashMap::new();
    variables.insert("question".to_string(), serde_json::Value::String(question.to_string()));
    if template.input_variables.contains_key("max_depth") {
        variables.insert("max_depth".to_string(), serde_json::Value::Number(max_depth.into()));
    }
    let rendered = template.render(&variables).ok()?;

    let request = GenerateRequest::new(model.to_string(), vec![ProviderMessage::text(Role::User, rendered.prompt)], DECOMPOSITION_MAX_TOKENS);
    let response = provider.generate(request).await.ok()?;

    let mut sub_questions = parse_json_array(&response.text())?;
    if sub_questions.is_empty() {
        return None;
    }
    sub_questions.truncate(max_depth.max(1) as usize);
    Some(sub_questions)
}

fn parse_json_array(text: &str) -> Option<Vec<String>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    serde_json::from_str(&text[start..=end]).ok()
}
