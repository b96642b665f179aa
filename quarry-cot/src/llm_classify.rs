//! LLM-driven question classification, with the lexical heuristic in
//! [`crate::complexity`] as its fallback.

use crate::complexity::{classify, Complexity};
use layer0::id::UserId;
use quarry_provider::registry::DynProvider;
use quarry_provider::types::{GenerateRequest, ProviderMessage, Role};
use quarry_template::{TemplateRegistry, TemplateType};
use std::collections::HashMap;

#[derive(Debug, serde::Deserialize)]
struct ClassificationResponse {
    #[serde(default)]
    needs_decomposition: Option<bool>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

const CLASSIFICATION_MAX_TOKENS: u32 = 64;

/// Classify `question` using a dedicated `CLASSIFICATION` template and a
/// model call against `provider`. Falls back to the lexical heuristic in
/// [`crate::complexity::classify`] when no such template is configured for
/// `user`, the call fails, or the response doesn't parse.
pub async fn classify_via_llm(
    templates: &TemplateRegistry,
    provider: &dyn DynProvider,
    model: &str,
    user: &UserId,
    question: &str,
) -> Complexity {
    match try_classify(templates, provider, model, user, question).await {
        Some(complexity) => complexity,
        None => {
            tracing::debug!(question, "LLM classification unavailable, using lexical heuristic");
            classify(question)
        }
    }
}

async fn try_classify(
    templates: &TemplateRegistry,
    provider: &dyn DynProvider,
    model: &str,
    user: &UserId,
    question: &str,
) -> Option<Complexity> {
    let template = templates.resolve(None, user, TemplateType::Classification).ok()?;

    let mut variables = HashMap::new();
    variables.insert("question".to_string(), serde_json::Value::String(question.to_string()));
    let rendered = template.render(&variables).ok()?;

    let request = GenerateRequest::new(model.to_string(), vec![ProviderMessage::text(Role::User, rendered.prompt)], CLASSIFICATION_MAX_TOKENS);
    let response = provider.generate(request).await.ok()?;

    let parsed: ClassificationResponse = parse_json_object(&response.text())?;
    let needs_decomposition = parsed.needs_decomposition.unwrap_or_else(|| {
        matches!(parsed.kind.as_deref(), Some("multi_hop") | Some("comparative") | Some("analytical"))
    });

    Some(if needs_decomposition { Complexity::Complex } else { Complexity::Simple })
}

fn parse_json_object<T: serde::de::DeserializeOwned>(text: &str) -> Option<T> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    serde_json::from_str(&text[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_needs_decomposition_field() {
        let parsed: ClassificationResponse = parse_json_object(r#"{"type": "multi_hop", "depth_estimate": 2, "needs_decomposition": true}"#).unwrap();
        assert_eq!(parsed.needs_decomposition, Some(true));
    }

    #[test]
    fn tolerates_surrounding_prose() {
        let parsed: ClassificationResponse = parse_json_object("Sure, here you go: {\"type\": \"simple\", \"needs_decomposition\": false} Hope that helps!").unwrap();
        assert_eq!(parsed.needs_decomposition, Some(false));
    }

    #[test]
    fn returns_none_on_garbage() {
        let parsed = parse_json_object::<ClassificationResponse>("not json at all");
        assert!(parsed.is_none());
    }
}
