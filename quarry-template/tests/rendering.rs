//! End-to-end template selection and rendering.

use layer0::id::{TemplateId, UserId};
use quarry_template::{PromptTemplate, TemplateRegistry, TemplateType};
use std::collections::HashMap;

#[test]
fn resolve_then_render_rag_query_template() {
    let registry = TemplateRegistry::new();

    let mut template = PromptTemplate::new(
        TemplateId::new("rag-default"),
        UserId::new("system"),
        "rag-default",
        TemplateType::RagQuery,
        "Given context:\n{context}\n\nAnswer: {question}",
        HashMap::from([
            ("context".to_string(), "retrieved passages".to_string()),
            ("question".to_string(), "the user question".to_string()),
        ]),
    )
    .unwrap();
    template.is_default = true;
    registry.put(template);

    let resolved = registry
        .resolve(None, &UserId::new("alice"), TemplateType::RagQuery)
        .unwrap();

    let variables = HashMap::from([
        (
            "context".to_string(),
            serde_json::Value::String("Rust has no garbage collector.".into()),
        ),
        (
            "question".to_string(),
            serde_json::Value::String("Does Rust use a GC?".into()),
        ),
    ]);

    let rendered = resolved.render(&variables).unwrap();
    assert!(rendered.prompt.contains("Rust has no garbage collector."));
    assert!(rendered.prompt.contains("Does Rust use a GC?"));
    assert_eq!(rendered.substituted_lengths.len(), 2);
}
