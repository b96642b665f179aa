//! `PromptTemplate` — the stored entity, its placeholder invariant, and rendering.

use crate::error::TemplateError;
use layer0::id::{TemplateId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a template is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateType {
    /// The main retrieval-augmented answer prompt.
    RagQuery,
    /// Generating follow-up or clarifying questions.
    QuestionGeneration,
    /// Scoring/reordering candidate passages.
    Reranking,
    /// Drafting podcast-style narration from an answer.
    PodcastGeneration,
    /// Classifying a question's reasoning complexity for the CoT engine.
    Classification,
    /// Decomposing a question into ordered sub-questions for the CoT engine.
    Decomposition,
}

/// The declared type of a template variable, used to validate values
/// passed at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    /// A string value.
    Text,
    /// A numeric value.
    Number,
    /// A boolean value.
    Boolean,
    /// A list of values.
    List,
}

/// Validation rule for one declared variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSchema {
    /// The expected value type.
    pub var_type: VariableType,
    /// Minimum string length, if `var_type` is [`VariableType::Text`].
    pub min_length: Option<usize>,
}

impl VariableSchema {
    /// A text variable with no minimum length.
    pub fn text() -> Self {
        Self {
            var_type: VariableType::Text,
            min_length: None,
        }
    }

    /// A text variable requiring at least `min_length` characters.
    pub fn text_min_length(min_length: usize) -> Self {
        Self {
            var_type: VariableType::Text,
            min_length: Some(min_length),
        }
    }

    fn validate(&self, name: &str, value: &serde_json::Value) -> Result<(), TemplateError> {
        let type_ok = match self.var_type {
            VariableType::Text => value.is_string(),
            VariableType::Number => value.is_number(),
            VariableType::Boolean => value.is_boolean(),
            VariableType::List => value.is_array(),
        };
        if !type_ok {
            return Err(TemplateError::SchemaViolation {
                name: name.to_owned(),
                reason: format!("expected {:?}", self.var_type),
            });
        }

        if let (VariableType::Text, Some(min_length)) = (self.var_type, self.min_length) {
            let len = value.as_str().map(str::len).unwrap_or(0);
            if len < min_length {
                return Err(TemplateError::SchemaViolation {
                    name: name.to_owned(),
                    reason: format!("shorter than minimum length {min_length}"),
                });
            }
        }

        Ok(())
    }
}

/// A stored prompt template.
///
/// Invariant (enforced at construction): every `{placeholder}` in
/// `template_format` has a matching entry in `input_variables`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Unique id.
    pub id: TemplateId,
    /// Owning user.
    pub owner: UserId,
    /// Unique (name, owner) pair.
    pub name: String,
    /// What this template is used for.
    pub template_type: TemplateType,
    /// Optional system prompt, prepended before the rendered body.
    pub system_prompt: Option<String>,
    /// The template body, containing `{var}` placeholders.
    pub template_format: String,
    /// Declared variables: name -> human-readable description.
    pub input_variables: HashMap<String, String>,
    /// Optional few-shot examples.
    pub examples: Option<Vec<String>>,
    /// Optional cap on rendered-prompt context length (tokens).
    pub max_context_length: Option<usize>,
    /// Optional stop sequences to pass to the provider.
    pub stop_sequences: Option<Vec<String>>,
    /// Per-variable validation rules.
    pub validation_schema: HashMap<String, VariableSchema>,
    /// Whether this is the owner's default template of its type.
    pub is_default: bool,
}

/// The result of rendering a template: the final prompt text and the
/// character length each substituted variable contributed (used by
/// token accounting).
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPrompt {
    /// The rendered prompt, with `system_prompt` prepended if present.
    pub prompt: String,
    /// Character length of each substituted variable's value, keyed by
    /// variable name.
    pub substituted_lengths: HashMap<String, usize>,
}

pub(crate) fn extract_placeholders(template_format: &str) -> Vec<String> {
    let mut placeholders = Vec::new();
    let mut rest = template_format;
    while let Some(open) = rest.find('{') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            break;
        };
        let name = &after_open[..close];
        if !name.is_empty() && !name.contains(char::is_whitespace) {
            placeholders.push(name.to_owned());
        }
        rest = &after_open[close + 1..];
    }
    placeholders
}

impl PromptTemplate {
    /// Construct a template, validating the placeholder/`input_variables`
    /// invariant. Fails with [`TemplateError::UndeclaredPlaceholder`] if
    /// any `{var}` in `template_format` is missing from `input_variables`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TemplateId,
        owner: UserId,
        name: impl Into<String>,
        template_type: TemplateType,
        template_format: impl Into<String>,
        input_variables: HashMap<String, String>,
    ) -> Result<Self, TemplateError> {
        let template_format = template_format.into();
        for placeholder in extract_placeholders(&template_format) {
            if !input_variables.contains_key(&placeholder) {
                return Err(TemplateError::UndeclaredPlaceholder(placeholder));
            }
        }

        Ok(Self {
            id,
            owner,
            name: name.into(),
            template_type,
            system_prompt: None,
            template_format,
            input_variables,
            examples: None,
            max_context_length: None,
            stop_sequences: None,
            validation_schema: HashMap::new(),
            is_default: false,
        })
    }

    /// Render the template with the given variable values.
    ///
    /// Fails with [`TemplateError::MissingVariables`] if any declared
    /// variable has no value, or [`TemplateError::SchemaViolation`] if a
    /// value doesn't satisfy its [`VariableSchema`].
    pub fn render(
        &self,
        variables: &HashMap<String, serde_json::Value>,
    ) -> Result<RenderedPrompt, TemplateError> {
        let placeholders = extract_placeholders(&self.template_format);

        let missing: Vec<String> = placeholders
            .iter()
            .filter(|p| !variables.contains_key(*p))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(TemplateError::MissingVariables(missing));
        }

        for (name, value) in variables {
            if let Some(schema) = self.validation_schema.get(name) {
                schema.validate(name, value)?;
            }
        }

        let mut prompt = self.template_format.clone();
        let mut substituted_lengths = HashMap::new();
        for placeholder in &placeholders {
            let value = &variables[placeholder];
            let rendered_value = value_to_text(value);
            substituted_lengths.insert(placeholder.clone(), rendered_value.len());
            prompt = prompt.replace(&format!("{{{placeholder}}}"), &rendered_value);
        }

        if let Some(system_prompt) = &self.system_prompt {
            prompt = format!("{system_prompt}\n\n{prompt}");
        }

        tracing::debug!(
            template_id = %self.id,
            variable_count = placeholders.len(),
            "rendered prompt template"
        );

        Ok(RenderedPrompt {
            prompt,
            substituted_lengths,
        })
    }
}

fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
