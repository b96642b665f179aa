#![deny(missing_docs)]
//! Ollama local model provider.
//!
//! Implements [`quarry_provider::Provider`] for Ollama's `/api/chat` and
//! `/api/embed` endpoints. Ollama runs models locally, so there are no
//! auth headers and cost is always zero.

mod types;

use futures::StreamExt;
use quarry_provider::provider::{Provider, ProviderError, TextDeltaStream};
use quarry_provider::retry::with_retries;
use quarry_provider::types::{
    ContentPart, EmbedRequest, EmbedResponse, GenerateRequest, GenerateResponse, Role, StopReason,
    TokenUsage,
};
use rust_decimal::Decimal;
use std::time::Duration;
use types::*;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Ollama local model provider.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    keep_alive: Option<String>,
    max_retries: u32,
    retry_delay: Duration,
}

impl OllamaProvider {
    /// Create a new Ollama provider pointed at the default local endpoint.
    ///
    /// Defaults to `http://localhost:11434`.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "http://localhost:11434".into(),
            keep_alive: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override the base URL (for remote Ollama instances or custom ports).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the `keep_alive` duration for how long Ollama keeps the model loaded.
    ///
    /// Examples: `"5m"`, `"0"` (unload immediately), `"-1"` (keep forever).
    pub fn with_keep_alive(mut self, duration: impl Into<String>) -> Self {
        self.keep_alive = Some(duration.into());
        self
    }

    /// Override the number of retries for retryable errors.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the initial backoff delay, doubled after each retry
    /// unless the backend sends a `Retry-After` hint.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }

    fn build_chat_request(&self, request: &GenerateRequest, stream: bool) -> OllamaChatRequest {
        let mut messages: Vec<OllamaMessage> = Vec::new();

        if let Some(system) = &request.system {
            messages.push(OllamaMessage {
                role: "system".into(),
                content: system.clone(),
            });
        }

        for m in &request.messages {
            let role = match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(OllamaMessage {
                role: role.into(),
                content: m.text_content(),
            });
        }

        OllamaChatRequest {
            model: request.model.clone(),
            messages,
            stream,
            keep_alive: self.keep_alive.clone(),
            options: Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: Some(request.max_tokens),
                top_k: request.top_k,
                top_p: request.top_p,
                repeat_penalty: request.repetition_penalty,
            }),
        }
    }

    fn parse_chat_response(&self, response: OllamaChatResponse) -> GenerateResponse {
        let stop_reason = match response.done_reason.as_deref() {
            Some("length") => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        };

        GenerateResponse {
            content: vec![ContentPart::text(response.message.content)],
            stop_reason,
            usage: TokenUsage {
                input_tokens: response.prompt_eval_count.unwrap_or(0),
                output_tokens: response.eval_count.unwrap_or(0),
            },
            model: response.model,
            cost: Decimal::ZERO,
        }
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaProvider {
    async fn send_generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let api_request = self.build_chat_request(request, false);
        let url = self.chat_url();

        tracing::debug!(url = %url, model = %api_request.model, "sending generate request to Ollama");

        let http_response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            let body = http_response.text().await.unwrap_or_default();
            return Err(map_status_error(status, body));
        }

        let api_response: OllamaChatResponse = http_response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(self.parse_chat_response(api_response))
    }
}

impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        with_retries(self.max_retries, self.retry_delay, || self.send_generate(&request)).await
    }

    async fn generate_stream(&self, request: GenerateRequest) -> Result<TextDeltaStream, ProviderError> {
        let api_request = self.build_chat_request(&request, true);
        let url = self.chat_url();

        tracing::debug!(url = %url, model = %api_request.model, "sending streaming generate request to Ollama");

        let http_response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            let body = http_response.text().await.unwrap_or_default();
            return Err(map_status_error(status, body));
        }

        let lines = quarry_provider::streaming::line_stream(Box::pin(http_response.bytes_stream()));
        let deltas = lines.filter_map(|line| async move {
            let line = match line {
                Ok(l) => l,
                Err(e) => return Some(Err(e)),
            };
            match serde_json::from_str::<OllamaChatStreamLine>(&line) {
                Ok(parsed) if !parsed.message.content.is_empty() => Some(Ok(parsed.message.content)),
                Ok(_) => None,
                Err(_) => None,
            }
        });

        Ok(Box::pin(deltas))
    }

    async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, ProviderError> {
        let api_request = OllamaEmbedRequest {
            model: request.model.clone(),
            input: request.input,
        };
        let url = self.embed_url();

        tracing::debug!(url = %url, model = %api_request.model, "sending embed request to Ollama");

        let http_response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            let body = http_response.text().await.unwrap_or_default();
            return Err(map_status_error(status, body));
        }

        let api_response: OllamaEmbedResponse = http_response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(EmbedResponse {
            embeddings: api_response.embeddings,
            model: api_response.model,
            usage: TokenUsage {
                input_tokens: api_response.prompt_eval_count.unwrap_or(0),
                output_tokens: 0,
            },
            cost: Decimal::ZERO,
        })
    }
}

fn map_status_error(status: reqwest::StatusCode, body: String) -> ProviderError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::rate_limited(body);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return ProviderError::AuthFailed(body);
    }
    ProviderError::RequestFailed(format!("HTTP {status}: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_provider::types::ProviderMessage;

    #[test]
    fn build_simple_chat_request() {
        let provider = OllamaProvider::new();
        let request = GenerateRequest::new(
            "llama3.2",
            vec![ProviderMessage::text(Role::User, "Hello")],
            256,
        );

        let api_request = provider.build_chat_request(&request, false);
        assert_eq!(api_request.model, "llama3.2");
        assert!(!api_request.stream);
        assert_eq!(api_request.messages.len(), 1);
        assert_eq!(api_request.messages[0].role, "user");
        assert_eq!(api_request.messages[0].content, "Hello");
        assert_eq!(api_request.options.as_ref().unwrap().num_predict, Some(256));
    }

    #[test]
    fn build_chat_request_sets_stream_flag() {
        let provider = OllamaProvider::new();
        let request = GenerateRequest::new(
            "llama3.2",
            vec![ProviderMessage::text(Role::User, "Hello")],
            256,
        );

        let api_request = provider.build_chat_request(&request, true);
        assert!(api_request.stream);
    }

    #[test]
    fn system_prompt_becomes_leading_system_message() {
        let provider = OllamaProvider::new();
        let mut request = GenerateRequest::new(
            "llama3.2",
            vec![ProviderMessage::text(Role::User, "Hello")],
            256,
        );
        request.system = Some("Be helpful.".into());

        let api_request = provider.build_chat_request(&request, false);
        assert_eq!(api_request.messages.len(), 2);
        assert_eq!(api_request.messages[0].role, "system");
        assert_eq!(api_request.messages[0].content, "Be helpful.");
        assert_eq!(api_request.messages[1].role, "user");
    }

    #[test]
    fn temperature_maps_to_options() {
        let provider = OllamaProvider::new();
        let mut request = GenerateRequest::new(
            "llama3.2",
            vec![ProviderMessage::text(Role::User, "Hi")],
            128,
        );
        request.temperature = Some(0.5);

        let api_request = provider.build_chat_request(&request, false);
        assert_eq!(api_request.options.as_ref().unwrap().temperature, Some(0.5));
    }

    #[test]
    fn top_k_top_p_and_repeat_penalty_map_to_options() {
        let provider = OllamaProvider::new();
        let mut request = GenerateRequest::new(
            "llama3.2",
            vec![ProviderMessage::text(Role::User, "Hi")],
            128,
        );
        request.top_k = Some(40);
        request.top_p = Some(0.9);
        request.repetition_penalty = Some(1.1);

        let api_request = provider.build_chat_request(&request, false);
        let options = api_request.options.as_ref().unwrap();
        assert_eq!(options.top_k, Some(40));
        assert_eq!(options.top_p, Some(0.9));
        assert_eq!(options.repeat_penalty, Some(1.1));
    }

    #[test]
    fn keep_alive_is_serialized() {
        let provider = OllamaProvider::new().with_keep_alive("5m");
        let request = GenerateRequest::new(
            "llama3.2",
            vec![ProviderMessage::text(Role::User, "Hi")],
            64,
        );

        let api_request = provider.build_chat_request(&request, false);
        assert_eq!(api_request.keep_alive, Some("5m".into()));
    }

    #[test]
    fn with_max_retries_and_retry_delay_override_defaults() {
        let provider = OllamaProvider::new()
            .with_max_retries(5)
            .with_retry_delay(Duration::from_millis(10));
        assert_eq!(provider.max_retries, 5);
        assert_eq!(provider.retry_delay, Duration::from_millis(10));
    }

    #[test]
    fn parse_simple_response() {
        let provider = OllamaProvider::new();
        let api_response = OllamaChatResponse {
            model: "llama3.2".into(),
            message: OllamaMessage {
                role: "assistant".into(),
                content: "Hello!".into(),
            },
            done_reason: Some("stop".into()),
            prompt_eval_count: Some(10),
            eval_count: Some(5),
        };

        let response = provider.parse_chat_response(api_response);
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.input_tokens, 10);
        assert_eq!(response.usage.output_tokens, 5);
        assert_eq!(response.cost, Decimal::ZERO);
        assert_eq!(response.text(), "Hello!");
    }

    #[test]
    fn parse_length_stop_reason() {
        let provider = OllamaProvider::new();
        let api_response = OllamaChatResponse {
            model: "llama3.2".into(),
            message: OllamaMessage {
                role: "assistant".into(),
                content: "trunca...".into(),
            },
            done_reason: Some("length".into()),
            prompt_eval_count: None,
            eval_count: None,
        };

        let response = provider.parse_chat_response(api_response);
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
        assert_eq!(response.usage.input_tokens, 0);
        assert_eq!(response.usage.output_tokens, 0);
    }

    #[test]
    fn with_url_overrides_base_url() {
        let provider = OllamaProvider::new().with_url("http://remote:11434");
        assert_eq!(provider.chat_url(), "http://remote:11434/api/chat");
        assert_eq!(provider.embed_url(), "http://remote:11434/api/embed");
    }

    #[test]
    fn default_impl_matches_new() {
        let provider = OllamaProvider::default();
        assert_eq!(provider.base_url, "http://localhost:11434");
        assert!(provider.keep_alive.is_none());
    }

    #[test]
    fn provider_name_is_ollama() {
        assert_eq!(OllamaProvider::new().name(), "ollama");
    }

    #[test]
    fn map_status_error_rate_limited() {
        let err = map_status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".into());
        assert!(matches!(err, ProviderError::RateLimited { .. }));
    }

    #[test]
    fn map_status_error_auth_failed() {
        let err = map_status_error(reqwest::StatusCode::UNAUTHORIZED, "no key".into());
        assert!(matches!(err, ProviderError::AuthFailed(_)));
    }

    #[test]
    fn map_status_error_fallback_is_request_failed() {
        let err = map_status_error(reqwest::StatusCode::NOT_FOUND, "model missing".into());
        assert!(matches!(err, ProviderError::RequestFailed(_)));
    }
}
