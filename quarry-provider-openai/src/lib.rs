#![deny(missing_docs)]
//! OpenAI API backend for quarry-provider.
//!
//! Implements [`quarry_provider::Provider`] against OpenAI's Chat Completions
//! API (`/v1/chat/completions`) and Embeddings API (`/v1/embeddings`).

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

const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_EMBED_URL: &str = "https://api.openai.com/v1/embeddings";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// OpenAI API provider.
pub struct OpenAIProvider {
    api_key: String,
    client: reqwest::Client,
    chat_url: String,
    embed_url: String,
    org_id: Option<String>,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            chat_url: DEFAULT_CHAT_URL.into(),
            embed_url: DEFAULT_EMBED_URL.into(),
            org_id: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
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

    /// Override both API URLs to point at a different host (for testing or proxies).
    ///
    /// `base` should not include a trailing slash, e.g. `http://localhost:8080`.
    pub fn with_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.chat_url = format!("{base}/v1/chat/completions");
        self.embed_url = format!("{base}/v1/embeddings");
        self
    }

    /// Set the OpenAI-Organization header for multi-org accounts.
    pub fn with_org(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    fn build_chat_request(&self, request: &GenerateRequest, stream: bool) -> OpenAIRequest {
        let mut messages: Vec<OpenAIMessage> = Vec::new();

        if let Some(system) = &request.system {
            messages.push(OpenAIMessage {
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
            messages.push(OpenAIMessage {
                role: role.into(),
                content: m.text_content(),
            });
        }

        OpenAIRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            frequency_penalty: request.repetition_penalty,
            stream: stream.then_some(true),
        }
    }

    fn parse_chat_response(&self, response: OpenAIResponse) -> Result<GenerateResponse, ProviderError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no choices in response".into()))?;

        let stop_reason = match choice.finish_reason.as_str() {
            "stop" => StopReason::EndTurn,
            "length" => StopReason::MaxTokens,
            "content_filter" => StopReason::ContentFilter,
            _ => StopReason::EndTurn,
        };

        let usage = TokenUsage {
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
        };

        // gpt-4o-mini pricing: $0.15/MTok input, $0.60/MTok output.
        let input_cost = Decimal::from(usage.input_tokens) * Decimal::new(15, 8);
        let output_cost = Decimal::from(usage.output_tokens) * Decimal::new(60, 8);

        Ok(GenerateResponse {
            content: vec![ContentPart::text(choice.message.content)],
            stop_reason,
            usage,
            model: response.model,
            cost: input_cost + output_cost,
        })
    }
}

impl OpenAIProvider {
    async fn send_generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let api_request = self.build_chat_request(request, false);

        tracing::debug!(url = %self.chat_url, model = %api_request.model, "sending generate request to OpenAI");

        let mut http_request = self
            .client
            .post(&self.chat_url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");
        if let Some(org_id) = &self.org_id {
            http_request = http_request.header("openai-organization", org_id);
        }

        let http_response = http_request
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(http_response.headers());
            let body = http_response.text().await.unwrap_or_default();
            return Err(map_status_error(status, body, retry_after));
        }

        let api_response: OpenAIResponse = http_response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        self.parse_chat_response(api_response)
    }
}

impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        with_retries(self.max_retries, self.retry_delay, || self.send_generate(&request)).await
    }

    async fn generate_stream(&self, request: GenerateRequest) -> Result<TextDeltaStream, ProviderError> {
        let api_request = self.build_chat_request(&request, true);

        tracing::debug!(url = %self.chat_url, model = %api_request.model, "sending streaming generate request to OpenAI");

        let mut http_request = self
            .client
            .post(&self.chat_url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");
        if let Some(org_id) = &self.org_id {
            http_request = http_request.header("openai-organization", org_id);
        }

        let http_response = http_request
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(http_response.headers());
            let body = http_response.text().await.unwrap_or_default();
            return Err(map_status_error(status, body, retry_after));
        }

        let lines = quarry_provider::streaming::line_stream(Box::pin(http_response.bytes_stream()));
        let deltas = lines.filter_map(|line| async move {
            let line = match line {
                Ok(l) => l,
                Err(e) => return Some(Err(e)),
            };
            let line = quarry_provider::streaming::strip_sse_prefix(&line);
            if line.is_empty() || line == "[DONE]" {
                return None;
            }
            match serde_json::from_str::<OpenAIStreamChunk>(line) {
                Ok(chunk) => chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                    .map(Ok),
                Err(_) => None,
            }
        });

        Ok(Box::pin(deltas))
    }

    async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, ProviderError> {
        let api_request = OpenAIEmbedRequest {
            model: request.model.clone(),
            input: request.input,
        };

        tracing::debug!(url = %self.embed_url, model = %api_request.model, "sending embed request to OpenAI");

        let mut http_request = self
            .client
            .post(&self.embed_url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");
        if let Some(org_id) = &self.org_id {
            http_request = http_request.header("openai-organization", org_id);
        }

        let http_response = http_request
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(http_response.headers());
            let body = http_response.text().await.unwrap_or_default();
            return Err(map_status_error(status, body, retry_after));
        }

        let api_response: OpenAIEmbedResponse = http_response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let input_tokens = api_response.usage.prompt_tokens;

        // text-embedding-3-small pricing: $0.02/MTok.
        let cost = Decimal::from(input_tokens) * Decimal::new(2, 8);

        Ok(EmbedResponse {
            embeddings: api_response.data.into_iter().map(|d| d.embedding).collect(),
            model: api_response.model,
            usage: TokenUsage {
                input_tokens,
                output_tokens: 0,
            },
            cost,
        })
    }
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn map_status_error(status: reqwest::StatusCode, body: String, retry_after: Option<Duration>) -> ProviderError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return match retry_after {
            Some(wait) => ProviderError::rate_limited_after(body, wait),
            None => ProviderError::rate_limited(body),
        };
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

    fn minimal_request() -> GenerateRequest {
        GenerateRequest::new(
            "gpt-4o-mini",
            vec![ProviderMessage::text(Role::User, "Hello")],
            256,
        )
    }

    #[test]
    fn build_simple_chat_request() {
        let provider = OpenAIProvider::new("test-key");
        let api_request = provider.build_chat_request(&minimal_request(), false);
        assert_eq!(api_request.model, "gpt-4o-mini");
        assert_eq!(api_request.max_tokens, 256);
        assert_eq!(api_request.messages.len(), 1);
        assert_eq!(api_request.messages[0].role, "user");
        assert_eq!(api_request.stream, None);
    }

    #[test]
    fn build_chat_request_sets_stream_flag() {
        let provider = OpenAIProvider::new("test-key");
        let api_request = provider.build_chat_request(&minimal_request(), true);
        assert_eq!(api_request.stream, Some(true));
    }

    #[test]
    fn system_prompt_becomes_leading_system_message() {
        let provider = OpenAIProvider::new("test-key");
        let mut request = minimal_request();
        request.system = Some("Be helpful.".into());

        let api_request = provider.build_chat_request(&request, false);
        assert_eq!(api_request.messages.len(), 2);
        assert_eq!(api_request.messages[0].role, "system");
        assert_eq!(api_request.messages[0].content, "Be helpful.");
        assert_eq!(api_request.messages[1].role, "user");
    }

    #[test]
    fn temperature_is_forwarded() {
        let provider = OpenAIProvider::new("test-key");
        let mut request = minimal_request();
        request.temperature = Some(0.5);

        let api_request = provider.build_chat_request(&request, false);
        assert_eq!(api_request.temperature, Some(0.5));
    }

    #[test]
    fn top_p_and_repetition_penalty_are_forwarded() {
        let provider = OpenAIProvider::new("test-key");
        let mut request = minimal_request();
        request.top_p = Some(0.9);
        request.repetition_penalty = Some(0.1);

        let api_request = provider.build_chat_request(&request, false);
        assert_eq!(api_request.top_p, Some(0.9));
        assert_eq!(api_request.frequency_penalty, Some(0.1));
    }

    #[test]
    fn with_max_retries_and_retry_delay_override_defaults() {
        let provider = OpenAIProvider::new("test-key")
            .with_max_retries(5)
            .with_retry_delay(Duration::from_millis(10));
        assert_eq!(provider.max_retries, 5);
        assert_eq!(provider.retry_delay, Duration::from_millis(10));
    }

    #[test]
    fn parse_simple_response() {
        let provider = OpenAIProvider::new("test-key");
        let api_response = OpenAIResponse {
            model: "gpt-4o-mini".into(),
            choices: vec![OpenAIChoice {
                message: OpenAIMessage {
                    role: "assistant".into(),
                    content: "Hello!".into(),
                },
                finish_reason: "stop".into(),
            }],
            usage: OpenAIUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
            },
        };

        let response = provider.parse_chat_response(api_response).unwrap();
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.input_tokens, 10);
        assert_eq!(response.usage.output_tokens, 5);
        assert!(response.cost > Decimal::ZERO);
        assert_eq!(response.text(), "Hello!");
    }

    #[test]
    fn parse_length_stop_reason() {
        let provider = OpenAIProvider::new("test-key");
        let api_response = OpenAIResponse {
            model: "gpt-4o-mini".into(),
            choices: vec![OpenAIChoice {
                message: OpenAIMessage {
                    role: "assistant".into(),
                    content: "trunc...".into(),
                },
                finish_reason: "length".into(),
            }],
            usage: OpenAIUsage {
                prompt_tokens: 1,
                completion_tokens: 1,
            },
        };

        let response = provider.parse_chat_response(api_response).unwrap();
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
    }

    #[test]
    fn parse_response_with_no_choices_errors() {
        let provider = OpenAIProvider::new("test-key");
        let api_response = OpenAIResponse {
            model: "gpt-4o-mini".into(),
            choices: vec![],
            usage: OpenAIUsage {
                prompt_tokens: 0,
                completion_tokens: 0,
            },
        };

        let err = provider.parse_chat_response(api_response).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn with_url_overrides_both_endpoints() {
        let provider = OpenAIProvider::new("test-key").with_url("http://localhost:9999");
        assert_eq!(provider.chat_url, "http://localhost:9999/v1/chat/completions");
        assert_eq!(provider.embed_url, "http://localhost:9999/v1/embeddings");
    }

    #[test]
    fn provider_name_is_openai() {
        assert_eq!(OpenAIProvider::new("test-key").name(), "openai");
    }

    #[test]
    fn map_status_error_rate_limited() {
        let err = map_status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".into(), None);
        assert!(matches!(err, ProviderError::RateLimited { .. }));
    }

    #[test]
    fn map_status_error_rate_limited_carries_retry_after() {
        let err = map_status_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "slow down".into(),
            Some(Duration::from_secs(3)),
        );
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn map_status_error_auth_failed() {
        let err = map_status_error(reqwest::StatusCode::UNAUTHORIZED, "bad key".into(), None);
        assert!(matches!(err, ProviderError::AuthFailed(_)));
    }

    #[test]
    fn map_status_error_fallback_is_request_failed() {
        let err = map_status_error(reqwest::StatusCode::BAD_REQUEST, "bad request".into(), None);
        assert!(matches!(err, ProviderError::RequestFailed(_)));
    }
}
