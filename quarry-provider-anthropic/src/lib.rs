#![deny(missing_docs)]
//! Anthropic API backend for quarry-provider.
//!
//! Implements [`quarry_provider::Provider`] against Anthropic's Messages API
//! (`/v1/messages`). Anthropic has no embeddings endpoint, so [`Provider::embed`]
//! always fails with [`ProviderError::ConfigurationMissing`] — pair this backend
//! with `quarry-provider-openai` or `quarry-provider-ollama` for embeddings.

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

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Anthropic API provider.
pub struct AnthropicProvider {
    api_key: String,
    client: reqwest::Client,
    api_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override the API URL (for testing or proxies).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Override the number of retries for retryable errors (rate limits,
    /// transient request failures). Authentication and configuration
    /// errors are never retried.
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

    fn build_request(&self, request: &GenerateRequest, stream: bool) -> AnthropicRequest {
        let messages: Vec<AnthropicMessage> = request
            .messages
            .iter()
            .map(|m| AnthropicMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "user".into(),
                },
                content: m.text_content(),
            })
            .collect();

        AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            messages,
            system: request.system.clone(),
            temperature: request.temperature,
            top_k: request.top_k,
            top_p: request.top_p,
            stream: stream.then_some(true),
        }
    }

    fn parse_response(&self, response: AnthropicResponse) -> Result<GenerateResponse, ProviderError> {
        let text = response
            .content
            .into_iter()
            .map(|block| match block {
                AnthropicContentBlock::Text { text } => text,
            })
            .collect::<Vec<_>>()
            .join("");

        let stop_reason = match response.stop_reason.as_str() {
            "end_turn" | "stop_sequence" => StopReason::EndTurn,
            "max_tokens" => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        };

        let usage = TokenUsage {
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        };

        // Haiku pricing: $0.25/MTok input, $1.25/MTok output (as of 2025).
        let input_cost = Decimal::from(usage.input_tokens) * Decimal::new(25, 8);
        let output_cost = Decimal::from(usage.output_tokens) * Decimal::new(125, 8);

        Ok(GenerateResponse {
            content: vec![ContentPart::text(text)],
            stop_reason,
            usage,
            model: response.model,
            cost: input_cost + output_cost,
        })
    }

    async fn send_generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let api_request = self.build_request(request, false);

        tracing::debug!(url = %self.api_url, model = %api_request.model, "sending generate request to Anthropic");

        let http_response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
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

        let api_response: AnthropicResponse = http_response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        self.parse_response(api_response)
    }
}

impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        with_retries(self.max_retries, self.retry_delay, || self.send_generate(&request)).await
    }

    async fn generate_stream(&self, request: GenerateRequest) -> Result<TextDeltaStream, ProviderError> {
        let api_request = self.build_request(&request, true);

        tracing::debug!(url = %self.api_url, model = %api_request.model, "sending streaming generate request to Anthropic");

        let http_response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
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
            if line.is_empty() {
                return None;
            }
            match serde_json::from_str::<AnthropicStreamEvent>(line) {
                Ok(event) if event.event_type == "content_block_delta" => {
                    event.delta.and_then(|d| d.text).map(Ok)
                }
                Ok(_) => None,
                Err(_) => None,
            }
        });

        Ok(Box::pin(deltas))
    }

    async fn embed(&self, _request: EmbedRequest) -> Result<EmbedResponse, ProviderError> {
        Err(ProviderError::ConfigurationMissing(
            "anthropic has no embeddings endpoint".into(),
        ))
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
