#![deny(missing_docs)]
//! IBM watsonx.ai Granite backend for quarry-provider.
//!
//! Implements [`quarry_provider::Provider`] against watsonx.ai's foundation-model
//! REST endpoints (`/ml/v1/text/generation`, `/ml/v1/text/embeddings`). Every
//! request is scoped by a `project_id` in addition to the model identifier,
//! and authentication is a pre-exchanged IAM bearer token rather than a
//! static API key — callers are expected to refresh it themselves.

mod types;

use futures::StreamExt;
use quarry_provider::provider::{Provider, ProviderError, TextDeltaStream};
use quarry_provider::retry::with_retries;
use quarry_provider::types::{
    ContentPart, EmbedRequest, EmbedResponse, GenerateRequest, GenerateResponse, StopReason,
    TokenUsage,
};
use rust_decimal::Decimal;
use std::time::Duration;
use types::*;

const DEFAULT_BASE_URL: &str = "https://us-south.ml.cloud.ibm.com";
const API_VERSION: &str = "2024-03-14";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// IBM watsonx.ai Granite provider.
pub struct GraniteProvider {
    access_token: String,
    project_id: String,
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl GraniteProvider {
    /// Create a new Granite provider with an IAM access token and a watsonx project ID.
    pub fn new(access_token: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            project_id: project_id.into(),
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override the base URL (for testing or a different watsonx region).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
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

    fn generation_url(&self) -> String {
        format!(
            "{}/ml/v1/text/generation?version={}",
            self.base_url, API_VERSION
        )
    }

    fn generation_stream_url(&self) -> String {
        format!(
            "{}/ml/v1/text/generation_stream?version={}",
            self.base_url, API_VERSION
        )
    }

    fn embeddings_url(&self) -> String {
        format!(
            "{}/ml/v1/text/embeddings?version={}",
            self.base_url, API_VERSION
        )
    }

    fn build_generate_request(&self, request: &GenerateRequest) -> GraniteGenerateRequest {
        let mut input = String::new();
        if let Some(system) = &request.system {
            input.push_str(system);
            input.push_str("\n\n");
        }
        for m in &request.messages {
            input.push_str(&m.text_content());
            input.push('\n');
        }

        GraniteGenerateRequest {
            model_id: request.model.clone(),
            input,
            project_id: self.project_id.clone(),
            parameters: GraniteParameters {
                max_new_tokens: request.max_tokens,
                temperature: request.temperature,
                top_k: request.top_k,
                top_p: request.top_p,
                repetition_penalty: request.repetition_penalty,
            },
        }
    }

    fn parse_generate_response(
        &self,
        response: GraniteGenerateResponse,
    ) -> Result<GenerateResponse, ProviderError> {
        let result = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no results in response".into()))?;

        let stop_reason = match result.stop_reason.as_str() {
            "max_tokens" => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        };

        let usage = TokenUsage {
            input_tokens: result.input_token_count,
            output_tokens: result.generated_token_count,
        };

        // Nominal watsonx.ai resource-unit pricing for an 8B Granite model.
        let input_cost = Decimal::from(usage.input_tokens) * Decimal::new(6, 8);
        let output_cost = Decimal::from(usage.output_tokens) * Decimal::new(6, 8);

        Ok(GenerateResponse {
            content: vec![ContentPart::text(result.generated_text)],
            stop_reason,
            usage,
            model: response.model_id,
            cost: input_cost + output_cost,
        })
    }
}

impl GraniteProvider {
    async fn send_generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let api_request = self.build_generate_request(request);
        let url = self.generation_url();

        tracing::debug!(url = %url, model = %api_request.model_id, "sending generate request to watsonx.ai");

        let http_response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
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

        let api_response: GraniteGenerateResponse = http_response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        self.parse_generate_response(api_response)
    }
}

impl Provider for GraniteProvider {
    fn name(&self) -> &str {
        "granite"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        with_retries(self.max_retries, self.retry_delay, || self.send_generate(&request)).await
    }

    async fn generate_stream(&self, request: GenerateRequest) -> Result<TextDeltaStream, ProviderError> {
        let api_request = self.build_generate_request(&request);
        let url = self.generation_stream_url();

        tracing::debug!(url = %url, model = %api_request.model_id, "sending streaming generate request to watsonx.ai");

        let http_response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
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
            match serde_json::from_str::<GraniteStreamEvent>(line) {
                Ok(event) => event
                    .results
                    .into_iter()
                    .next()
                    .filter(|r| !r.generated_text.is_empty())
                    .map(|r| Ok(r.generated_text)),
                Err(_) => None,
            }
        });

        Ok(Box::pin(deltas))
    }

    async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, ProviderError> {
        let api_request = GraniteEmbedRequest {
            model_id: request.model.clone(),
            inputs: request.input,
            project_id: self.project_id.clone(),
        };
        let url = self.embeddings_url();

        tracing::debug!(url = %url, model = %api_request.model_id, "sending embed request to watsonx.ai");

        let http_response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
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

        let api_response: GraniteEmbedResponse = http_response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let input_tokens = api_response.input_token_count.unwrap_or(0);

        Ok(EmbedResponse {
            embeddings: api_response
                .results
                .into_iter()
                .map(|r| r.embedding)
                .collect(),
            model: api_response.model_id,
            usage: TokenUsage {
                input_tokens,
                output_tokens: 0,
            },
            cost: Decimal::from(input_tokens) * Decimal::new(1, 8),
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
