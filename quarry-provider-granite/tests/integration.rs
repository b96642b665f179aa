//! Integration tests for the Granite provider using wiremock.

use quarry_provider::provider::{Provider, ProviderError};
use quarry_provider::types::{EmbedRequest, GenerateRequest, ProviderMessage, Role, StopReason};
use quarry_provider_granite::GraniteProvider;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn minimal_request() -> GenerateRequest {
    GenerateRequest::new(
        "ibm/granite-3-8b-instruct",
        vec![ProviderMessage::text(Role::User, "Hello")],
        256,
    )
}

#[tokio::test]
async fn generate_parses_text_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ml/v1/text/generation"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model_id": "ibm/granite-3-8b-instruct",
            "results": [{
                "generated_text": "Hello! How can I help you today?",
                "stop_reason": "eos_token",
                "input_token_count": 10,
                "generated_token_count": 5
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        GraniteProvider::new("test-token", "project-1").with_url(mock_server.uri());
    let resp = provider
        .generate(minimal_request())
        .await
        .expect("should succeed");

    assert_eq!(resp.model, "ibm/granite-3-8b-instruct");
    assert_eq!(resp.text(), "Hello! How can I help you today?");
    assert_eq!(resp.usage.input_tokens, 10);
    assert_eq!(resp.usage.output_tokens, 5);
}

#[tokio::test]
async fn generate_maps_max_tokens_stop_reason() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ml/v1/text/generation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model_id": "ibm/granite-3-8b-instruct",
            "results": [{
                "generated_text": "Truncated...",
                "stop_reason": "max_tokens",
                "input_token_count": 1,
                "generated_token_count": 1
            }]
        })))
        .mount(&mock_server)
        .await;

    let provider =
        GraniteProvider::new("test-token", "project-1").with_url(mock_server.uri());
    let resp = provider
        .generate(minimal_request())
        .await
        .expect("should succeed");

    assert_eq!(resp.stop_reason, StopReason::MaxTokens);
}

#[tokio::test]
async fn generate_returns_auth_failed_on_401() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ml/v1/text/generation"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired token"))
        .mount(&mock_server)
        .await;

    let provider = GraniteProvider::new("bad-token", "project-1").with_url(mock_server.uri());
    let err = provider.generate(minimal_request()).await.unwrap_err();

    assert!(matches!(err, ProviderError::AuthFailed(_)));
}

#[tokio::test]
async fn generate_returns_rate_limited_on_429() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ml/v1/text/generation"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&mock_server)
        .await;

    let provider = GraniteProvider::new("test-token", "project-1")
        .with_url(mock_server.uri())
        .with_max_retries(0);
    let err = provider.generate(minimal_request()).await.unwrap_err();

    assert!(matches!(err, ProviderError::RateLimited { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn embed_parses_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ml/v1/text/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model_id": "ibm/granite-embedding-107m-multilingual",
            "results": [{"embedding": [0.1, 0.2, 0.3]}],
            "input_token_count": 4
        })))
        .mount(&mock_server)
        .await;

    let provider = GraniteProvider::new("test-token", "project-1").with_url(mock_server.uri());
    let resp = provider
        .embed(EmbedRequest {
            model: "ibm/granite-embedding-107m-multilingual".into(),
            input: vec!["hello".into()],
        })
        .await
        .expect("should succeed");

    assert_eq!(resp.embeddings.len(), 1);
    assert_eq!(resp.embeddings[0], vec![0.1, 0.2, 0.3]);
    assert_eq!(resp.usage.input_tokens, 4);
}
