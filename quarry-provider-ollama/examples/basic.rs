//! Basic usage of the Ollama provider.
//!
//! Make sure Ollama is running locally and run:
//!   cargo run --example basic

use quarry_provider::provider::Provider;
use quarry_provider::types::{GenerateRequest, ProviderMessage, Role};
use quarry_provider_ollama::OllamaProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let provider = OllamaProvider::new();

    let request = GenerateRequest::new(
        "llama3.2",
        vec![ProviderMessage::text(
            Role::User,
            "Say hello in one sentence.",
        )],
        128,
    );

    let response = provider.generate(request).await?;
    println!("Response: {}", response.text());
    println!(
        "Tokens: {} in / {} out",
        response.usage.input_tokens, response.usage.output_tokens
    );

    Ok(())
}
