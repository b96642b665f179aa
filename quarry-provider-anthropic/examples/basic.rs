//! Basic usage of the Anthropic provider.
//!
//! Set ANTHROPIC_API_KEY in your environment and run:
//!   cargo run --example basic -p quarry-provider-anthropic

use quarry_provider::provider::Provider;
use quarry_provider::types::{GenerateRequest, ProviderMessage, Role};
use quarry_provider_anthropic::AnthropicProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .expect("ANTHROPIC_API_KEY environment variable must be set");

    let provider = AnthropicProvider::new(api_key);

    let request = GenerateRequest::new(
        "claude-haiku-4-5-20251001",
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
