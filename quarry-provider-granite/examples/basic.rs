//! Basic usage of the Granite provider.
//!
//! Set WATSONX_ACCESS_TOKEN and WATSONX_PROJECT_ID in your environment and run:
//!   cargo run --example basic -p quarry-provider-granite

use quarry_provider::provider::Provider;
use quarry_provider::types::{GenerateRequest, ProviderMessage, Role};
use quarry_provider_granite::GraniteProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let access_token = std::env::var("WATSONX_ACCESS_TOKEN")
        .expect("WATSONX_ACCESS_TOKEN environment variable must be set");
    let project_id = std::env::var("WATSONX_PROJECT_ID")
        .expect("WATSONX_PROJECT_ID environment variable must be set");

    let provider = GraniteProvider::new(access_token, project_id);

    let request = GenerateRequest::new(
        "ibm/granite-3-8b-instruct",
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
