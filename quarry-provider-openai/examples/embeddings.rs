//! Generate embeddings using the OpenAI Embeddings API.
//!
//! Requires the OPENAI_API_KEY environment variable.
//!
//! Run with: OPENAI_API_KEY=sk-... cargo run --example embeddings -p quarry-provider-openai

use quarry_provider::provider::Provider;
use quarry_provider::types::EmbedRequest;
use quarry_provider_openai::OpenAIProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("OPENAI_API_KEY")?;
    let provider = OpenAIProvider::new(api_key);

    let request = EmbedRequest {
        model: "text-embedding-3-small".into(),
        input: vec![
            "Rust is a systems programming language".into(),
            "Python is great for data science".into(),
        ],
    };

    let response = provider.embed(request).await?;

    println!("Model: {}", response.model);
    println!("Embeddings: {}", response.embeddings.len());
    println!("Dimensions: {}", response.embeddings[0].len());
    println!("Input tokens: {}", response.usage.input_tokens);

    let sim = cosine_similarity(&response.embeddings[0], &response.embeddings[1]);
    println!("Similarity: {sim:.4}");

    Ok(())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b)
}
