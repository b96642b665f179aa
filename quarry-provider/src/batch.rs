//! Bounded-concurrency batch embedding.

use crate::provider::{Provider, ProviderError};
use crate::types::{EmbedRequest, EmbedResponse};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Embed many texts against `provider`, running at most `max_concurrency`
/// requests at once. Each text becomes its own single-item request so a
/// failure on one text doesn't fail the whole batch; results are
/// returned in the same order as `texts`.
pub async fn embed_batched<P: Provider>(
    provider: &P,
    model: &str,
    texts: Vec<String>,
    max_concurrency: usize,
) -> Vec<Result<EmbedResponse, ProviderError>> {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));

    let futures = texts.into_iter().map(|text| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            let _permit = semaphore
                .acquire()
                .await
                .expect("semaphore is never closed");
            provider.embed(EmbedRequest::single(model, text)).await
        }
    });

    join_all(futures).await
}
