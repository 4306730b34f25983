//! Embedding abstraction.
//!
//! Providers receive batches of at most [`MAX_EMBED_BATCH`] texts; splitting
//! larger inputs is the caller's job (see `ingest`).

use futures::future::BoxFuture;

use crate::errors::RagError;

pub mod llm_embedder;

/// Upper bound on texts per provider call.
pub const MAX_EMBED_BATCH: usize = ai_llm_service::MAX_EMBEDDING_INPUTS;

/// Provider interface for embedding generation.
///
/// Implement this trait to plug in your own embedding backend.
pub trait EmbeddingsProvider: Send + Sync {
    /// Vector length every call returns.
    fn dim(&self) -> usize;

    /// Embeds `texts` in order; `texts.len() <= MAX_EMBED_BATCH`.
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>, RagError>>;
}

/// Calls the provider and checks the shape of its answer.
pub async fn embed_checked(
    provider: &dyn EmbeddingsProvider,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, RagError> {
    if texts.len() > MAX_EMBED_BATCH {
        return Err(RagError::Embedding(format!(
            "batch of {} texts exceeds the limit of {MAX_EMBED_BATCH}",
            texts.len()
        )));
    }
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let vectors = provider.embed_batch(texts).await?;
    if vectors.len() != texts.len() {
        return Err(RagError::Embedding(format!(
            "sent {} texts, received {} vectors",
            texts.len(),
            vectors.len()
        )));
    }
    let want = provider.dim();
    if let Some(v) = vectors.iter().find(|v| v.len() != want) {
        return Err(RagError::DimensionMismatch { got: v.len(), want });
    }
    Ok(vectors)
}
