//! Embedding provider backed by `ai-llm-service` (OpenAI or Ollama).

use std::sync::Arc;

use ai_llm_service::EmbeddingService;
use futures::future::BoxFuture;
use tracing::error;

use crate::{EmbeddingsProvider, RagError};

/// Adapter from [`EmbeddingService`] to [`EmbeddingsProvider`].
#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<EmbeddingService>,
    dim: usize,
}

impl LlmEmbedder {
    /// `dim` must match the model output and the collection dimension.
    pub fn new(svc: Arc<EmbeddingService>, dim: usize) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>, RagError>> {
        Box::pin(async move {
            self.svc.embed_batch(texts).await.map_err(|e| {
                let err = RagError::from(e);
                if err.is_connection() {
                    error!(target: "rag_store::embed", error = %err, "embedding service unreachable");
                }
                err
            })
        })
    }
}
