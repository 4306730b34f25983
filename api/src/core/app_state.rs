use std::path::PathBuf;
use std::sync::Arc;

use ai_llm_service::EmbeddingService;
use rag_store::RagStore;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Indexed document collection plus the embedder used for queries.
    pub store: Arc<RagStore>,
    /// Embedding service probed by `/health`; `None` when the store runs
    /// with a local embedder.
    pub embedding: Option<Arc<EmbeddingService>>,
    /// Folder scanned by `/index_folder`; uploads are saved here.
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(store: Arc<RagStore>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            embedding: None,
            data_dir: data_dir.into(),
        }
    }

    pub fn with_embedding(mut self, svc: Arc<EmbeddingService>) -> Self {
        self.embedding = Some(svc);
        self
    }
}
