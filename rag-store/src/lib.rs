//! High-level RAG facade: document indexing and retrieval over a vector index.
//!
//! This crate provides a clean API to:
//! - Load `.txt`, `.html` and `.csv` documents and split them into chunks
//! - Embed chunks in batches and store them in a collection (Qdrant or in-memory)
//! - Retrieve the top-K closest chunks for a textual query and format them as context
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod backend;
mod chunker;
mod config;
mod embed;
mod errors;
mod ingest;
mod loader;
mod memory_backend;
mod qdrant_facade;
mod record;
mod retrieve;
mod vector_index;

use std::path::Path;
use std::sync::Arc;

pub use backend::VectorBackend;
pub use chunker::chunk_text;
pub use config::{BackendKind, ChunkOptions, DistanceKind, HnswParams, RagConfig, VectorSpace};
pub use embed::llm_embedder::LlmEmbedder;
pub use embed::{EmbeddingsProvider, MAX_EMBED_BATCH, embed_checked};
pub use errors::RagError;
pub use loader::{FolderLoad, html_visible_text, load_file, load_folder};
pub use memory_backend::MemoryBackend;
pub use qdrant_facade::QdrantFacade;
pub use record::{
    DocumentChunk, FileKind, IndexStats, IndexedRecord, MAX_SOURCE_BYTES, MAX_TEXT_BYTES,
    NewRecord, SearchHit,
};
pub use retrieve::format_context;
pub use vector_index::{Collection, ensure_collection};

use tracing::{debug, info, trace};

/// Builds the backend selected by `cfg.backend`.
///
/// # Errors
/// Returns `RagError::Config` if the configuration is invalid or the client cannot be built.
pub fn open_backend(cfg: &RagConfig) -> Result<Arc<dyn VectorBackend>, RagError> {
    cfg.validate()?;
    let backend: Arc<dyn VectorBackend> = match cfg.backend {
        BackendKind::Qdrant => Arc::new(QdrantFacade::new(cfg)?),
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
    };
    debug!(target: "rag_store", backend = backend.name(), "vector backend ready");
    Ok(backend)
}

/// High-level facade that wires configuration, embeddings and the collection.
///
/// This is the single entry point recommended for application code.
pub struct RagStore {
    cfg: RagConfig,
    embedder: Arc<dyn EmbeddingsProvider>,
    collection: Collection,
}

impl RagStore {
    /// Opens (or creates) the configured collection.
    ///
    /// # Errors
    /// - `RagError::Config` for an invalid config or an embedder whose
    ///   dimension differs from `cfg.embedding_dim`
    /// - `RagError::DimensionMismatch` if the collection exists with another dimension
    /// - backend connection errors
    pub async fn connect(
        cfg: RagConfig,
        embedder: Arc<dyn EmbeddingsProvider>,
        backend: Arc<dyn VectorBackend>,
    ) -> Result<Self, RagError> {
        cfg.validate()?;
        if embedder.dim() != cfg.embedding_dim {
            return Err(RagError::Config(format!(
                "embedder produces {}-d vectors but EMBEDDING_DIM is {}",
                embedder.dim(),
                cfg.embedding_dim
            )));
        }

        let collection =
            ensure_collection(backend, &cfg.collection, cfg.vector_space(), cfg.hnsw).await?;
        info!(
            target: "rag_store",
            backend = collection.backend_name(),
            collection = collection.name(),
            dim = cfg.embedding_dim,
            distance = ?cfg.distance,
            "rag store connected"
        );
        Ok(Self {
            cfg,
            embedder,
            collection,
        })
    }

    /// Indexes the supported files of `dir` unless the collection is already populated.
    ///
    /// # Errors
    /// Returns I/O, embedding, backend or `RagError::PartialIndex` failures.
    pub async fn index_folder(
        &self,
        dir: impl AsRef<Path>,
        force_reindex: bool,
    ) -> Result<IndexStats, RagError> {
        ingest::index_folder(
            &self.cfg,
            &self.collection,
            self.embedder.as_ref(),
            dir.as_ref(),
            force_reindex,
        )
        .await
    }

    /// Indexes one file of the given kind and returns the number of chunks added.
    pub async fn index_file(&self, path: impl AsRef<Path>, kind: FileKind) -> Result<usize, RagError> {
        trace!(target: "rag_store", path = ?path.as_ref(), "index_file");
        ingest::index_file(
            &self.cfg,
            &self.collection,
            self.embedder.as_ref(),
            path.as_ref(),
            kind,
        )
        .await
    }

    /// Like [`RagStore::index_file`], resolving the kind from the extension.
    ///
    /// # Errors
    /// Returns `RagError::UnsupportedFormat` for any extension other than txt, html or csv.
    pub async fn index_path(&self, path: impl AsRef<Path>) -> Result<usize, RagError> {
        let kind = FileKind::from_path(path.as_ref())?;
        self.index_file(path, kind).await
    }

    /// Top-K semantic search; `top_k` defaults to the configured value.
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Result<Vec<SearchHit>, RagError> {
        let top_k = top_k.unwrap_or(self.cfg.top_k);
        retrieve::search(&self.collection, self.embedder.as_ref(), query, top_k).await
    }

    /// Number of records visible in the collection.
    pub async fn count(&self) -> Result<u64, RagError> {
        self.collection.count().await
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }
}
