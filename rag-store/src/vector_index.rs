//! Collection handle over a [`VectorBackend`].
//!
//! [`ensure_collection`] is idempotent by name: an existing collection is
//! reused when its dimension matches and rejected otherwise. All vector
//! dimension checks happen here before anything reaches the backend.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::backend::VectorBackend;
use crate::config::{HnswParams, VectorSpace};
use crate::errors::RagError;
use crate::record::{NewRecord, SearchHit};

/// Opens `name`, creating it with `space` if it does not exist, then loads it.
///
/// # Errors
/// - [`RagError::DimensionMismatch`] if the existing collection has another dimension
/// - backend errors (connection, creation, load)
pub async fn ensure_collection(
    backend: Arc<dyn VectorBackend>,
    name: &str,
    space: VectorSpace,
    hnsw: HnswParams,
) -> Result<Collection, RagError> {
    let existing = backend
        .collection_dim(name)
        .await
        .inspect_err(|e| log_backend_failure(backend.name(), "collection_dim", e))?;

    match existing {
        Some(dim) if dim != space.size => {
            error!(
                target: "rag_store::index",
                collection = name,
                existing = dim,
                configured = space.size,
                "collection exists with a different dimension"
            );
            return Err(RagError::DimensionMismatch {
                got: space.size,
                want: dim,
            });
        }
        Some(_) => debug!(target: "rag_store::index", collection = name, "collection exists"),
        None => {
            backend
                .create_collection(name, space, hnsw)
                .await
                .inspect_err(|e| log_backend_failure(backend.name(), "create_collection", e))?;
            info!(target: "rag_store::index", collection = name, dim = space.size, "collection created");
        }
    }

    backend
        .load_collection(name)
        .await
        .inspect_err(|e| log_backend_failure(backend.name(), "load_collection", e))?;

    Ok(Collection {
        backend,
        name: name.to_string(),
        space,
        hnsw,
    })
}

fn log_backend_failure(backend: &str, op: &'static str, err: &RagError) {
    if err.is_connection() {
        error!(target: "rag_store::index", backend, op, error = %err, "vector index unreachable");
    }
}

/// A loaded collection with a fixed vector space.
#[derive(Clone)]
pub struct Collection {
    backend: Arc<dyn VectorBackend>,
    name: String,
    space: VectorSpace,
    hnsw: HnswParams,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn space(&self) -> VectorSpace {
        self.space
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Inserts records; the whole batch is rejected if any record violates the schema.
    pub async fn insert(&self, records: Vec<NewRecord>) -> Result<usize, RagError> {
        if records.is_empty() {
            return Ok(0);
        }
        for r in &records {
            r.check(self.space.size)?;
        }
        let ids = self
            .backend
            .insert(&self.name, records)
            .await
            .inspect_err(|e| log_backend_failure(self.backend.name(), "insert", e))?;
        Ok(ids.len())
    }

    /// Makes all prior inserts visible to `count` and `search`.
    pub async fn flush(&self) -> Result<(), RagError> {
        self.backend
            .flush(&self.name)
            .await
            .inspect_err(|e| log_backend_failure(self.backend.name(), "flush", e))
    }

    pub async fn count(&self) -> Result<u64, RagError> {
        self.backend
            .count(&self.name)
            .await
            .inspect_err(|e| log_backend_failure(self.backend.name(), "count", e))
    }

    /// At most `top_k` hits, ascending by distance.
    pub async fn search(&self, query: Vec<f32>, top_k: usize) -> Result<Vec<SearchHit>, RagError> {
        if query.len() != self.space.size {
            return Err(RagError::DimensionMismatch {
                got: query.len(),
                want: self.space.size,
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let search_ef = self.hnsw.search_ef.max(top_k);
        let mut hits = self
            .backend
            .search(&self.name, query, top_k, search_ef)
            .await
            .inspect_err(|e| log_backend_failure(self.backend.name(), "search", e))?;
        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Drops and recreates the collection empty, with the same space.
    pub async fn reset(&self) -> Result<(), RagError> {
        info!(target: "rag_store::index", collection = %self.name, "resetting collection");
        self.backend.drop_collection(&self.name).await?;
        self.backend
            .create_collection(&self.name, self.space, self.hnsw)
            .await?;
        self.backend.load_collection(&self.name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceKind;
    use crate::memory_backend::MemoryBackend;

    fn space(size: usize) -> VectorSpace {
        VectorSpace {
            size,
            distance: DistanceKind::Euclid,
        }
    }

    fn rec(text: &str, vector: Vec<f32>) -> NewRecord {
        NewRecord {
            text: text.into(),
            source: "doc.txt".into(),
            vector,
        }
    }

    #[tokio::test]
    async fn ensure_is_idempotent_and_keeps_data() {
        let backend: Arc<dyn VectorBackend> = Arc::new(MemoryBackend::new());
        let c = ensure_collection(backend.clone(), "docs", space(2), HnswParams::default())
            .await
            .unwrap();
        c.insert(vec![rec("a", vec![0.0, 1.0])]).await.unwrap();
        c.flush().await.unwrap();

        let again = ensure_collection(backend, "docs", space(2), HnswParams::default())
            .await
            .unwrap();
        assert_eq!(again.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reopening_with_another_dimension_fails() {
        let backend: Arc<dyn VectorBackend> = Arc::new(MemoryBackend::new());
        ensure_collection(backend.clone(), "docs", space(2), HnswParams::default())
            .await
            .unwrap();
        let err = ensure_collection(backend, "docs", space(3), HnswParams::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RagError::DimensionMismatch { got: 3, want: 2 }));
    }

    #[tokio::test]
    async fn wrong_query_dimension_and_zero_top_k() {
        let backend: Arc<dyn VectorBackend> = Arc::new(MemoryBackend::new());
        let c = ensure_collection(backend, "docs", space(2), HnswParams::default())
            .await
            .unwrap();
        assert!(matches!(
            c.search(vec![1.0], 3).await,
            Err(RagError::DimensionMismatch { got: 1, want: 2 })
        ));
        assert!(c.search(vec![1.0, 1.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn top_k_larger_than_collection_returns_everything_sorted() {
        let backend: Arc<dyn VectorBackend> = Arc::new(MemoryBackend::new());
        let c = ensure_collection(backend, "docs", space(2), HnswParams::default())
            .await
            .unwrap();
        c.insert(vec![
            rec("x", vec![5.0, 5.0]),
            rec("y", vec![1.0, 1.0]),
            rec("z", vec![2.0, 2.0]),
        ])
        .await
        .unwrap();
        c.flush().await.unwrap();

        let hits = c.search(vec![0.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[tokio::test]
    async fn reset_empties_the_collection() {
        let backend: Arc<dyn VectorBackend> = Arc::new(MemoryBackend::new());
        let c = ensure_collection(backend, "docs", space(2), HnswParams::default())
            .await
            .unwrap();
        c.insert(vec![rec("a", vec![0.0, 0.0])]).await.unwrap();
        c.flush().await.unwrap();
        c.reset().await.unwrap();
        assert_eq!(c.count().await.unwrap(), 0);
        assert_eq!(c.space(), space(2));
    }
}
