//! Exact in-process vector backend.
//!
//! Inserts are staged and only become visible to `count`/`search` after
//! `flush`. Search scans every committed record and is exact, so the
//! candidate-list size is ignored.

use std::collections::HashMap;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::{VectorBackend, generate_id};
use crate::config::{HnswParams, VectorSpace};
use crate::errors::RagError;
use crate::record::{IndexedRecord, NewRecord, SearchHit};

struct MemCollection {
    space: VectorSpace,
    loaded: bool,
    committed: Vec<IndexedRecord>,
    staged: Vec<IndexedRecord>,
}

#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, MemCollection>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written but not yet flushed.
    pub async fn staged_len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |c| c.staged.len())
    }
}

fn missing(collection: &str) -> RagError {
    RagError::Backend(format!("collection `{collection}` does not exist"))
}

impl VectorBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn collection_dim<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Option<usize>, RagError>> {
        Box::pin(async move {
            Ok(self
                .collections
                .read()
                .await
                .get(collection)
                .map(|c| c.space.size))
        })
    }

    fn create_collection<'a>(
        &'a self,
        collection: &'a str,
        space: VectorSpace,
        _hnsw: HnswParams,
    ) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            let mut map = self.collections.write().await;
            if map.contains_key(collection) {
                return Err(RagError::Backend(format!(
                    "collection `{collection}` already exists"
                )));
            }
            map.insert(
                collection.to_string(),
                MemCollection {
                    space,
                    loaded: false,
                    committed: Vec::new(),
                    staged: Vec::new(),
                },
            );
            debug!(target: "rag_store::memory", collection, dim = space.size, "collection created");
            Ok(())
        })
    }

    fn load_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            let mut map = self.collections.write().await;
            let c = map.get_mut(collection).ok_or_else(|| missing(collection))?;
            c.loaded = true;
            Ok(())
        })
    }

    fn drop_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            self.collections.write().await.remove(collection);
            Ok(())
        })
    }

    fn insert<'a>(
        &'a self,
        collection: &'a str,
        records: Vec<NewRecord>,
    ) -> BoxFuture<'a, Result<Vec<i64>, RagError>> {
        Box::pin(async move {
            let mut map = self.collections.write().await;
            let c = map.get_mut(collection).ok_or_else(|| missing(collection))?;
            for r in &records {
                r.check(c.space.size)?;
            }
            let mut ids = Vec::with_capacity(records.len());
            for r in records {
                let id = generate_id();
                ids.push(id);
                c.staged.push(IndexedRecord {
                    id,
                    text: r.text,
                    source: r.source,
                    vector: r.vector,
                });
            }
            Ok(ids)
        })
    }

    fn flush<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            let mut map = self.collections.write().await;
            let c = map.get_mut(collection).ok_or_else(|| missing(collection))?;
            let staged = std::mem::take(&mut c.staged);
            c.committed.extend(staged);
            Ok(())
        })
    }

    fn count<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<u64, RagError>> {
        Box::pin(async move {
            let map = self.collections.read().await;
            let c = map.get(collection).ok_or_else(|| missing(collection))?;
            Ok(c.committed.len() as u64)
        })
    }

    fn search<'a>(
        &'a self,
        collection: &'a str,
        query: Vec<f32>,
        top_k: usize,
        _search_ef: usize,
    ) -> BoxFuture<'a, Result<Vec<SearchHit>, RagError>> {
        Box::pin(async move {
            let map = self.collections.read().await;
            let c = map.get(collection).ok_or_else(|| missing(collection))?;
            if !c.loaded {
                return Err(RagError::Backend(format!(
                    "collection `{collection}` is not loaded"
                )));
            }
            if query.len() != c.space.size {
                return Err(RagError::DimensionMismatch {
                    got: query.len(),
                    want: c.space.size,
                });
            }

            let mut scored: Vec<(f32, &IndexedRecord)> = c
                .committed
                .iter()
                .map(|r| (c.space.distance.distance(&query, &r.vector), r))
                .collect();
            scored.sort_by(|a, b| a.0.total_cmp(&b.0));
            scored.truncate(top_k);

            Ok(scored
                .into_iter()
                .map(|(score, r)| SearchHit {
                    text: r.text.clone(),
                    source: r.source.clone(),
                    score,
                })
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceKind;

    fn space(size: usize) -> VectorSpace {
        VectorSpace {
            size,
            distance: DistanceKind::Euclid,
        }
    }

    fn rec(text: &str, v: [f32; 2]) -> NewRecord {
        NewRecord {
            text: text.into(),
            source: "t.txt".into(),
            vector: v.to_vec(),
        }
    }

    #[tokio::test]
    async fn writes_are_visible_only_after_flush() {
        let b = MemoryBackend::new();
        b.create_collection("c", space(2), HnswParams::default()).await.unwrap();
        b.load_collection("c").await.unwrap();
        b.insert("c", vec![rec("a", [0.0, 0.0])]).await.unwrap();
        assert_eq!(b.count("c").await.unwrap(), 0);
        assert_eq!(b.staged_len("c").await, 1);
        assert!(b.search("c", vec![0.0, 0.0], 3, 64).await.unwrap().is_empty());

        b.flush("c").await.unwrap();
        assert_eq!(b.count("c").await.unwrap(), 1);
        assert_eq!(b.search("c", vec![0.0, 0.0], 3, 64).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_requires_a_loaded_collection() {
        let b = MemoryBackend::new();
        b.create_collection("c", space(2), HnswParams::default()).await.unwrap();
        assert!(matches!(
            b.search("c", vec![0.0, 0.0], 1, 64).await,
            Err(RagError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn insert_is_rejected_as_a_whole_on_bad_dimension() {
        let b = MemoryBackend::new();
        b.create_collection("c", space(2), HnswParams::default()).await.unwrap();
        let bad = NewRecord {
            vector: vec![1.0, 2.0, 3.0],
            ..rec("b", [0.0, 0.0])
        };
        let err = b.insert("c", vec![rec("a", [0.0, 0.0]), bad]).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { got: 3, want: 2 }));
        assert_eq!(b.staged_len("c").await, 0);
    }

    #[tokio::test]
    async fn results_are_sorted_by_distance() {
        let b = MemoryBackend::new();
        b.create_collection("c", space(2), HnswParams::default()).await.unwrap();
        b.load_collection("c").await.unwrap();
        b.insert(
            "c",
            vec![rec("far", [10.0, 0.0]), rec("near", [1.0, 0.0]), rec("mid", [3.0, 0.0])],
        )
        .await
        .unwrap();
        b.flush("c").await.unwrap();

        let hits = b.search("c", vec![0.0, 0.0], 2, 64).await.unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["near", "mid"]);
        assert_eq!(hits[0].score, 1.0);
    }
}
