//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! This facade concentrates all Qdrant interactions behind [`VectorBackend`],
//! hiding away the verbose builder pattern and keeping the rest of the crate
//! decoupled from `qdrant-client`.
//!
//! Mapping:
//! - collections carry one dense vector field plus `text`/`source` payload
//! - index: HNSW (`m`, `ef_construct`), search with `hnsw_ef`
//! - upserts use `wait=true`, so a write is visible once acknowledged and
//!   `flush` only confirms the collection is still reachable
//! - Qdrant serves collections as soon as they exist; `load` checks the status

use std::collections::HashMap;

use futures::future::BoxFuture;
use qdrant_client::{Payload, Qdrant};
use qdrant_client::qdrant::{
    CollectionStatus, CountPointsBuilder, CreateCollectionBuilder, Distance,
    HnswConfigDiffBuilder, PointStruct, SearchParamsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QValue, VectorParamsBuilder, value::Kind, vectors_config,
};
use tracing::{debug, info, warn};

use crate::backend::{VectorBackend, generate_id};
use crate::config::{DistanceKind, HnswParams, RagConfig, VectorSpace};
use crate::errors::RagError;
use crate::record::{NewRecord, SearchHit};

/// A facade over the Qdrant client.
pub struct QdrantFacade {
    client: Qdrant,
    distance: DistanceKind,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    ///
    /// Uses the builder-based API of `qdrant-client` and supports optional
    /// API key authentication.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(|e| RagError::Config(e.to_string()))?;

        Ok(Self {
            client,
            distance: cfg.distance,
        })
    }

    async fn info(&self, collection: &str) -> Result<qdrant_client::qdrant::CollectionInfo, RagError> {
        self.client
            .collection_info(collection)
            .await
            .map_err(RagError::qdrant)?
            .result
            .ok_or_else(|| RagError::Backend(format!("no info returned for `{collection}`")))
    }
}

fn to_qdrant_distance(kind: DistanceKind) -> Distance {
    match kind {
        DistanceKind::Cosine => Distance::Cosine,
        DistanceKind::Dot => Distance::Dot,
        DistanceKind::Euclid => Distance::Euclid,
    }
}

fn payload_str(payload: &HashMap<String, QValue>, key: &str) -> String {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => s.clone(),
        _ => String::new(),
    }
}

impl VectorBackend for QdrantFacade {
    fn name(&self) -> &'static str {
        "qdrant"
    }

    fn collection_dim<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Option<usize>, RagError>> {
        Box::pin(async move {
            let exists = self
                .client
                .collection_exists(collection)
                .await
                .map_err(RagError::qdrant)?;
            if !exists {
                return Ok(None);
            }

            let info = self.info(collection).await?;
            let dim = info
                .config
                .and_then(|c| c.params)
                .and_then(|p| p.vectors_config)
                .and_then(|v| v.config)
                .and_then(|cfg| match cfg {
                    vectors_config::Config::Params(p) => Some(p.size as usize),
                    vectors_config::Config::ParamsMap(_) => None,
                })
                .ok_or_else(|| {
                    RagError::Backend(format!(
                        "collection `{collection}` has no single unnamed vector field"
                    ))
                })?;
            Ok(Some(dim))
        })
    }

    fn create_collection<'a>(
        &'a self,
        collection: &'a str,
        space: VectorSpace,
        hnsw: HnswParams,
    ) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            info!(
                target: "rag_store::qdrant",
                collection,
                size = space.size,
                distance = ?space.distance,
                m = hnsw.m,
                ef_construct = hnsw.ef_construct,
                "creating collection"
            );
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(collection)
                        .vectors_config(VectorParamsBuilder::new(
                            space.size as u64,
                            to_qdrant_distance(space.distance),
                        ))
                        .hnsw_config(
                            HnswConfigDiffBuilder::default()
                                .m(hnsw.m as u64)
                                .ef_construct(hnsw.ef_construct as u64),
                        ),
                )
                .await
                .map_err(RagError::qdrant)?;
            Ok(())
        })
    }

    fn load_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            let info = self.info(collection).await?;
            if info.status == CollectionStatus::Red as i32 {
                return Err(RagError::Backend(format!(
                    "collection `{collection}` is in red status"
                )));
            }
            if info.status == CollectionStatus::Yellow as i32 {
                warn!(target: "rag_store::qdrant", collection, "collection is optimizing");
            }
            Ok(())
        })
    }

    fn drop_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            self.client
                .delete_collection(collection)
                .await
                .map_err(RagError::qdrant)?;
            info!(target: "rag_store::qdrant", collection, "collection dropped");
            Ok(())
        })
    }

    fn insert<'a>(
        &'a self,
        collection: &'a str,
        records: Vec<NewRecord>,
    ) -> BoxFuture<'a, Result<Vec<i64>, RagError>> {
        Box::pin(async move {
            if records.is_empty() {
                return Ok(Vec::new());
            }

            let mut ids = Vec::with_capacity(records.len());
            let mut points = Vec::with_capacity(records.len());
            for r in records {
                let id = generate_id();
                let mut payload = Payload::new();
                payload.insert("text", r.text);
                payload.insert("source", r.source);
                points.push(PointStruct::new(id as u64, r.vector, payload));
                ids.push(id);
            }

            debug!(target: "rag_store::qdrant", collection, points = points.len(), "upserting");
            self.client
                .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
                .await
                .map_err(RagError::qdrant)?;
            Ok(ids)
        })
    }

    fn flush<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            self.info(collection).await?;
            Ok(())
        })
    }

    fn count<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<u64, RagError>> {
        Box::pin(async move {
            let res = self
                .client
                .count(CountPointsBuilder::new(collection).exact(true))
                .await
                .map_err(RagError::qdrant)?;
            Ok(res.result.map_or(0, |r| r.count))
        })
    }

    fn search<'a>(
        &'a self,
        collection: &'a str,
        query: Vec<f32>,
        top_k: usize,
        search_ef: usize,
    ) -> BoxFuture<'a, Result<Vec<SearchHit>, RagError>> {
        Box::pin(async move {
            let res = self
                .client
                .search_points(
                    SearchPointsBuilder::new(collection, query, top_k as u64)
                        .with_payload(true)
                        .params(SearchParamsBuilder::default().hnsw_ef(search_ef as u64)),
                )
                .await
                .map_err(RagError::qdrant)?;

            let hits = res
                .result
                .into_iter()
                .map(|p| SearchHit {
                    text: payload_str(&p.payload, "text"),
                    source: payload_str(&p.payload, "source"),
                    score: self.distance.score_to_distance(p.score),
                })
                .collect::<Vec<_>>();
            debug!(target: "rag_store::qdrant", collection, hits = hits.len(), "search completed");
            Ok(hits)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_strings_are_extracted() {
        let mut p = HashMap::new();
        p.insert("text".to_string(), QValue::from("alinéa".to_string()));
        p.insert("n".to_string(), QValue::from(3_i64));
        assert_eq!(payload_str(&p, "text"), "alinéa");
        assert_eq!(payload_str(&p, "n"), "");
        assert_eq!(payload_str(&p, "source"), "");
    }

    #[test]
    fn distances_map_one_to_one() {
        assert_eq!(to_qdrant_distance(DistanceKind::Euclid), Distance::Euclid);
        assert_eq!(to_qdrant_distance(DistanceKind::Cosine), Distance::Cosine);
    }
}
