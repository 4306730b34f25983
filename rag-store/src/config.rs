//! Runtime and collection configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::embed::MAX_EMBED_BATCH;
use crate::errors::RagError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceKind {
    /// Cosine distance.
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

impl DistanceKind {
    /// Turns a backend score into a distance where lower means closer.
    ///
    /// Euclid scores already are distances; similarity scores are flipped.
    pub fn score_to_distance(self, score: f32) -> f32 {
        match self {
            DistanceKind::Euclid => score,
            DistanceKind::Cosine => 1.0 - score,
            DistanceKind::Dot => -score,
        }
    }

    /// Exact distance between two vectors of equal length.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceKind::Euclid => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            DistanceKind::Dot => -dot(a, b),
            DistanceKind::Cosine => {
                let denom = (dot(a, a).sqrt() * dot(b, b).sqrt()).max(f32::EPSILON);
                1.0 - dot(a, b) / denom
            }
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl FromStr for DistanceKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euclid" | "l2" => Ok(DistanceKind::Euclid),
            "cosine" => Ok(DistanceKind::Cosine),
            "dot" | "dotproduct" | "ip" => Ok(DistanceKind::Dot),
            other => Err(RagError::Config(format!("unknown distance metric `{other}`"))),
        }
    }
}

/// Describes the vector space of the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VectorSpace {
    /// Dimensionality of vectors.
    pub size: usize,
    /// Distance function.
    pub distance: DistanceKind,
}

/// ANN index parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HnswParams {
    /// Graph degree.
    pub m: usize,
    /// Candidate list size while building.
    pub ef_construct: usize,
    /// Candidate list size while searching.
    pub search_ef: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construct: 100,
            search_ef: 64,
        }
    }
}

/// Which vector index implementation to talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Qdrant,
    Memory,
}

impl FromStr for BackendKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(BackendKind::Qdrant),
            "memory" | "in-memory" => Ok(BackendKind::Memory),
            other => Err(RagError::Config(format!("unknown vector backend `{other}`"))),
        }
    }
}

/// Chunking profile.
///
/// `overlap` is carried for configuration compatibility and is not applied:
/// produced chunks never share text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkOptions {
    pub max_chars: usize,
    pub overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_chars: 500,
            overlap: 50,
        }
    }
}

/// Configuration for indexing and retrieval.
#[derive(Clone, Debug)]
pub struct RagConfig {
    pub backend: BackendKind,
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Embedding dimension; fixed for the collection's lifetime.
    pub embedding_dim: usize,
    pub distance: DistanceKind,
    pub hnsw: HnswParams,
    /// Texts per embedding call and per insert (1..=100).
    pub embed_batch: usize,
    /// Embedding batches in flight during indexing.
    pub embedding_concurrency: usize,
    pub chunk: ChunkOptions,
    /// Default number of hits for `search`.
    pub top_k: usize,
}

impl RagConfig {
    /// Creates a sane default config for a given collection name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Qdrant,
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            embedding_dim: 1536,
            distance: DistanceKind::Euclid,
            hnsw: HnswParams::default(),
            embed_batch: MAX_EMBED_BATCH,
            embedding_concurrency: 1,
            chunk: ChunkOptions::default(),
            top_k: 3,
        }
    }

    /// In-memory profile used by tests and offline runs.
    pub fn in_memory(collection: impl Into<String>, embedding_dim: usize) -> Self {
        Self {
            backend: BackendKind::Memory,
            embedding_dim,
            ..Self::new_default("memory://", collection)
        }
    }

    /// Build configuration from environment variables.
    ///
    /// Environment variables used:
    /// - `VECTOR_BACKEND` (`qdrant` | `memory`; default: `qdrant`)
    /// - `QDRANT_URL` (default: `http://localhost:6334`)
    /// - `QDRANT_API_KEY` (optional)
    /// - `RAG_COLLECTION` (default: `legal_documents`)
    /// - `EMBEDDING_DIM` (default: 1536)
    /// - `RAG_DISTANCE` (`euclid` | `cosine` | `dot`; default: `euclid`)
    /// - `HNSW_M` (16), `HNSW_EF_CONSTRUCT` (100), `RAG_SEARCH_EF` (64)
    /// - `EMBED_BATCH_SIZE` (default: 100)
    /// - `EMBEDDING_CONCURRENCY` (default: 1)
    /// - `CHUNK_MAX_CHARS` (500), `CHUNK_OVERLAP` (50)
    /// - `RAG_TOP_K` (default: 3)
    pub fn from_env() -> Result<Self, RagError> {
        let backend = match read_string_env("VECTOR_BACKEND") {
            Some(v) => v.parse()?,
            None => BackendKind::Qdrant,
        };
        let distance = match read_string_env("RAG_DISTANCE") {
            Some(v) => v.parse()?,
            None => DistanceKind::Euclid,
        };
        let defaults = HnswParams::default();
        let chunk_defaults = ChunkOptions::default();

        let cfg = Self {
            backend,
            qdrant_url: read_string_env("QDRANT_URL")
                .unwrap_or_else(|| "http://localhost:6334".into()),
            qdrant_api_key: read_string_env("QDRANT_API_KEY"),
            collection: read_string_env("RAG_COLLECTION")
                .unwrap_or_else(|| "legal_documents".into()),
            embedding_dim: read_usize_env("EMBEDDING_DIM")?.unwrap_or(1536),
            distance,
            hnsw: HnswParams {
                m: read_usize_env("HNSW_M")?.unwrap_or(defaults.m),
                ef_construct: read_usize_env("HNSW_EF_CONSTRUCT")?.unwrap_or(defaults.ef_construct),
                search_ef: read_usize_env("RAG_SEARCH_EF")?.unwrap_or(defaults.search_ef),
            },
            embed_batch: read_usize_env("EMBED_BATCH_SIZE")?.unwrap_or(MAX_EMBED_BATCH),
            embedding_concurrency: read_usize_env("EMBEDDING_CONCURRENCY")?.unwrap_or(1),
            chunk: ChunkOptions {
                max_chars: read_usize_env("CHUNK_MAX_CHARS")?.unwrap_or(chunk_defaults.max_chars),
                overlap: read_usize_env("CHUNK_OVERLAP")?.unwrap_or(chunk_defaults.overlap),
            },
            top_k: read_usize_env("RAG_TOP_K")?.unwrap_or(3),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.backend == BackendKind::Qdrant && self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.embedding_dim == 0 {
            return Err(RagError::Config("EMBEDDING_DIM must be > 0".into()));
        }
        if self.embed_batch == 0 || self.embed_batch > MAX_EMBED_BATCH {
            return Err(RagError::Config(format!(
                "EMBED_BATCH_SIZE must be in 1..={MAX_EMBED_BATCH}"
            )));
        }
        if self.embedding_concurrency == 0 {
            return Err(RagError::Config("EMBEDDING_CONCURRENCY must be > 0".into()));
        }
        if self.chunk.max_chars == 0 {
            return Err(RagError::Config("CHUNK_MAX_CHARS must be > 0".into()));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("RAG_TOP_K must be > 0".into()));
        }
        if self.hnsw.m == 0 || self.hnsw.ef_construct == 0 || self.hnsw.search_ef == 0 {
            return Err(RagError::Config("HNSW parameters must be > 0".into()));
        }
        Ok(())
    }

    pub fn vector_space(&self) -> VectorSpace {
        VectorSpace {
            size: self.embedding_dim,
            distance: self.distance,
        }
    }
}

fn read_string_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read an optional `usize` from env; a malformed value is a config error.
fn read_usize_env(key: &str) -> Result<Option<usize>, RagError> {
    match read_string_env(key) {
        Some(v) => v
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| RagError::Config(format!("{key} must be an unsigned integer, got `{v}`"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_profile() {
        let cfg = RagConfig::new_default("http://localhost:6334", "legal_documents");
        cfg.validate().unwrap();
        assert_eq!(cfg.embedding_dim, 1536);
        assert_eq!(cfg.distance, DistanceKind::Euclid);
        assert_eq!(cfg.chunk, ChunkOptions { max_chars: 500, overlap: 50 });
        assert_eq!(cfg.embed_batch, 100);
        assert_eq!(cfg.top_k, 3);
    }

    #[test]
    fn batch_size_is_bounded() {
        let mut cfg = RagConfig::in_memory("c", 4);
        cfg.embed_batch = 101;
        assert!(matches!(cfg.validate(), Err(RagError::Config(_))));
        cfg.embed_batch = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn metric_and_backend_parse() {
        assert_eq!("L2".parse::<DistanceKind>().unwrap(), DistanceKind::Euclid);
        assert_eq!("cosine".parse::<DistanceKind>().unwrap(), DistanceKind::Cosine);
        assert!("manhattan".parse::<DistanceKind>().is_err());
        assert_eq!("Memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
    }

    #[test]
    fn distances_are_lower_for_closer_vectors() {
        let q = [1.0, 0.0];
        let near = [0.9, 0.1];
        let far = [-1.0, 0.0];
        for kind in [DistanceKind::Euclid, DistanceKind::Cosine, DistanceKind::Dot] {
            assert!(kind.distance(&q, &near) < kind.distance(&q, &far), "{kind:?}");
        }
        assert_eq!(DistanceKind::Euclid.distance(&q, &q), 0.0);
        assert_eq!(DistanceKind::Euclid.distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
    }
}
