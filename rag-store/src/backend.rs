//! Storage seam of the vector index.
//!
//! Every call names its collection so one backend can host several.
//! `search` returns hits whose `score` is a distance (lower is closer),
//! whatever the metric.

use futures::future::BoxFuture;

use crate::config::{HnswParams, VectorSpace};
use crate::errors::RagError;
use crate::record::{NewRecord, SearchHit};

pub trait VectorBackend: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Vector dimension of an existing collection, `None` if it does not exist.
    fn collection_dim<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Option<usize>, RagError>>;

    fn create_collection<'a>(
        &'a self,
        collection: &'a str,
        space: VectorSpace,
        hnsw: HnswParams,
    ) -> BoxFuture<'a, Result<(), RagError>>;

    /// Makes the collection searchable.
    fn load_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<(), RagError>>;

    fn drop_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<(), RagError>>;

    /// Stores records and returns their generated ids. Records may stay
    /// invisible to `count`/`search` until [`VectorBackend::flush`].
    fn insert<'a>(
        &'a self,
        collection: &'a str,
        records: Vec<NewRecord>,
    ) -> BoxFuture<'a, Result<Vec<i64>, RagError>>;

    /// Makes every prior insert durable and visible.
    fn flush<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<(), RagError>>;

    /// Number of visible records.
    fn count<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<u64, RagError>>;

    /// Approximate nearest neighbours; `search_ef` is the candidate-list size.
    fn search<'a>(
        &'a self,
        collection: &'a str,
        query: Vec<f32>,
        top_k: usize,
        search_ef: usize,
    ) -> BoxFuture<'a, Result<Vec<SearchHit>, RagError>>;
}

/// Random non-negative 63-bit id.
pub(crate) fn generate_id() -> i64 {
    let (hi, _) = uuid::Uuid::new_v4().as_u64_pair();
    (hi & i64::MAX as u64) as i64
}
