use rag_store::SearchHit;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub message: String,
    pub query: String,
    /// Hits rendered as numbered `[Document i - source]` blocks.
    pub context: String,
    pub results: Vec<SearchHit>,
}
