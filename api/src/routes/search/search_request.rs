use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Falls back to `RAG_TOP_K` when omitted.
    pub top_k: Option<usize>,
}
