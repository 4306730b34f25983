use ai_llm_service::HealthStatus;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when the vector store answers and the embedding probe (if any) passes.
    pub status: &'static str,
    pub vector_store_ready: bool,
    pub documents_indexed: u64,
    pub collection: String,
    pub backend: &'static str,
    /// `None` when no remote embedding service is configured.
    pub embedding: Option<HealthStatus>,
}
