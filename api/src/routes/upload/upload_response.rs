use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub file_name: String,
    pub chunks_indexed: usize,
    pub total_documents: u64,
}
