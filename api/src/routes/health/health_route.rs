use std::sync::Arc;

use axum::{extract::State, response::Response};
use tracing::{debug, warn};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    routes::health::health_response::HealthResponse,
};

/// Always answers 200; degradation is reported in the body.
pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let (vector_store_ready, documents_indexed) = match state.store.count().await {
        Ok(n) => (true, n),
        Err(err) => {
            warn!(error = %err, "health: vector store not ready");
            (false, 0)
        }
    };

    let embedding = match &state.embedding {
        Some(svc) => Some(svc.health().await),
        None => None,
    };
    let embedding_ok = embedding.as_ref().is_none_or(|h| h.ok);

    let collection = state.store.collection();
    let body = HealthResponse {
        status: if vector_store_ready && embedding_ok {
            "healthy"
        } else {
            "degraded"
        },
        vector_store_ready,
        documents_indexed,
        collection: collection.name().to_string(),
        backend: collection.backend_name(),
        embedding,
    };
    debug!(status = body.status, documents = documents_indexed, "health: done");

    ApiResponse::ok(body)
}
