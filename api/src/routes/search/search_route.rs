use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::Response,
};
use rag_store::format_context;
use tracing::{debug, error};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::{
        request_id,
        search::{search_request::SearchRequest, search_response::SearchResponse},
    },
};

pub async fn search_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(p): Json<SearchRequest>,
) -> AppResult<Response> {
    let request_id = request_id(&headers);
    debug!(
        request_id = %request_id,
        query = %p.query,
        top_k = ?p.top_k,
        "search_route: start"
    );

    let results = state
        .store
        .search(&p.query, p.top_k)
        .await
        .inspect_err(|err| {
            error!(request_id = %request_id, error = %err, "search_route: search failed");
        })?;

    debug!(request_id = %request_id, hits = results.len(), "search_route: success");

    let body = SearchResponse {
        message: "Search completed successfully".to_string(),
        context: format_context(&results),
        query: p.query,
        results,
    };
    Ok(ApiResponse::ok(body))
}
