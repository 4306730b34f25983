use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Response,
};
use tracing::{debug, error};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::{index_folder::index_folder_request::IndexFolderRequest, request_id},
};

/// Indexes the data folder. An empty body means `{"force_reindex": false}`.
pub async fn index_folder_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let request_id = request_id(&headers);
    let req: IndexFolderRequest = if body.iter().all(u8::is_ascii_whitespace) {
        IndexFolderRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))?
    };

    debug!(
        request_id = %request_id,
        dir = %state.data_dir.display(),
        force_reindex = req.force_reindex,
        "index_folder_route: start"
    );

    let stats = state
        .store
        .index_folder(&state.data_dir, req.force_reindex)
        .await
        .inspect_err(|err| {
            error!(request_id = %request_id, error = %err, "index_folder_route: failed");
        })?;

    Ok(ApiResponse::ok(stats))
}
