use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    response::Response,
};
use rag_store::{FileKind, RagError};
use tracing::{debug, error, info, warn};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::{request_id, upload::upload_response::UploadResponse},
};

/// Saves the multipart `file` field under the data folder and indexes it.
///
/// Only `.txt`, `.html` and `.csv` are accepted; the kind is checked before
/// anything is written to disk, and the saved file is removed again when
/// indexing it fails.
pub async fn upload_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let request_id = request_id(&headers);

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(base_name)
            .ok_or_else(|| AppError::BadRequest("uploaded file has no usable name".into()))?;
        let kind = FileKind::from_path(Path::new(&file_name))?;
        let data = field.bytes().await?;
        debug!(request_id = %request_id, file = %file_name, bytes = data.len(), "upload_route: received");

        tokio::fs::create_dir_all(&state.data_dir)
            .await
            .map_err(RagError::from)?;
        let dest = state.data_dir.join(&file_name);
        tokio::fs::write(&dest, &data).await.map_err(RagError::from)?;

        let chunks_indexed = match state.store.index_file(&dest, kind).await {
            Ok(n) => n,
            Err(err) => {
                // A rejected file must not stay behind for the next folder run.
                if let Err(rm) = tokio::fs::remove_file(&dest).await {
                    warn!(request_id = %request_id, file = %file_name, error = %rm, "upload_route: cleanup failed");
                }
                error!(request_id = %request_id, file = %file_name, error = %err, "upload_route: indexing failed");
                return Err(err.into());
            }
        };
        let total_documents = state.store.count().await?;
        info!(
            request_id = %request_id,
            file = %file_name,
            chunks = chunks_indexed,
            total = total_documents,
            "upload_route: indexed"
        );

        let body = UploadResponse {
            message: format!("Document '{file_name}' indexed successfully"),
            file_name,
            chunks_indexed,
            total_documents,
        };
        return Ok(ApiResponse::ok(body));
    }

    Err(AppError::BadRequest("multipart field `file` is required".into()))
}

/// Final path component of a client-supplied name; rejects `..` and empty names.
fn base_name(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next()?.trim();
    match last {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_paths_are_reduced_to_base_names() {
        assert_eq!(base_name("bail.txt").as_deref(), Some("bail.txt"));
        assert_eq!(base_name("../../etc/passwd.txt").as_deref(), Some("passwd.txt"));
        assert_eq!(base_name("C:\\docs\\faq.csv").as_deref(), Some("faq.csv"));
        assert_eq!(base_name("docs/"), None);
        assert_eq!(base_name(".."), None);
    }
}
