use axum::http::HeaderMap;

pub mod health;
pub mod index_folder;
pub mod search;
pub mod upload;

/// Caller-provided `X-Request-Id`, or `-`.
pub(crate) fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
}
