use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Request fields the hint heuristics know about.
const KNOWN_FIELDS: &[&str] = &["query", "top_k", "force_reindex", "file"];

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn guess_path_from_serde_msg(msg: &str) -> Option<String> {
    KNOWN_FIELDS
        .iter()
        .find(|key| msg.contains(*key))
        .map(|key| key.to_string())
}

fn hint_from_serde_msg(msg: &str) -> Option<String> {
    if msg.contains("missing field") {
        Some("Add the missing field to the JSON body.".into())
    } else if msg.contains("expected a string") {
        Some("Expected a JSON string here (e.g. \"clause de resiliation\").".into())
    } else if msg.contains("expected usize") || msg.contains("invalid type: string") {
        Some("Expected a non-negative integer here (e.g. 3).".into())
    } else if msg.contains("expected a boolean") {
        Some("Expected true or false here.".into())
    } else if msg.contains("Content-Type") {
        Some("Send the body with `Content-Type: application/json`.".into())
    } else {
        None
    }
}

fn ensure_request_id(parts: &mut axum::http::response::Parts) -> String {
    if let Some(v) = parts
        .headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return v.to_string();
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    let id = format!("req-{nanos}");
    if let Ok(value) = HeaderValue::from_str(&id) {
        parts.headers.insert("X-Request-Id", value);
    }
    id
}

fn is_envelope(bytes: &[u8]) -> bool {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .map(|v| v.get("success").is_some())
        .unwrap_or(false)
}

/// Rewrites plain-text 400/422 rejections (bad JSON, wrong types, missing
/// fields) into the [`ApiResponse`] error envelope.
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    // Only 400/422 are mapped; everything else passes through untouched.
    if !(status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY) {
        return res;
    }

    let (mut parts, bytes) = take_body(res).await;
    let req_id = ensure_request_id(&mut parts);
    if is_envelope(&bytes) {
        return Response::from_parts(parts, bytes.into());
    }

    let original = String::from_utf8_lossy(&bytes);
    debug!(request_id = %req_id, %status, body = %original.trim(), "mapping rejection");

    let detail = ApiErrorDetail {
        path: guess_path_from_serde_msg(&original),
        hint: hint_from_serde_msg(&original),
    };
    let details = if detail.path.is_some() || detail.hint.is_some() {
        vec![detail]
    } else {
        Vec::new()
    };

    let envelope = ApiResponse::error(
        if status == StatusCode::BAD_REQUEST {
            "BAD_REQUEST"
        } else {
            "UNPROCESSABLE_ENTITY"
        },
        original.trim(),
    )
    .with_details(details);

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_messages_point_at_fields() {
        let msg = "Failed to deserialize the JSON body into the target type: missing field `query` at line 1 column 2";
        assert_eq!(guess_path_from_serde_msg(msg).as_deref(), Some("query"));
        assert!(hint_from_serde_msg(msg).unwrap().contains("missing"));
        assert_eq!(guess_path_from_serde_msg("EOF while parsing"), None);
    }

    #[test]
    fn envelopes_are_detected() {
        assert!(is_envelope(br#"{"success":false,"error":{"code":"X","message":"y"}}"#));
        assert!(!is_envelope(b"Failed to parse the request body as JSON"));
    }
}
