use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Envelope shared by every handler and the rejection mapper.
///
/// ```json
/// { "success": true, "data": { ... } }
/// { "success": false, "error": { "code": "UNSUPPORTED_FORMAT", "message": "..." } }
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Machine-readable code, e.g. `INVALID_INPUT`.
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ApiErrorDetail>,
}

/// Points a client at the offending request field.
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// `200 OK` with `data` in the envelope.
    pub fn ok(data: T) -> Response {
        Self::success(data).into_response_with_status(StatusCode::OK)
    }

    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl ApiResponse<()> {
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
                details: Vec::new(),
            }),
        }
    }

    pub fn with_details(mut self, details: Vec<ApiErrorDetail>) -> Self {
        if let Some(err) = self.error.as_mut() {
            err.details = details;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_error() {
        let v = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(v, serde_json::json!({ "success": true, "data": 3 }));
    }

    #[test]
    fn error_envelope_omits_data_and_empty_details() {
        let v = serde_json::to_value(ApiResponse::error("BAD_REQUEST", "nope")).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "success": false,
                "error": { "code": "BAD_REQUEST", "message": "nope" }
            })
        );
    }

    #[test]
    fn details_are_attached_to_the_error() {
        let env = ApiResponse::error("BAD_REQUEST", "missing field").with_details(vec![
            ApiErrorDetail {
                path: Some("query".into()),
                hint: None,
            },
        ]);
        let v = serde_json::to_value(env).unwrap();
        assert_eq!(v["error"]["details"][0]["path"], "query");
    }
}
