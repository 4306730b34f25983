//! Unified error types for the crate.

use std::io::ErrorKind;

use ai_llm_service::AiLlmError;
use qdrant_client::QdrantError;
use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid or missing configuration (fatal at startup).
    #[error("config error: {0}")]
    Config(String),

    /// A backend (vector index or embedding service) could not be reached.
    #[error("{backend} unreachable: {message}")]
    Connection {
        backend: &'static str,
        message: String,
    },

    /// The vector index rejected or failed an operation it did receive.
    #[error("vector index error: {0}")]
    Backend(String),

    /// File kind outside {txt, html, csv}.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Vector length differs from the collection dimension.
    #[error("vector size mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    /// Indexing failed after `committed` of `total` chunks were written.
    #[error("indexing stopped after {committed}/{total} chunks: {source}")]
    PartialIndex {
        committed: usize,
        total: usize,
        #[source]
        source: Box<RagError>,
    },

    /// Embedding call failed or answered with an unusable payload.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// A stored field exceeds the schema bound.
    #[error("field `{field}` is {len} bytes, limit is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Caller supplied an empty or malformed value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding errors.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl RagError {
    /// Wraps a Qdrant client error. gRPC `Unavailable` / `DeadlineExceeded`
    /// and socket-level I/O failures become `Connection`.
    pub(crate) fn qdrant(err: QdrantError) -> Self {
        let unreachable = match &err {
            QdrantError::ResponseError { status } => is_unreachable_code(status.code().into()),
            QdrantError::Io(io) => is_unreachable_io(io.kind()),
            _ => false,
        };
        if unreachable {
            RagError::Connection {
                backend: "qdrant",
                message: err.to_string(),
            }
        } else {
            RagError::Backend(err.to_string())
        }
    }

    /// `true` for failures of a remote dependency rather than of the input.
    pub fn is_connection(&self) -> bool {
        match self {
            RagError::Connection { .. } => true,
            RagError::PartialIndex { source, .. } => source.is_connection(),
            _ => false,
        }
    }
}

/// gRPC status codes for DEADLINE_EXCEEDED and UNAVAILABLE.
const GRPC_DEADLINE_EXCEEDED: i32 = 4;
const GRPC_UNAVAILABLE: i32 = 14;

fn is_unreachable_code(code: i32) -> bool {
    matches!(code, GRPC_DEADLINE_EXCEEDED | GRPC_UNAVAILABLE)
}

fn is_unreachable_io(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::TimedOut
    )
}

impl From<AiLlmError> for RagError {
    fn from(err: AiLlmError) -> Self {
        match err {
            AiLlmError::Config(e) => RagError::Config(e.to_string()),
            e if e.is_unreachable() => RagError::Connection {
                backend: "embedding service",
                message: e.to_string(),
            },
            e => RagError::Embedding(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qdrant_unreachable_codes_are_connection_errors() {
        assert!(is_unreachable_code(GRPC_UNAVAILABLE));
        assert!(is_unreachable_code(GRPC_DEADLINE_EXCEEDED));
        // NOT_FOUND, INVALID_ARGUMENT, RESOURCE_EXHAUSTED
        assert!(!is_unreachable_code(5));
        assert!(!is_unreachable_code(3));
        assert!(!is_unreachable_code(8));
    }

    #[test]
    fn qdrant_errors_are_classified_by_variant_not_wording() {
        let refused = QdrantError::Io(std::io::Error::new(ErrorKind::ConnectionRefused, "refused"));
        assert!(RagError::qdrant(refused).is_connection());

        // Message mentions "connect" but is a conversion failure.
        let conv = QdrantError::ConversionError("cannot connect sparse to dense".into());
        assert!(matches!(RagError::qdrant(conv), RagError::Backend(_)));
    }

    #[test]
    fn partial_index_reports_progress_and_cause() {
        let e = RagError::PartialIndex {
            committed: 100,
            total: 250,
            source: Box::new(RagError::Connection {
                backend: "embedding service",
                message: "timed out".into(),
            }),
        };
        assert!(e.is_connection());
        assert_eq!(
            e.to_string(),
            "indexing stopped after 100/250 chunks: embedding service unreachable: timed out"
        );
    }
}
