//! Core data models used by the library.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::RagError;

/// Maximum stored text size, in bytes.
pub const MAX_TEXT_BYTES: usize = 65_535;
/// Maximum stored source size, in bytes.
pub const MAX_SOURCE_BYTES: usize = 512;

/// A unit of text ready for embedding, tagged with the file it came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentChunk {
    text: String,
    source: String,
}

impl DocumentChunk {
    /// Builds a chunk; both fields must be non-blank.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Result<Self, RagError> {
        let text = text.into();
        let source = source.into();
        if text.trim().is_empty() {
            return Err(RagError::InvalidInput("chunk text is empty".into()));
        }
        if source.trim().is_empty() {
            return Err(RagError::InvalidInput("chunk source is empty".into()));
        }
        Ok(Self { text, source })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_parts(self) -> (String, String) {
        (self.text, self.source)
    }
}

/// Insert payload: a chunk with its vector, before the index assigns an id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRecord {
    pub text: String,
    pub source: String,
    pub vector: Vec<f32>,
}

impl NewRecord {
    pub fn from_chunk(chunk: DocumentChunk, vector: Vec<f32>) -> Self {
        let (text, source) = chunk.into_parts();
        Self {
            text,
            source,
            vector,
        }
    }

    /// Checks the schema bounds of a collection with dimension `dim`.
    pub fn check(&self, dim: usize) -> Result<(), RagError> {
        if self.vector.len() != dim {
            return Err(RagError::DimensionMismatch {
                got: self.vector.len(),
                want: dim,
            });
        }
        if self.text.len() > MAX_TEXT_BYTES {
            return Err(RagError::FieldTooLong {
                field: "text",
                len: self.text.len(),
                max: MAX_TEXT_BYTES,
            });
        }
        if self.source.len() > MAX_SOURCE_BYTES {
            return Err(RagError::FieldTooLong {
                field: "source",
                len: self.source.len(),
                max: MAX_SOURCE_BYTES,
            });
        }
        Ok(())
    }
}

/// Stored form of a record; `id` is generated by the index.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedRecord {
    pub id: i64,
    pub text: String,
    pub source: String,
    pub vector: Vec<f32>,
}

/// A single retrieval hit. `score` is a distance: lower is more similar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// Supported input formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Text,
    Html,
    Csv,
}

impl FileKind {
    /// Resolves an extension (without the dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(FileKind::Text),
            "html" | "htm" => Some(FileKind::Html),
            "csv" => Some(FileKind::Csv),
            _ => None,
        }
    }

    /// Resolves the kind of a path or fails with `UnsupportedFormat`.
    pub fn from_path(path: &Path) -> Result<Self, RagError> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| RagError::UnsupportedFormat(path.display().to_string()))
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Text => "txt",
            FileKind::Html => "html",
            FileKind::Csv => "csv",
        }
    }
}

impl FromStr for FileKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('.');
        Self::from_extension(s).ok_or_else(|| RagError::UnsupportedFormat(s.to_string()))
    }
}

/// Outcome of a folder indexing run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub chunks_indexed: usize,
    /// The collection already held data and no reindex was requested.
    pub skipped_existing: bool,
    pub total_records: u64,
    pub duration_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_requires_text_and_source() {
        assert!(DocumentChunk::new("clause 1", "bail.txt").is_ok());
        assert!(matches!(
            DocumentChunk::new("  \n", "bail.txt"),
            Err(RagError::InvalidInput(_))
        ));
        assert!(DocumentChunk::new("clause 1", "").is_err());
    }

    #[test]
    fn file_kind_resolution() {
        assert_eq!(FileKind::from_path(Path::new("a/b/Notes.TXT")).unwrap(), FileKind::Text);
        assert_eq!(FileKind::from_path(Path::new("page.htm")).unwrap(), FileKind::Html);
        assert_eq!("csv".parse::<FileKind>().unwrap(), FileKind::Csv);
        assert_eq!(".html".parse::<FileKind>().unwrap(), FileKind::Html);
        assert!(matches!(
            FileKind::from_path(Path::new("scan.pdf")),
            Err(RagError::UnsupportedFormat(_))
        ));
        assert!(FileKind::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn stats_and_hits_serialize_flat() {
        let stats = IndexStats {
            files_loaded: 2,
            chunks_indexed: 5,
            total_records: 5,
            ..IndexStats::default()
        };
        let v = serde_json::to_value(&stats).unwrap();
        assert_eq!(v["files_loaded"], 2);
        assert_eq!(v["skipped_existing"], false);

        let hit = SearchHit {
            text: "t".into(),
            source: "a.txt".into(),
            score: 0.25,
        };
        assert_eq!(
            serde_json::to_value(&hit).unwrap(),
            serde_json::json!({ "text": "t", "source": "a.txt", "score": 0.25 })
        );
    }

    #[test]
    fn record_bounds_are_checked() {
        let rec = NewRecord {
            text: "t".into(),
            source: "s".into(),
            vector: vec![0.0; 3],
        };
        rec.check(3).unwrap();
        assert!(matches!(
            rec.check(4),
            Err(RagError::DimensionMismatch { got: 3, want: 4 })
        ));
        let long = NewRecord {
            source: "x".repeat(MAX_SOURCE_BYTES + 1),
            ..rec
        };
        assert!(matches!(
            long.check(3),
            Err(RagError::FieldTooLong { field: "source", .. })
        ));
    }
}
