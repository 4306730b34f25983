//! Turns files into [`DocumentChunk`]s.
//!
//! - Text: strict UTF-8, chunked.
//! - HTML: visible text with block boundaries rendered as blank lines, chunked.
//! - CSV: one chunk per data row, `"column: value"` pairs joined by `", "`.
//!
//! Folder loading reads a single directory level in file-name order and skips
//! unsupported extensions as well as supported files whose content cannot be
//! decoded.

use std::fs;
use std::path::{Path, PathBuf};

use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

use crate::chunker::chunk_text;
use crate::config::ChunkOptions;
use crate::errors::RagError;
use crate::record::{DocumentChunk, FileKind};

/// Result of [`load_folder`].
#[derive(Debug, Default)]
pub struct FolderLoad {
    pub chunks: Vec<DocumentChunk>,
    pub files_loaded: usize,
    pub files_skipped: usize,
}

/// Loads one file of a known kind. `source` is the file name.
pub fn load_file(
    path: &Path,
    kind: FileKind,
    opts: &ChunkOptions,
) -> Result<Vec<DocumentChunk>, RagError> {
    let source = source_name(path);
    let raw = fs::read_to_string(path)?;

    let chunks = match kind {
        FileKind::Text => text_chunks(&raw, &source, opts)?,
        FileKind::Html => text_chunks(&html_visible_text(&raw), &source, opts)?,
        FileKind::Csv => csv_row_chunks(&raw, &source)?,
    };

    debug!(
        target: "rag_store::loader",
        path = %path.display(),
        kind = ?kind,
        chunks = chunks.len(),
        "load_file: done"
    );
    Ok(chunks)
}

/// Loads every supported file directly under `dir`.
pub fn load_folder(dir: &Path, opts: &ChunkOptions) -> Result<FolderLoad, RagError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

    let mut out = FolderLoad::default();
    for path in files {
        match FileKind::from_path(&path) {
            Ok(kind) => match load_file(&path, kind, opts) {
                Ok(chunks) => {
                    out.files_loaded += 1;
                    out.chunks.extend(chunks);
                }
                Err(err) if is_bad_content(&err) => {
                    warn!(
                        target: "rag_store::loader",
                        path = %path.display(),
                        error = %err,
                        "skipping undecodable file"
                    );
                    out.files_skipped += 1;
                }
                Err(err) => return Err(err),
            },
            Err(_) => {
                warn!(
                    target: "rag_store::loader",
                    path = %path.display(),
                    "skipping file with unsupported extension"
                );
                out.files_skipped += 1;
            }
        }
    }

    info!(
        target: "rag_store::loader",
        dir = %dir.display(),
        files = out.files_loaded,
        skipped = out.files_skipped,
        chunks = out.chunks.len(),
        "load_folder: done"
    );
    Ok(out)
}

/// Errors caused by the file's bytes rather than by the filesystem.
fn is_bad_content(err: &RagError) -> bool {
    match err {
        RagError::Io(e) => e.kind() == std::io::ErrorKind::InvalidData,
        RagError::Csv(_) | RagError::FieldTooLong { .. } => true,
        _ => false,
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn text_chunks(
    text: &str,
    source: &str,
    opts: &ChunkOptions,
) -> Result<Vec<DocumentChunk>, RagError> {
    chunk_text(text, opts.max_chars, opts.overlap)
        .into_iter()
        .map(|c| DocumentChunk::new(c, source))
        .collect()
}

/* ---------------------------------- CSV ---------------------------------- */

/// One chunk per data row; empty cells are omitted and rows without any
/// value are dropped.
fn csv_row_chunks(raw: &str, source: &str) -> Result<Vec<DocumentChunk>, RagError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes());
    let headers = reader.headers()?.clone();

    let mut out = Vec::new();
    for row in reader.records() {
        let row = row?;
        let text = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(column, value)| format!("{column}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        if text.is_empty() {
            continue;
        }
        out.push(DocumentChunk::new(text, source)?);
    }
    Ok(out)
}

/* ---------------------------------- HTML --------------------------------- */

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "caption", "dd", "details",
    "dialog", "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1",
    "h2", "h3", "h4", "h5", "h6", "head", "header", "hr", "html", "li", "main", "nav", "ol",
    "p", "pre", "section", "summary", "table", "td", "tfoot", "th", "thead", "title", "tr",
    "ul",
];

/// Extracts visible text; block elements become paragraph boundaries.
pub fn html_visible_text(raw: &str) -> String {
    let document = Html::parse_document(raw);
    let mut sink = BlockText::default();
    walk(document.root_element(), &mut sink);
    sink.finish()
}

fn walk(element: ElementRef<'_>, sink: &mut BlockText) {
    let name = element.value().name();
    if SKIPPED_TAGS.contains(&name) {
        return;
    }
    let block = BLOCK_TAGS.contains(&name);
    if block {
        sink.break_block();
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            sink.push_text(text);
        } else if let Some(el) = ElementRef::wrap(child) {
            walk(el, sink);
        }
    }
    if block {
        sink.break_block();
    }
}

#[derive(Default)]
struct BlockText {
    blocks: Vec<String>,
    current: String,
    pending_space: bool,
}

impl BlockText {
    fn push_text(&mut self, text: &str) {
        let mut words = text.split_whitespace().peekable();
        if words.peek().is_none() {
            if !text.is_empty() {
                self.pending_space = true;
            }
            return;
        }
        let leading_space = text.starts_with(char::is_whitespace);
        if (leading_space || self.pending_space) && !self.current.is_empty() {
            self.current.push(' ');
        }
        for (i, word) in words.enumerate() {
            if i > 0 {
                self.current.push(' ');
            }
            self.current.push_str(word);
        }
        self.pending_space = text.ends_with(char::is_whitespace);
    }

    fn break_block(&mut self) {
        let block = std::mem::take(&mut self.current);
        if !block.is_empty() {
            self.blocks.push(block);
        }
        self.pending_space = false;
    }

    fn finish(mut self) -> String {
        self.break_block();
        self.blocks.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_rows_become_key_value_chunks() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "contrats.csv",
            "type,montant,note\ncontrat,1000,\n,,\navenant,250,signé\n",
        );
        let chunks = load_file(&path, FileKind::Csv, &ChunkOptions::default()).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text()).collect();
        assert_eq!(
            texts,
            vec!["type: contrat, montant: 1000", "type: avenant, montant: 250, note: signé"]
        );
        assert!(chunks.iter().all(|c| c.source() == "contrats.csv"));
    }

    #[test]
    fn html_keeps_blocks_and_drops_scripts() {
        let raw = r#"<html><head><title>Bail</title><style>p{color:red}</style></head>
            <body><h1>Contrat</h1><p>Le loyer est <b>payable</b>
            mensuellement.</p><script>var x = 1;</script><ul><li>Un</li><li>Deux</li></ul></body></html>"#;
        assert_eq!(
            html_visible_text(raw),
            "Bail\n\nContrat\n\nLe loyer est payable mensuellement.\n\nUn\n\nDeux"
        );
    }

    #[test]
    fn html_inline_tags_without_spaces_stay_joined() {
        assert_eq!(html_visible_text("<p>Art<i>icle</i> 3</p>"), "Article 3");
    }

    #[test]
    fn empty_text_file_yields_no_chunks() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "vide.txt", "");
        assert!(load_file(&path, FileKind::Text, &ChunkOptions::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn invalid_utf8_is_an_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, [0x63, 0x61, 0x66, 0xe9]).unwrap();
        assert!(matches!(
            load_file(&path, FileKind::Text, &ChunkOptions::default()),
            Err(RagError::Io(_))
        ));
    }

    #[test]
    fn folder_is_sorted_flat_and_skips_unknown_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "b.txt", "second");
        write(dir.path(), "a.txt", "first");
        write(dir.path(), "scan.pdf", "%PDF-1.4");
        fs::create_dir(dir.path().join("nested")).unwrap();
        write(&dir.path().join("nested"), "c.txt", "ignored");

        let load = load_folder(dir.path(), &ChunkOptions::default()).unwrap();
        assert_eq!(load.files_loaded, 2);
        assert_eq!(load.files_skipped, 1);
        let sources: Vec<&str> = load.chunks.iter().map(|c| c.source()).collect();
        assert_eq!(sources, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn folder_skips_undecodable_files_and_keeps_the_rest() {
        let dir = tempdir().unwrap();
        write(dir.path(), "bail.txt", "Le preneur paie le loyer.");
        fs::write(dir.path().join("latin1.txt"), [0x63, 0x61, 0x66, 0xe9]).unwrap();
        fs::write(dir.path().join("page.html"), b"<p>\xff\xfe</p>").unwrap();

        let load = load_folder(dir.path(), &ChunkOptions::default()).unwrap();
        assert_eq!(load.files_loaded, 1);
        assert_eq!(load.files_skipped, 2);
        assert_eq!(load.chunks.len(), 1);
        assert_eq!(load.chunks[0].source(), "bail.txt");
    }
}
