//! Paragraph-aware text chunking.
//!
//! Paragraphs (runs of non-blank lines) are packed greedily into chunks of at
//! most `max_chars` characters, joined by a blank line. A paragraph that does
//! not fit on its own is split on whitespace into word runs joined by single
//! spaces. A single word longer than `max_chars` is emitted as-is.
//!
//! Lengths are counted in Unicode scalar values.

use tracing::trace;

const PARAGRAPH_SEP: &str = "\n\n";

/// Splits `text` into ordered chunks.
///
/// `_overlap` is accepted for profile compatibility and is not applied:
/// consecutive chunks never share text.
///
/// Returns an empty vector for empty or whitespace-only input.
pub fn chunk_text(text: &str, max_chars: usize, _overlap: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut cur = Buffer::default();

    for para in paragraphs(text) {
        let para_len = para.chars().count();

        if cur.len + para_len + 2 <= max_chars {
            cur.push(&para, para_len, PARAGRAPH_SEP);
            continue;
        }

        cur.flush_into(&mut chunks);

        if para_len > max_chars {
            for word in para.split_whitespace() {
                let word_len = word.chars().count();
                if cur.len + word_len + 1 <= max_chars {
                    cur.push(word, word_len, " ");
                } else {
                    cur.flush_into(&mut chunks);
                    cur.push(word, word_len, " ");
                }
            }
            // The trailing word run stays open and may absorb the next paragraph.
        } else {
            cur.push(&para, para_len, PARAGRAPH_SEP);
        }
    }
    cur.flush_into(&mut chunks);

    trace!(chunks = chunks.len(), max_chars, "chunk_text: done");
    chunks
}

/// Trimmed, non-empty paragraphs separated by blank (or whitespace-only) lines.
fn paragraphs(text: &str) -> impl Iterator<Item = String> {
    let mut out = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !lines.is_empty() {
                out.push(lines.join("\n").trim().to_string());
                lines.clear();
            }
        } else {
            lines.push(line);
        }
    }
    if !lines.is_empty() {
        out.push(lines.join("\n").trim().to_string());
    }
    out.into_iter().filter(|p| !p.is_empty())
}

#[derive(Default)]
struct Buffer {
    text: String,
    len: usize,
}

impl Buffer {
    fn push(&mut self, piece: &str, piece_len: usize, sep: &str) {
        if !self.text.is_empty() {
            self.text.push_str(sep);
            self.len += sep.len();
        }
        self.text.push_str(piece);
        self.len += piece_len;
    }

    fn flush_into(&mut self, out: &mut Vec<String>) {
        if !self.text.is_empty() {
            out.push(std::mem::take(&mut self.text));
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    #[test]
    fn blank_input_yields_nothing() {
        assert!(chunk_text("", 500, 50).is_empty());
        assert!(chunk_text(" \n\n \t\n", 500, 50).is_empty());
    }

    #[test]
    fn small_paragraphs_pack_together() {
        let out = chunk_text("Article 1.\n\n\n  Article 2.  \n\nArticle 3.", 500, 50);
        assert_eq!(out, vec!["Article 1.\n\nArticle 2.\n\nArticle 3."]);
    }

    #[test]
    fn overflow_starts_a_new_chunk() {
        let a = "a".repeat(30);
        let b = "b".repeat(30);
        let out = chunk_text(&format!("{a}\n\n{b}"), 50, 0);
        assert_eq!(out, vec![a, b]);
    }

    #[test]
    fn inner_lines_of_a_paragraph_are_kept() {
        let out = chunk_text("line one\nline two\r\n\r\nnext", 500, 0);
        assert_eq!(out, vec!["line one\nline two\n\nnext"]);
    }

    #[test]
    fn oversized_paragraph_is_split_on_words() {
        let para = (0..40).map(|i| format!("mot{i}")).collect::<Vec<_>>().join(" ");
        let out = chunk_text(&para, 20, 0);
        assert!(out.len() > 1);
        for c in &out {
            assert!(c.chars().count() <= 20, "{c:?}");
            assert!(!c.contains("\n\n"));
        }
        assert_eq!(words(&out.join(" ")), words(&para));
    }

    #[test]
    fn trailing_word_run_absorbs_next_paragraph() {
        let out = chunk_text("aaaa bbbb cccc\n\nd", 10, 0);
        assert_eq!(out, vec!["aaaa bbbb", "cccc\n\nd"]);
    }

    #[test]
    fn long_single_word_is_emitted_whole() {
        let word = "x".repeat(64);
        let out = chunk_text(&format!("short\n\n{word}\n\ntail"), 16, 0);
        assert_eq!(out, vec!["short".to_string(), word, "tail".to_string()]);
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let para = "é".repeat(10);
        let out = chunk_text(&format!("{para}\n\n{para}"), 22, 0);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn chunks_are_bounded_and_lossless() {
        let samples = [
            "Le bail est conclu pour une durée de trois ans.\n\nLe loyer est payable mensuellement.\n\n"
                .repeat(20),
            "word ".repeat(700),
            "Titre\n\n".to_string() + &"phrase longue sans fin ".repeat(60) + "\n\nFin.",
        ];
        for text in &samples {
            for max in [40usize, 120, 500] {
                let out = chunk_text(text, max, 50);
                for c in &out {
                    assert!(c.chars().count() <= max);
                    assert_eq!(c.trim(), c);
                }
                let joined = out.join(" ");
                assert_eq!(words(&joined), words(text));
            }
        }
    }
}
