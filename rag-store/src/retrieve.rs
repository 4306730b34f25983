//! Retrieval helpers: semantic search for a text query and LLM context assembly.

use tracing::{debug, trace};

use crate::embed::{EmbeddingsProvider, embed_checked};
use crate::errors::RagError;
use crate::record::SearchHit;
use crate::vector_index::Collection;

/// Embeds `query` and returns up to `top_k` hits, closest first.
///
/// # Errors
/// - [`RagError::InvalidInput`] for an empty or whitespace-only query
/// - embedding or backend failures
pub async fn search(
    collection: &Collection,
    provider: &dyn EmbeddingsProvider,
    query: &str,
    top_k: usize,
) -> Result<Vec<SearchHit>, RagError> {
    trace!(target: "rag_store::retrieve", top_k, "search");
    let query = query.trim();
    if query.is_empty() {
        return Err(RagError::InvalidInput("query must not be empty".into()));
    }

    let mut vectors = embed_checked(provider, &[query.to_string()]).await?;
    let vector = vectors
        .pop()
        .ok_or_else(|| RagError::Embedding("no vector returned for the query".into()))?;

    let hits = collection.search(vector, top_k).await?;
    debug!(
        target: "rag_store::retrieve",
        hits = hits.len(),
        best = hits.first().map(|h| h.score),
        "search completed"
    );
    Ok(hits)
}

/// Renders hits as numbered context blocks for a prompt.
///
/// ```text
/// [Document 1 - contrat.txt]
/// <text>
///
/// [Document 2 - faq.csv]
/// <text>
/// ```
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, h)| format!("[Document {} - {}]\n{}", i + 1, h.source, h.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(text: &str, source: &str) -> SearchHit {
        SearchHit {
            text: text.into(),
            source: source.into(),
            score: 0.5,
        }
    }

    #[test]
    fn context_blocks_are_numbered_from_one() {
        let ctx = format_context(&[hit("Article 1.", "a.txt"), hit("Article 2.", "b.html")]);
        assert_eq!(
            ctx,
            "[Document 1 - a.txt]\nArticle 1.\n\n[Document 2 - b.html]\nArticle 2."
        );
    }

    #[test]
    fn empty_hits_give_empty_context() {
        assert_eq!(format_context(&[]), "");
    }
}
