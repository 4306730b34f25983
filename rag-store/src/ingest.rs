//! Indexing pipeline: load → chunk → embed in batches → insert → flush.
//!
//! Batches are embedded (optionally several in flight) and inserted in input
//! order. The pipeline is not transactional: when a batch fails after
//! earlier ones were inserted, those stay committed and the error is reported
//! as [`RagError::PartialIndex`].

use std::path::Path;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use crate::config::RagConfig;
use crate::embed::{EmbeddingsProvider, embed_checked};
use crate::errors::RagError;
use crate::loader::{load_file, load_folder};
use crate::record::{DocumentChunk, FileKind, IndexStats, NewRecord};
use crate::vector_index::Collection;

/// Indexes every supported file directly under `dir`.
///
/// Without `force_reindex`, a collection that already holds records is left
/// untouched. With it, the collection is emptied first so the resulting
/// count equals the number of chunks loaded.
pub async fn index_folder(
    cfg: &RagConfig,
    collection: &Collection,
    provider: &dyn EmbeddingsProvider,
    dir: &Path,
    force_reindex: bool,
) -> Result<IndexStats, RagError> {
    let started = Instant::now();
    info!(
        target: "rag_store::ingest",
        dir = %dir.display(),
        force_reindex,
        "index_folder: start"
    );

    if !force_reindex {
        let existing = collection.count().await?;
        if existing > 0 {
            info!(
                target: "rag_store::ingest",
                collection = collection.name(),
                existing,
                "collection already populated; skipping indexing"
            );
            return Ok(IndexStats {
                skipped_existing: true,
                total_records: existing,
                duration_ms: started.elapsed().as_millis(),
                ..IndexStats::default()
            });
        }
    }

    let load = load_folder(dir, &cfg.chunk)?;

    if force_reindex {
        collection.reset().await?;
    }

    let mut stats = IndexStats {
        files_loaded: load.files_loaded,
        files_skipped: load.files_skipped,
        ..IndexStats::default()
    };

    if load.chunks.is_empty() {
        warn!(target: "rag_store::ingest", dir = %dir.display(), "no documents to index");
        stats.total_records = collection.count().await?;
        stats.duration_ms = started.elapsed().as_millis();
        return Ok(stats);
    }

    let batches = load.chunks.len().div_ceil(cfg.embed_batch) as u64;
    let pb = progress_bar(batches);
    let indexed = index_chunks(cfg, collection, provider, load.chunks, Some(&pb)).await;
    pb.finish_and_clear();

    stats.chunks_indexed = indexed?;
    stats.total_records = collection.count().await?;
    stats.duration_ms = started.elapsed().as_millis();

    info!(
        target: "rag_store::ingest",
        chunks = stats.chunks_indexed,
        files = stats.files_loaded,
        skipped_files = stats.files_skipped,
        total = stats.total_records,
        duration_ms = stats.duration_ms as u64,
        "index_folder: done"
    );
    Ok(stats)
}

/// Indexes a single file without any "already populated" check.
///
/// Returns the number of chunks inserted; an empty file yields `0`.
pub async fn index_file(
    cfg: &RagConfig,
    collection: &Collection,
    provider: &dyn EmbeddingsProvider,
    path: &Path,
    kind: FileKind,
) -> Result<usize, RagError> {
    let chunks = load_file(path, kind, &cfg.chunk)?;
    if chunks.is_empty() {
        info!(target: "rag_store::ingest", path = %path.display(), "file produced no chunks");
        return Ok(0);
    }

    let n = index_chunks(cfg, collection, provider, chunks, None).await?;
    info!(
        target: "rag_store::ingest",
        path = %path.display(),
        kind = ?kind,
        chunks = n,
        "index_file: done"
    );
    Ok(n)
}

/// Embeds and inserts `chunks` batch by batch, then flushes once.
pub(crate) async fn index_chunks(
    cfg: &RagConfig,
    collection: &Collection,
    provider: &dyn EmbeddingsProvider,
    chunks: Vec<DocumentChunk>,
    progress: Option<&ProgressBar>,
) -> Result<usize, RagError> {
    let total = chunks.len();
    let batches = into_batches(chunks, cfg.embed_batch);
    debug!(
        target: "rag_store::ingest",
        total,
        batches = batches.len(),
        concurrency = cfg.embedding_concurrency,
        "index_chunks: start"
    );

    let mut embedded = stream::iter(batches)
        .map(|batch| async move {
            let texts: Vec<String> = batch.iter().map(|c| c.text().to_string()).collect();
            let vectors = embed_checked(provider, &texts).await?;
            Ok::<_, RagError>(
                batch
                    .into_iter()
                    .zip(vectors)
                    .map(|(chunk, vector)| NewRecord::from_chunk(chunk, vector))
                    .collect::<Vec<_>>(),
            )
        })
        .buffered(cfg.embedding_concurrency.max(1));

    let mut committed = 0usize;
    while let Some(batch) = embedded.next().await {
        let inserted = match batch {
            Ok(records) => collection.insert(records).await,
            Err(e) => Err(e),
        };
        match inserted {
            Ok(n) => {
                committed += n;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
            }
            Err(e) => return Err(abort(collection, committed, total, e).await),
        }
    }

    if let Err(e) = collection.flush().await {
        return Err(abort(collection, committed, total, e).await);
    }
    Ok(committed)
}

/// Reports a mid-run failure, keeping what was already written visible.
async fn abort(collection: &Collection, committed: usize, total: usize, err: RagError) -> RagError {
    if committed == 0 {
        error!(target: "rag_store::ingest", error = %err, "indexing failed before any write");
        return err;
    }
    if let Err(flush_err) = collection.flush().await {
        warn!(target: "rag_store::ingest", error = %flush_err, "flush after failure did not succeed");
    }
    error!(
        target: "rag_store::ingest",
        committed,
        total,
        error = %err,
        "indexing stopped part way"
    );
    RagError::PartialIndex {
        committed,
        total,
        source: Box::new(err),
    }
}

fn into_batches(chunks: Vec<DocumentChunk>, size: usize) -> Vec<Vec<DocumentChunk>> {
    let size = size.max(1);
    let mut out = Vec::with_capacity(chunks.len().div_ceil(size));
    let mut it = chunks.into_iter().peekable();
    while it.peek().is_some() {
        out.push(it.by_ref().take(size).collect());
    }
    out
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} batches ({eta})",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}
