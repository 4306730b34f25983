//! End-to-end indexing and retrieval against the in-memory backend.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use rag_store::{
    EmbeddingsProvider, FileKind, MemoryBackend, RagConfig, RagError, RagStore, VectorBackend,
    format_context, load_folder,
};
use tempfile::TempDir;

const DIM: usize = 8;

/// Deterministic bag-of-bytes embedding: equal texts map to equal vectors.
struct HashEmbedder;

fn hash_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    for (i, b) in text.bytes().enumerate() {
        v[(b as usize + i) % DIM] += 1.0;
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1.0);
    v.iter().map(|x| x / norm).collect()
}

impl EmbeddingsProvider for HashEmbedder {
    fn dim(&self) -> usize {
        DIM
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>, RagError>> {
        Box::pin(async move { Ok(texts.iter().map(|t| hash_vector(t)).collect()) })
    }
}

/// Succeeds for the first `ok_calls` batches, then reports an unreachable service.
struct FlakyEmbedder {
    calls: AtomicUsize,
    ok_calls: usize,
}

impl EmbeddingsProvider for FlakyEmbedder {
    fn dim(&self) -> usize {
        DIM
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>, RagError>> {
        Box::pin(async move {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.ok_calls {
                return Err(RagError::Connection {
                    backend: "embedding service",
                    message: "connection refused".into(),
                });
            }
            Ok(texts.iter().map(|t| hash_vector(t)).collect())
        })
    }
}

async fn store_with(embedder: Arc<dyn EmbeddingsProvider>) -> RagStore {
    let backend: Arc<dyn VectorBackend> = Arc::new(MemoryBackend::new());
    RagStore::connect(RagConfig::in_memory("legal_documents", DIM), embedder, backend)
        .await
        .unwrap()
}

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

fn corpus() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "bail.txt",
        "Le locataire paie le loyer le premier du mois.\n\nLe depot de garantie est restitue sous deux mois.",
    );
    write(
        dir.path(),
        "faq.html",
        "<html><head><script>var x = 1;</script></head><body><h1>Resiliation</h1><p>Preavis de trois mois.</p></body></html>",
    );
    write(
        dir.path(),
        "contrats.csv",
        "type,montant\ncontrat,1000\navenant,250\n",
    );
    write(dir.path(), "scan.pdf", "%PDF-1.4");
    dir
}

#[tokio::test]
async fn folder_indexing_is_idempotent() {
    let dir = corpus();
    let store = store_with(Arc::new(HashEmbedder)).await;

    let first = store.index_folder(dir.path(), false).await.unwrap();
    assert_eq!(first.files_loaded, 3);
    assert_eq!(first.files_skipped, 1);
    assert!(first.chunks_indexed > 0);
    assert_eq!(first.total_records, first.chunks_indexed as u64);

    let second = store.index_folder(dir.path(), false).await.unwrap();
    assert!(second.skipped_existing);
    assert_eq!(second.chunks_indexed, 0);
    assert_eq!(store.count().await.unwrap(), first.total_records);
}

#[tokio::test]
async fn forced_reindex_matches_the_loader_total() {
    let dir = corpus();
    let store = store_with(Arc::new(HashEmbedder)).await;
    store.index_folder(dir.path(), false).await.unwrap();

    let loaded = load_folder(dir.path(), &store.config().chunk).unwrap();
    let stats = store.index_folder(dir.path(), true).await.unwrap();
    assert!(!stats.skipped_existing);
    assert_eq!(stats.chunks_indexed, loaded.chunks.len());
    assert_eq!(store.count().await.unwrap(), loaded.chunks.len() as u64);
}

#[tokio::test]
async fn empty_and_unsupported_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "vide.txt", "");
    write(dir.path(), "scan.pdf", "%PDF-1.4");
    let store = store_with(Arc::new(HashEmbedder)).await;

    assert_eq!(
        store.index_file(dir.path().join("vide.txt"), FileKind::Text).await.unwrap(),
        0
    );
    assert!(matches!(
        store.index_path(dir.path().join("scan.pdf")).await,
        Err(RagError::UnsupportedFormat(_))
    ));

    let stats = store.index_folder(dir.path(), false).await.unwrap();
    assert_eq!(stats.files_loaded, 1);
    assert_eq!(stats.files_skipped, 1);
    assert_eq!(stats.chunks_indexed, 0);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_folder_is_an_io_error() {
    let store = store_with(Arc::new(HashEmbedder)).await;
    let err = store
        .index_folder("/definitely/not/here", false)
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Io(_)));
}

#[tokio::test]
async fn a_chunk_is_its_own_nearest_neighbour() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.txt", "Article un : objet du contrat.");
    write(dir.path(), "b.txt", "Article deux : duree et renouvellement.");
    write(dir.path(), "c.txt", "Article trois : prix et modalites de paiement.");
    let store = store_with(Arc::new(HashEmbedder)).await;
    store.index_folder(dir.path(), false).await.unwrap();

    let hits = store
        .search("Article deux : duree et renouvellement.", Some(1))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source, "b.txt");
    assert!(hits[0].score.abs() < 1e-6);

    let all = store.search("Article", Some(5)).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].score <= w[1].score));

    let ctx = format_context(&hits);
    assert_eq!(
        ctx,
        "[Document 1 - b.txt]\nArticle deux : duree et renouvellement."
    );
}

#[tokio::test]
async fn default_top_k_and_blank_query() {
    let dir = corpus();
    let store = store_with(Arc::new(HashEmbedder)).await;
    store.index_folder(dir.path(), false).await.unwrap();

    let hits = store.search("loyer", None).await.unwrap();
    assert_eq!(hits.len(), store.config().top_k);
    assert!(matches!(
        store.search("   ", None).await,
        Err(RagError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn csv_rows_become_searchable_records() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "contrats.csv", "type,montant\ncontrat,1000\n");
    let store = store_with(Arc::new(HashEmbedder)).await;

    let n = store.index_path(dir.path().join("contrats.csv")).await.unwrap();
    assert_eq!(n, 1);
    let hits = store.search("type: contrat, montant: 1000", Some(1)).await.unwrap();
    assert_eq!(hits[0].text, "type: contrat, montant: 1000");
    assert_eq!(hits[0].source, "contrats.csv");
}

#[tokio::test]
async fn failure_after_a_committed_batch_is_partial() {
    let dir = tempfile::tempdir().unwrap();
    let mut rows = String::from("id,clause\n");
    for i in 0..150 {
        rows.push_str(&format!("{i},clause numero {i}\n"));
    }
    write(dir.path(), "clauses.csv", &rows);

    let store = store_with(Arc::new(FlakyEmbedder {
        calls: AtomicUsize::new(0),
        ok_calls: 1,
    }))
    .await;

    let err = store.index_folder(dir.path(), false).await.unwrap_err();
    match err {
        RagError::PartialIndex {
            committed, total, ..
        } => {
            assert_eq!(committed, 100);
            assert_eq!(total, 150);
        }
        other => panic!("expected PartialIndex, got {other:?}"),
    }
    assert_eq!(store.count().await.unwrap(), 100);
}

#[tokio::test]
async fn failure_before_any_write_is_reported_as_is() {
    let dir = corpus();
    let store = store_with(Arc::new(FlakyEmbedder {
        calls: AtomicUsize::new(0),
        ok_calls: 0,
    }))
    .await;

    let err = store.index_folder(dir.path(), false).await.unwrap_err();
    assert!(err.is_connection());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn embedder_dimension_must_match_the_config() {
    let backend: Arc<dyn VectorBackend> = Arc::new(MemoryBackend::new());
    let res = RagStore::connect(
        RagConfig::in_memory("legal_documents", DIM + 1),
        Arc::new(HashEmbedder),
        backend,
    )
    .await;
    assert!(matches!(res, Err(RagError::Config(_))));
}
