use std::path::PathBuf;
use std::sync::Arc;

use ai_llm_service::{EmbeddingService, config::default_config::config_embedding_from_env};
use anyhow::Context;
use api::AppState;
use rag_store::{LlmEmbedder, RagConfig, RagStore, open_backend};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Timeout for the `/health` embedding probe.
const HEALTH_TIMEOUT_SECS: u64 = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file when present.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,rag_store=info,ai_llm_service=info"))
        .context("invalid log filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();

    let embedding_cfg = config_embedding_from_env().context("embedding configuration")?;
    let rag_cfg = RagConfig::from_env().context("vector store configuration")?;
    info!(
        provider = ?embedding_cfg.provider,
        model = %embedding_cfg.model,
        backend = ?rag_cfg.backend,
        collection = %rag_cfg.collection,
        "starting document search backend"
    );

    let embedding = Arc::new(
        EmbeddingService::new(embedding_cfg, Some(HEALTH_TIMEOUT_SECS))
            .context("embedding service")?,
    );
    let embedder = Arc::new(LlmEmbedder::new(embedding.clone(), rag_cfg.embedding_dim));
    let backend = open_backend(&rag_cfg).context("vector backend")?;
    let store = Arc::new(
        RagStore::connect(rag_cfg, embedder, backend)
            .await
            .context("connecting to the vector store")?,
    );

    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".into()));
    if data_dir.is_dir() {
        let stats = store
            .index_folder(&data_dir, false)
            .await
            .context("initial indexing")?;
        info!(
            chunks = stats.chunks_indexed,
            total = stats.total_records,
            skipped_existing = stats.skipped_existing,
            "initial indexing done"
        );
    } else {
        warn!(dir = %data_dir.display(), "data folder not found; starting with the current collection");
    }

    let addr = std::env::var("API_ADDRESS").unwrap_or_else(|_| "127.0.0.1:5000".into());
    let state = AppState::new(store, data_dir).with_embedding(embedding);
    api::start(state, &addr).await?;

    Ok(())
}
