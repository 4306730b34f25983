//! Provider-agnostic embedding service.
//!
//! - Construct once from an [`LlmModelConfig`], wrap in `Arc`, share.
//! - Dispatches to the OpenAI or Ollama client chosen at construction.
//! - Exposes [`EmbeddingService::health`] for the service `/health` route.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::EmbeddingService;
//! use ai_llm_service::config::default_config::config_embedding_from_env;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(EmbeddingService::new(config_embedding_from_env()?, Some(5))?);
//! let vectors = svc.embed_batch(&["contrat de bail".to_string()]).await?;
//! println!("dim = {}", vectors[0].len());
//! # Ok(()) }
//! ```

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

enum Backend {
    OpenAi(OpenAiService),
    Ollama(OllamaService),
}

/// Embedding client bound to one model configuration.
pub struct EmbeddingService {
    cfg: LlmModelConfig,
    backend: Backend,
    health: HealthService,
}

impl EmbeddingService {
    /// Validates the config and builds the provider client.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] on invalid config or if an HTTP client cannot be built.
    pub fn new(cfg: LlmModelConfig, health_timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        cfg.validate()?;
        let backend = match cfg.provider {
            LlmProvider::OpenAI => Backend::OpenAi(OpenAiService::new(cfg.clone())?),
            LlmProvider::Ollama => Backend::Ollama(OllamaService::new(cfg.clone())?),
        };
        Ok(Self {
            cfg,
            backend,
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Embeds up to [`crate::MAX_EMBEDDING_INPUTS`] texts, preserving order.
    ///
    /// No retry is attempted; callers decide how to react to failures.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        match &self.backend {
            Backend::OpenAi(cli) => cli.embeddings_batch(inputs).await,
            Backend::Ollama(cli) => cli.embeddings_batch(inputs).await,
        }
    }

    /// Probes the configured backend; never fails.
    pub async fn health(&self) -> HealthStatus {
        self.health.check(&self.cfg).await
    }

    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }
}
