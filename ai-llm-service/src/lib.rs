//! Embedding backends for the document search service.
//!
//! - [`config`]: model configuration and env-driven defaults
//! - [`services`]: thin HTTP clients per provider (OpenAI, Ollama)
//! - [`embedding_service`]: provider-agnostic façade used by the store
//! - [`health_service`]: lightweight reachability probes for `/health`

pub mod config;
pub mod embedding_service;
pub mod error_handler;
pub mod health_service;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use embedding_service::EmbeddingService;
pub use error_handler::AiLlmError;
pub use health_service::{HealthService, HealthStatus};

/// Upper bound on the number of inputs sent in a single embeddings request.
pub const MAX_EMBEDDING_INPUTS: usize = 100;
