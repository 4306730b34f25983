//! Embedding model configs loaded from environment variables.
//!
//! # Environment variables
//!
//! Common:
//! - `EMBEDDING_PROVIDER`      = `openai` (default) or `ollama`
//! - `EMBEDDING_TIMEOUT_SECS`  = optional request timeout (u64, default 60)
//! - `EMBEDDING_DIM`           = optional requested output size (u32)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY`          = bearer token (mandatory)
//! - `OPENAI_BASE_URL`         = endpoint (default `https://api.openai.com`)
//! - `OPENAI_EMBEDDING_MODEL`  = model (default `text-embedding-3-small`)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)

use tracing::info;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt, env_opt_u32, env_opt_u64, must_env,
        validate_http_endpoint,
    },
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Builds the embedding config for the provider selected by `EMBEDDING_PROVIDER`.
///
/// # Errors
/// Any [`ConfigError`] raised by the provider-specific loader; a missing
/// `OPENAI_API_KEY` is fatal for the OpenAI provider.
pub fn config_embedding_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let provider = match env_opt("EMBEDDING_PROVIDER") {
        Some(raw) => raw.parse::<LlmProvider>()?,
        None => LlmProvider::OpenAI,
    };

    let cfg = match provider {
        LlmProvider::OpenAI => config_openai_embedding()?,
        LlmProvider::Ollama => config_ollama_embedding()?,
    };
    cfg.validate()?;

    info!(
        provider = ?cfg.provider,
        model = %cfg.model,
        endpoint = %cfg.endpoint,
        "embedding config loaded"
    );
    Ok(cfg)
}

/// Constructs a config for the OpenAI embeddings endpoint.
///
/// # Env
/// - `OPENAI_API_KEY` (required)
/// - `OPENAI_BASE_URL`, `OPENAI_EMBEDDING_MODEL`, `EMBEDDING_TIMEOUT_SECS`, `EMBEDDING_DIM` (optional)
pub fn config_openai_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("OPENAI_API_KEY")?;
    let endpoint = env_opt("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into());
    validate_http_endpoint("OPENAI_BASE_URL", &endpoint)?;
    let model = env_opt("OPENAI_EMBEDDING_MODEL")
        .unwrap_or_else(|| DEFAULT_OPENAI_EMBEDDING_MODEL.into());

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model,
        endpoint,
        api_key: Some(api_key),
        dimensions: env_opt_u32("EMBEDDING_DIM")?,
        timeout_secs: Some(env_opt_u64("EMBEDDING_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

/// Constructs a config for the **embedding** Ollama model.
///
/// # Env
/// - `OLLAMA_URL` or `OLLAMA_PORT` (required)
/// - `EMBEDDING_MODEL` (required)
pub fn config_ollama_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint()?;
    validate_http_endpoint("OLLAMA_URL", &endpoint)?;
    let model = must_env("EMBEDDING_MODEL")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        // Ollama derives the size from the model itself.
        dimensions: None,
        timeout_secs: Some(env_opt_u64("EMBEDDING_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = env_opt("OLLAMA_URL") {
        return Ok(url);
    }
    if let Some(port) = env_opt("OLLAMA_PORT") {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}
