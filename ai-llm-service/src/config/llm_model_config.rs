use crate::{
    config::llm_provider::LlmProvider,
    error_handler::{AiLlmError, ConfigError, ProviderError, ProviderErrorKind, Provider},
};

/// Configuration for an embedding model.
///
/// # Fields
///
/// - `provider`: which backend serves the model (Ollama, OpenAI).
/// - `model`: model identifier (e.g., `"text-embedding-3-small"`, `"nomic-embed-text"`).
/// - `endpoint`: base URL of the backend, without the API path.
/// - `api_key`: bearer token for providers that require authentication.
/// - `dimensions`: requested output size, forwarded to providers that support it.
/// - `timeout_secs`: per-request timeout in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub dimensions: Option<u32>,
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Checks the invariants every client relies on.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyModel`] for a blank model name
    /// - [`ConfigError::InvalidFormat`] when the endpoint lacks an http(s) scheme
    /// - [`ProviderErrorKind::MissingApiKey`] for OpenAI without a key
    pub fn validate(&self) -> Result<(), AiLlmError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidFormat {
                var: "endpoint",
                reason: "must start with http:// or https://",
            }
            .into());
        }
        if self.provider == LlmProvider::OpenAI
            && self.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
        {
            return Err(ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey).into());
        }
        Ok(())
    }

    /// Endpoint without trailing slashes, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn openai() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: "text-embedding-3-small".into(),
            endpoint: "https://api.openai.com/".into(),
            api_key: Some("sk-test".into()),
            dimensions: None,
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn valid_config_passes() {
        let cfg = openai();
        cfg.validate().unwrap();
        assert_eq!(cfg.base_url(), "https://api.openai.com");
    }

    #[test]
    fn openai_requires_key() {
        let cfg = LlmModelConfig {
            api_key: Some("  ".into()),
            ..openai()
        };
        assert!(matches!(cfg.validate(), Err(AiLlmError::Provider(_))));
    }

    #[test]
    fn ollama_needs_no_key_but_needs_scheme() {
        let mut cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            api_key: None,
            endpoint: "http://localhost:11434".into(),
            ..openai()
        };
        cfg.validate().unwrap();
        cfg.endpoint = "localhost:11434".into();
        assert!(matches!(cfg.validate(), Err(AiLlmError::Config(_))));
    }
}
