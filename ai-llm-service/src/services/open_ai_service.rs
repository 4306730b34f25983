//! OpenAI embeddings client.
//!
//! Minimal client around `POST {endpoint}/v1/embeddings` with an array
//! `input`, so one request covers a whole batch.
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    MAX_EMBEDDING_INPUTS,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
};

/// Thin client for the OpenAI embeddings API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`ProviderErrorKind::InvalidProvider`] if `cfg.provider` is not OpenAI
    /// - [`ProviderErrorKind::MissingApiKey`] if `cfg.api_key` is `None`
    /// - [`ProviderErrorKind::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::OpenAI {
            return Err(
                ProviderError::new(Provider::OpenAI, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey)
        })?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_embeddings = format!("{}/v1/embeddings", cfg.base_url());

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_embeddings,
        })
    }

    /// Embeds a batch of inputs with one `/v1/embeddings` request.
    ///
    /// The returned vectors are in input order (the response is re-sorted by
    /// its `index` field).
    ///
    /// # Errors
    /// - [`ProviderErrorKind::BatchTooLarge`] for more than [`MAX_EMBEDDING_INPUTS`] inputs
    /// - [`ProviderErrorKind::HttpStatus`] for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`ProviderErrorKind::Decode`] / [`ProviderErrorKind::CountMismatch`] for malformed payloads
    pub async fn embeddings_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        if inputs.len() > MAX_EMBEDDING_INPUTS {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::BatchTooLarge {
                    len: inputs.len(),
                    max: MAX_EMBEDDING_INPUTS,
                },
            )
            .into());
        }

        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input: inputs,
            dimensions: self.cfg.dimensions,
        };

        debug!(
            model = %self.cfg.model,
            batch = inputs.len(),
            "POST {}", self.url_embeddings
        );

        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embeddings.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "OpenAI /v1/embeddings returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: EmbeddingsResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode /v1/embeddings response"
                );
                return Err(ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `data[].embedding`"
                    )),
                )
                .into());
            }
        };

        let vectors = out.into_ordered(inputs.len())?;

        info!(
            model = %self.cfg.model,
            batch = inputs.len(),
            latency_ms = started.elapsed().as_millis(),
            "embeddings completed"
        );

        Ok(vectors)
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Request body for `/v1/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

/// Response body for `/v1/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl EmbeddingsResponse {
    /// Restores input order and checks that every input got exactly one vector.
    fn into_ordered(self, expected: usize) -> Result<Vec<Vec<f32>>, ProviderError> {
        let received = self.data.len();
        if received != expected {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::CountMismatch {
                    sent: expected,
                    received,
                },
            ));
        }

        let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
        for (pos, item) in self.data.into_iter().enumerate() {
            let idx = item.index.unwrap_or(pos);
            match slots.get_mut(idx) {
                Some(slot @ None) => *slot = Some(item.embedding),
                _ => {
                    return Err(ProviderError::new(
                        Provider::OpenAI,
                        ProviderErrorKind::Decode(format!(
                            "duplicate or out-of-range embedding index {idx}"
                        )),
                    ));
                }
            }
        }
        Ok(slots.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_is_reordered_by_index() {
        let raw = r#"{"object":"list","data":[
            {"object":"embedding","index":1,"embedding":[2.0,2.0]},
            {"object":"embedding","index":0,"embedding":[1.0,1.0]}
        ],"model":"text-embedding-3-small"}"#;
        let resp: EmbeddingsResponse = serde_json::from_str(raw).unwrap();
        let v = resp.into_ordered(2).unwrap();
        assert_eq!(v, vec![vec![1.0, 1.0], vec![2.0, 2.0]]);
    }

    #[test]
    fn missing_vectors_are_reported() {
        let raw = r#"{"data":[{"index":0,"embedding":[1.0]}]}"#;
        let resp: EmbeddingsResponse = serde_json::from_str(raw).unwrap();
        let err = resp.into_ordered(2).unwrap_err();
        assert!(matches!(
            err.kind,
            ProviderErrorKind::CountMismatch {
                sent: 2,
                received: 1
            }
        ));
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let raw = r#"{"data":[{"index":0,"embedding":[1.0]},{"index":0,"embedding":[2.0]}]}"#;
        let resp: EmbeddingsResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            resp.into_ordered(2).unwrap_err().kind,
            ProviderErrorKind::Decode(_)
        ));
    }

    #[test]
    fn request_serializes_array_input() {
        let inputs = vec!["a".to_string(), "b".to_string()];
        let body = EmbeddingsRequest {
            model: "text-embedding-3-small",
            input: &inputs,
            dimensions: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["input"], serde_json::json!(["a", "b"]));
        assert!(json.get("dimensions").is_none());
    }

    #[test]
    fn constructor_rejects_other_provider() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "nomic-embed-text".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            dimensions: None,
            timeout_secs: None,
        };
        assert!(OpenAiService::new(cfg).is_err());
    }
}
