//! Ollama Embedding Provider
//!
//! Implementation of `EmbeddingProvider` backed by the Ollama `/api/embed`
//! endpoint. Every request is bounded by the client timeout; failures are
//! reported as retrieval errors, never replaced by a default vector.

use std::time::Duration;

use async_trait::async_trait;
use macro_core::{
    error::{MacroError, Result},
    provider::{DEFAULT_DIMENSION, Embedding, EmbeddingProvider, ProviderInfo},
};
use serde::{Deserialize, Serialize};

/// Upper bound on configured retries
pub const MAX_RETRIES: u32 = 5;

const BACKOFF_BASE_MS: u64 = 200;

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Embedding model name
    pub model: String,

    /// Expected embedding dimension
    pub dimension: usize,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Extra attempts after a failed request (0 = fail immediately)
    pub max_retries: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            model: "all-minilm".into(),
            dimension: DEFAULT_DIMENSION,
            timeout_secs: 10,
            max_retries: 0,
        }
    }
}

impl OllamaConfig {
    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Map a non-success status: 4xx is a setup problem, 5xx may be transient
fn status_error(status: reqwest::StatusCode, model: &str) -> MacroError {
    if status.is_client_error() {
        MacroError::configuration(format!("Ollama rejected model {model}: HTTP {status}"))
    } else {
        MacroError::retrieval(format!("Ollama returned HTTP {status}"))
    }
}

/// Ollama embedding provider
pub struct OllamaEmbedder {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaEmbedder {
    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Result<Self> {
        if config.dimension == 0 {
            return Err(MacroError::configuration("embedding dimension must be positive"));
        }
        if config.timeout_secs == 0 {
            return Err(MacroError::configuration("embedding timeout must be positive"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MacroError::configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: OllamaConfig {
                max_retries: config.max_retries.min(MAX_RETRIES),
                ..config
            },
        })
    }

    /// Create with default localhost settings
    pub fn localhost() -> Result<Self> {
        Self::from_config(OllamaConfig::default())
    }

    pub const fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn map_transport(&self, err: &reqwest::Error) -> MacroError {
        if err.is_timeout() {
            MacroError::RetrievalTimeout {
                after_ms: self.config.timeout_secs * 1000,
            }
        } else {
            MacroError::retrieval(err.to_string())
        }
    }

    /// One HTTP round trip, no retries
    async fn request(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let url = format!("{}/api/embed", self.config.base_url());
        let body = EmbedRequest {
            model: &self.config.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, &self.config.model));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| self.map_transport(&e))?;

        self.check_response(parsed, texts.len())
    }

    fn check_response(&self, parsed: EmbedResponse, expected: usize) -> Result<Vec<Embedding>> {
        if parsed.embeddings.len() != expected {
            return Err(MacroError::retrieval(format!(
                "expected {expected} embeddings, got {}",
                parsed.embeddings.len()
            )));
        }

        parsed
            .embeddings
            .into_iter()
            .map(|values| {
                if values.len() == self.config.dimension {
                    Ok(Embedding::new(values))
                } else {
                    Err(MacroError::retrieval(format!(
                        "model {} returned dimension {}, configured {}",
                        self.config.model,
                        values.len(),
                        self.config.dimension
                    )))
                }
            })
            .collect()
    }

    /// Request with bounded retries and exponential backoff
    async fn request_with_retries(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut attempt = 0;
        loop {
            match self.request(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = BACKOFF_BASE_MS << attempt;
                    tracing::warn!(
                        "Embedding request failed (attempt {}): {}; retrying in {}ms",
                        attempt + 1,
                        e,
                        backoff
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Ollama".into(),
            model: Some(self.config.model.clone()),
            dimension: self.config.dimension,
            deterministic: false,
        }
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.request_with_retries(&[text])
            .await?
            .pop()
            .ok_or_else(|| MacroError::retrieval("empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request_with_retries(texts).await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url());
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder(dimension: usize) -> OllamaEmbedder {
        OllamaEmbedder::from_config(OllamaConfig {
            dimension,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.host, "http://localhost");
        assert_eq!(config.port, 11434);
        assert_eq!(config.dimension, 384);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_retries_are_capped() {
        let e = OllamaEmbedder::from_config(OllamaConfig {
            max_retries: 50,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(e.config().max_retries, MAX_RETRIES);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = OllamaEmbedder::from_config(OllamaConfig {
            timeout_secs: 0,
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_response_dimension_checked() {
        let e = embedder(3);
        let ok = EmbedResponse {
            embeddings: vec![vec![0.1, 0.2, 0.3]],
        };
        assert_eq!(e.check_response(ok, 1).unwrap()[0].dimension(), 3);

        let wrong_dim = EmbedResponse {
            embeddings: vec![vec![0.1, 0.2]],
        };
        assert!(e.check_response(wrong_dim, 1).is_err());

        let wrong_count = EmbedResponse {
            embeddings: vec![],
        };
        assert!(e.check_response(wrong_count, 1).is_err());
    }

    #[test]
    fn test_response_parses_from_json() {
        let parsed: EmbedResponse =
            serde_json::from_str(r#"{"model":"all-minilm","embeddings":[[0.5,0.5]]}"#).unwrap();
        assert_eq!(parsed.embeddings.len(), 1);
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        for status in [reqwest::StatusCode::NOT_FOUND, reqwest::StatusCode::BAD_REQUEST] {
            let err = status_error(status, "all-minilm");
            assert_eq!(err.kind(), macro_core::ErrorKind::Configuration);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_server_errors_are_retried() {
        for status in [
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = status_error(status, "all-minilm");
            assert_eq!(err.kind(), macro_core::ErrorKind::Retrieval);
            assert!(err.is_retryable());
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_retrieval_error() {
        let e = OllamaEmbedder::from_config(OllamaConfig {
            host: "http://127.0.0.1".into(),
            port: 9,
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();

        let err = e.embed("rates rise").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
