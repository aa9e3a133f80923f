//! Embedding Provider Selection
//!
//! Chooses the deterministic local embedder or a remote provider from
//! environment variables. Unknown values are configuration errors.

use std::sync::Arc;

use macro_core::{
    EmbeddingProvider, HashEmbedder,
    error::{MacroError, Result},
    provider::DEFAULT_DIMENSION,
};

#[cfg(feature = "ollama")]
use crate::ollama::{OllamaConfig, OllamaEmbedder};

/// Which embedding strategy to run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmbedderKind {
    /// SHA-256 derived vectors, offline
    Local,

    /// Ollama embedding endpoint
    #[cfg(feature = "ollama")]
    Ollama,
}

impl std::str::FromStr for EmbedderKind {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "hash" => Ok(Self::Local),
            #[cfg(feature = "ollama")]
            "ollama" => Ok(Self::Ollama),
            other => Err(MacroError::configuration(format!("unknown embedder '{other}'"))),
        }
    }
}

/// Embedding configuration
#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    pub kind: EmbedderKind,
    pub dimension: usize,
    #[cfg(feature = "ollama")]
    pub ollama: OllamaConfig,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::Local,
            dimension: DEFAULT_DIMENSION,
            #[cfg(feature = "ollama")]
            ollama: OllamaConfig::default(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>> {
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| MacroError::configuration(format!("invalid value '{raw}' for {name}")))
        })
        .transpose()
}

impl EmbeddingConfig {
    /// Read `MACRO_EMBEDDER`, `MACRO_EMBED_DIM` and the Ollama settings
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let kind = match lookup("MACRO_EMBEDDER") {
            Some(raw) => raw.parse()?,
            None => defaults.kind,
        };
        let dimension = parse_var(&lookup, "MACRO_EMBED_DIM")?.unwrap_or(defaults.dimension);

        #[cfg(feature = "ollama")]
        let ollama = {
            let base = defaults.ollama;
            OllamaConfig {
                host: lookup("OLLAMA_HOST").unwrap_or(base.host),
                port: parse_var(&lookup, "OLLAMA_PORT")?.unwrap_or(base.port),
                model: lookup("MACRO_EMBED_MODEL").unwrap_or(base.model),
                dimension,
                timeout_secs: parse_var(&lookup, "MACRO_EMBED_TIMEOUT_SECS")?.unwrap_or(base.timeout_secs),
                max_retries: parse_var(&lookup, "MACRO_EMBED_RETRIES")?.unwrap_or(base.max_retries),
            }
        };

        Ok(Self {
            kind,
            dimension,
            #[cfg(feature = "ollama")]
            ollama,
        })
    }

    /// Instantiate the configured provider
    pub fn build(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        match self.kind {
            EmbedderKind::Local => Ok(Arc::new(HashEmbedder::new(self.dimension)?)),
            #[cfg(feature = "ollama")]
            EmbedderKind::Ollama => Ok(Arc::new(OllamaEmbedder::from_config(OllamaConfig {
                dimension: self.dimension,
                ..self.ollama.clone()
            })?)),
        }
    }
}
