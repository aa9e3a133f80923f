//! # macro-runtime
//!
//! Embedding providers for the macro event analyzer.
//!
//! ## Providers
//!
//! - **Local** (default): deterministic SHA-256 embedder from `macro-core`
//! - **Ollama**: remote embeddings via the Ollama HTTP API, timeout-bounded
//!
//! ## Usage
//!
//! ```rust,ignore
//! use macro_runtime::EmbeddingConfig;
//!
//! let provider = EmbeddingConfig::from_env()?.build()?;
//! let vector = provider.embed("ECB signals rate cut").await?;
//! ```

pub mod config;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use config::{EmbedderKind, EmbeddingConfig};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaEmbedder};

// Re-export core types for convenience
pub use macro_core::{Embedding, EmbeddingProvider, HashEmbedder, MacroError, Result};
