//! Embedding Provider Strategy Pattern
//!
//! Defines a common interface for every way of turning text into a vector
//! (deterministic local hashing, remote embedding services) so that the
//! classifiers work with any backend without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use macro_core::provider::EmbeddingProvider;
//!
//! let provider = HashEmbedder::default();
//! let a = provider.embed("central bank raises rates").await?;
//! let b = provider.embed("interest rates tightening").await?;
//! let score = provider.similarity(&a, &b);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{MacroError, Result};

/// Reference embedding dimension
pub const DEFAULT_DIMENSION: usize = 384;

/// A fixed-dimension text embedding
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub const fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.0
            .iter()
            .map(|v| f64::from(*v) * f64::from(*v))
            .sum::<f64>()
            .sqrt()
    }

    /// Scale to unit length. A zero vector is returned unchanged.
    #[must_use]
    pub fn normalized(self) -> Self {
        let norm = self.norm();
        if norm == 0.0 {
            return self;
        }
        #[allow(clippy::cast_possible_truncation)]
        let values = self.0.iter().map(|v| (f64::from(*v) / norm) as f32).collect();
        Self(values)
    }

    /// Check the vector has the expected dimension
    pub fn ensure_dimension(&self, expected: usize) -> Result<()> {
        if self.dimension() == expected {
            Ok(())
        } else {
            Err(MacroError::configuration(format!(
                "embedding has dimension {} but {} was expected",
                self.dimension(),
                expected
            )))
        }
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Cosine similarity in [-1, 1].
///
/// Mismatched dimensions and zero vectors score 0.0.
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f64 {
    if a.dimension() != b.dimension() {
        return 0.0;
    }

    let dot: f64 = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let denom = a.norm() * b.norm();

    if denom == 0.0 {
        return 0.0;
    }

    (dot / denom).clamp(-1.0, 1.0)
}

/// Provider metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "LocalHash", "Ollama")
    pub name: String,

    /// Model identifier, if the provider has one
    pub model: Option<String>,

    /// Fixed output dimension
    pub dimension: usize,

    /// Whether embeddings are reproducible across calls
    pub deterministic: bool,
}

/// Strategy trait for embedding providers
///
/// The classifiers work exclusively through this interface.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get provider information and capabilities
    fn info(&self) -> ProviderInfo;

    /// Fixed output dimension
    fn dimension(&self) -> usize {
        self.info().dimension
    }

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Embed several texts; fails as a whole if any single text fails
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Similarity between two embeddings produced by this provider
    fn similarity(&self, a: &Embedding, b: &Embedding) -> f64 {
        cosine_similarity(a, b)
    }
}
