//! Deterministic Local Embedder
//!
//! Derives a vector from the SHA-256 digest of the lower-cased text. Pure,
//! reproducible and offline. It carries no semantic meaning: two texts that
//! mean the same thing get unrelated vectors.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{MacroError, Result};
use crate::provider::{DEFAULT_DIMENSION, Embedding, EmbeddingProvider, ProviderInfo};

/// Hash-based embedding provider
#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dimension: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl HashEmbedder {
    /// Create with a custom dimension
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(MacroError::configuration("embedding dimension must be positive"));
        }
        Ok(Self { dimension })
    }

    /// Synchronous embedding; the trait method delegates here
    pub fn embed_sync(&self, text: &str) -> Embedding {
        let digest = Sha256::digest(text.to_lowercase().as_bytes());

        // Tile the 32-byte digest until it covers the dimension, then truncate
        let values: Vec<f32> = digest
            .iter()
            .cycle()
            .take(self.dimension)
            .map(|b| f32::from(*b))
            .collect();

        Embedding::new(values).normalized()
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "LocalHash".into(),
            model: Some("sha256".into()),
            dimension: self.dimension,
            deterministic: true,
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        tracing::trace!("Hash-embedding {} chars into {} dims", text.len(), self.dimension);
        Ok(self.embed_sync(text))
    }
}
