//! Similarity Classification
//!
//! Embeds the headline and picks the archetype whose anchor is closest.

use std::sync::Arc;

use macro_core::{Embedding, EmbeddingProvider, Result};

use super::argmax_stable;
use crate::model::{Anchor, Archetype, ClassificationResult};
use crate::registry::ArchetypeRegistry;

/// Archetype anchors embedded once, in canonical order
#[derive(Clone, Debug)]
pub struct AnchorIndex {
    entries: Vec<(Arc<Archetype>, Embedding)>,
}

impl AnchorIndex {
    pub async fn build(registry: &ArchetypeRegistry, provider: &dyn EmbeddingProvider) -> Result<Self> {
        let dimension = provider.dimension();

        // Keyword anchors go through the provider in a single batch
        let texts: Vec<String> = registry
            .iter()
            .filter_map(|a| match &a.anchor {
                Anchor::Keywords(words) => Some(words.join(" ")),
                Anchor::Vector(_) => None,
            })
            .collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let mut embedded = provider.embed_batch(&text_refs).await?.into_iter();

        let mut entries = Vec::with_capacity(registry.len());
        for archetype in registry.iter() {
            let vector = match &archetype.anchor {
                Anchor::Vector(v) => v.clone(),
                Anchor::Keywords(_) => embedded.next().ok_or_else(|| {
                    macro_core::MacroError::retrieval("provider returned too few anchor embeddings")
                })?,
            };
            vector.ensure_dimension(dimension)?;
            entries.push((archetype.clone(), vector));
        }

        tracing::info!(
            "Anchor index built: {} archetypes via {}",
            entries.len(),
            provider.info().name
        );

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Similarity of `query` to every anchor, in canonical order
    pub fn scores(&self, query: &Embedding, provider: &dyn EmbeddingProvider) -> Vec<f64> {
        self.entries
            .iter()
            .map(|(_, anchor)| provider.similarity(query, anchor))
            .collect()
    }
}

/// Nearest-anchor classifier
pub struct SimilarityClassifier {
    index: AnchorIndex,
    tie_epsilon: f64,
}

impl SimilarityClassifier {
    pub const fn new(index: AnchorIndex, tie_epsilon: f64) -> Self {
        Self { index, tie_epsilon }
    }

    pub async fn build(
        registry: &ArchetypeRegistry,
        provider: &dyn EmbeddingProvider,
        tie_epsilon: f64,
    ) -> Result<Self> {
        Ok(Self::new(AnchorIndex::build(registry, provider).await?, tie_epsilon))
    }

    pub async fn classify(&self, text: &str, provider: &dyn EmbeddingProvider) -> Result<ClassificationResult> {
        let query = provider.embed(text).await?;
        Ok(self.classify_embedding(&query, provider))
    }

    /// Classify an already-embedded headline
    pub fn classify_embedding(&self, query: &Embedding, provider: &dyn EmbeddingProvider) -> ClassificationResult {
        let scores = self.index.scores(query, provider);
        // The registry guarantees at least the noise archetype
        let (idx, similarity) = argmax_stable(scores, self.tie_epsilon).unwrap_or((0, 0.0));

        ClassificationResult {
            archetype: self.index.entries[idx].0.clone(),
            raw_score: similarity.clamp(0.0, 1.0),
            axis_scores: None,
        }
    }
}
