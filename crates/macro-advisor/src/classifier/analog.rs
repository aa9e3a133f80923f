//! Analog-Weighted Classification
//!
//! Finds the K historical analogs closest to the headline and blends their
//! labels, weighting each by its (non-negative) similarity. With K = 1 this
//! is plain nearest-neighbour matching.

use std::sync::Arc;

use macro_core::{Embedding, EmbeddingProvider, MacroError, Result};

use super::argmax_stable;
use crate::analogs::{AnalogLibrary, HistoricalAnalog};
use crate::model::{Archetype, Axis, AxisScores, ClassificationResult};
use crate::registry::ArchetypeRegistry;

struct IndexedAnalog {
    analog: HistoricalAnalog,
    archetype: Arc<Archetype>,
    position: usize,
    embedding: Embedding,
}

/// Analog headlines embedded once, read-only afterwards
pub struct AnalogIndex {
    entries: Vec<IndexedAnalog>,
    archetype_count: usize,
}

impl AnalogIndex {
    pub async fn build(
        library: &AnalogLibrary,
        registry: &ArchetypeRegistry,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        let headlines: Vec<&str> = library.iter().map(|a| a.headline.as_str()).collect();
        let embeddings = provider.embed_batch(&headlines).await?;

        if embeddings.len() != library.len() {
            return Err(MacroError::retrieval(format!(
                "provider returned {} embeddings for {} analogs",
                embeddings.len(),
                library.len()
            )));
        }

        let dimension = provider.dimension();
        let mut entries = Vec::with_capacity(library.len());
        for (analog, embedding) in library.iter().zip(embeddings) {
            embedding.ensure_dimension(dimension)?;
            let position = registry.position(&analog.archetype).ok_or_else(|| {
                MacroError::configuration(format!("unknown archetype '{}'", analog.archetype))
            })?;
            entries.push(IndexedAnalog {
                analog: analog.clone(),
                archetype: registry.get(&analog.archetype)?,
                position,
                embedding,
            });
        }

        tracing::info!("Analog index built: {} analogs via {}", entries.len(), provider.info().name);

        Ok(Self {
            entries,
            archetype_count: registry.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Top-K analog blending classifier
pub struct AnalogClassifier {
    index: AnalogIndex,
    top_k: usize,
    tie_epsilon: f64,
}

impl AnalogClassifier {
    pub fn new(index: AnalogIndex, top_k: usize, tie_epsilon: f64) -> Result<Self> {
        if top_k == 0 {
            return Err(MacroError::configuration("top-k must be at least 1"));
        }
        Ok(Self {
            index,
            top_k,
            tie_epsilon,
        })
    }

    pub async fn build(
        library: &AnalogLibrary,
        registry: &ArchetypeRegistry,
        provider: &dyn EmbeddingProvider,
        top_k: usize,
        tie_epsilon: f64,
    ) -> Result<Self> {
        Self::new(AnalogIndex::build(library, registry, provider).await?, top_k, tie_epsilon)
    }

    pub async fn classify(&self, text: &str, provider: &dyn EmbeddingProvider) -> Result<ClassificationResult> {
        let query = provider.embed(text).await?;
        self.classify_embedding(&query, provider)
    }

    pub fn classify_embedding(
        &self,
        query: &Embedding,
        provider: &dyn EmbeddingProvider,
    ) -> Result<ClassificationResult> {
        let mut ranked: Vec<(usize, f64)> = self
            .index
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, provider.similarity(query, &e.embedding)))
            .collect();
        // Descending similarity; library order breaks ties
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(self.top_k);

        if ranked.is_empty() {
            return Err(MacroError::configuration("analog index is empty"));
        }

        let mut weights: Vec<f64> = ranked.iter().map(|(_, s)| s.max(0.0)).collect();
        let mut total: f64 = weights.iter().sum();
        if total <= 0.0 {
            // Every neighbour is orthogonal or opposite: fall back to a plain mean
            weights.iter_mut().for_each(|w| *w = 1.0);
            #[allow(clippy::cast_precision_loss)]
            let count = weights.len() as f64;
            total = count;
        }

        let mut votes = vec![0.0; self.index.archetype_count];
        let mut severity = 0.0;
        let mut axes = AxisScores::default();

        for ((idx, similarity), weight) in ranked.iter().zip(&weights) {
            let entry = &self.index.entries[*idx];
            let share = weight / total;

            votes[entry.position] += share;
            severity += share * entry.analog.severity;
            for axis in Axis::ALL {
                axes.set(axis, axes.get(axis) + share * entry.analog.axis_scores.get(axis));
            }

            tracing::trace!(
                "Analog '{}' ({}) similarity {:.3} share {:.3}",
                entry.analog.headline,
                entry.archetype.name,
                similarity,
                share
            );
        }

        let (winner, _) = argmax_stable(votes, self.tie_epsilon).unwrap_or((0, 0.0));
        let archetype = self
            .index
            .entries
            .iter()
            .find(|e| e.position == winner)
            .map(|e| e.archetype.clone())
            .ok_or_else(|| MacroError::configuration("analog vote produced no archetype"))?;

        Ok(ClassificationResult {
            archetype,
            raw_score: severity.clamp(0.0, 1.0),
            axis_scores: Some(axes),
        })
    }
}
