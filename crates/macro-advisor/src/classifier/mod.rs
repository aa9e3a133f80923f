//! Event Classifiers
//!
//! Three interchangeable strategies behind one tagged variant:
//!
//! - **Similarity**: nearest archetype anchor by cosine similarity
//! - **Rule-based**: keyword groups per axis, then a fixed decision tree
//! - **Analog-weighted**: similarity-weighted average of the top-K historical analogs
//!
//! Anchor and analog embeddings are computed once when the classifier is
//! built, never per request.

mod analog;
mod rules;
mod similarity;

pub use analog::{AnalogClassifier, AnalogIndex};
pub use rules::{KeywordRule, RULES, RuleClassifier};
pub use similarity::{AnchorIndex, SimilarityClassifier};

use std::str::FromStr;

use macro_core::{EmbeddingProvider, MacroError, Result};
use serde::{Deserialize, Serialize};

use crate::model::ClassificationResult;

/// Default margin under which two similarity scores count as tied
pub const DEFAULT_TIE_EPSILON: f64 = 1e-9;

/// Strategy selector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    Similarity,
    RuleBased,
    AnalogWeighted,
}

impl ClassifierKind {
    /// Whether classification calls the embedding provider
    pub const fn uses_embeddings(self) -> bool {
        !matches!(self, Self::RuleBased)
    }
}

impl FromStr for ClassifierKind {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "similarity" => Ok(Self::Similarity),
            "rules" | "rule_based" | "rule-based" => Ok(Self::RuleBased),
            "analogs" | "analog_weighted" | "analog-weighted" => Ok(Self::AnalogWeighted),
            other => Err(MacroError::configuration(format!("unknown classifier '{other}'"))),
        }
    }
}

/// A built classifier, ready to serve requests
pub enum EventClassifier {
    Similarity(SimilarityClassifier),
    RuleBased(RuleClassifier),
    AnalogWeighted(AnalogClassifier),
}

impl EventClassifier {
    pub const fn kind(&self) -> ClassifierKind {
        match self {
            Self::Similarity(_) => ClassifierKind::Similarity,
            Self::RuleBased(_) => ClassifierKind::RuleBased,
            Self::AnalogWeighted(_) => ClassifierKind::AnalogWeighted,
        }
    }

    /// Classify a headline. The provider is called at most once.
    pub async fn classify(
        &self,
        text: &str,
        provider: &dyn EmbeddingProvider,
    ) -> Result<ClassificationResult> {
        let result = match self {
            Self::Similarity(c) => c.classify(text, provider).await?,
            Self::RuleBased(c) => c.classify(text),
            Self::AnalogWeighted(c) => c.classify(text, provider).await?,
        };

        tracing::debug!(
            "Classified as '{}' (raw score {:.3}) by {:?}",
            result.archetype.name,
            result.raw_score,
            self.kind()
        );

        Ok(result)
    }
}

/// Index of the best score; candidates within `epsilon` of the current best
/// keep the earlier position.
pub(crate) fn argmax_stable(scores: impl IntoIterator<Item = f64>, epsilon: f64) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, score) in scores.into_iter().enumerate() {
        match best {
            Some((_, top)) if score <= top + epsilon => {}
            _ => best = Some((idx, score)),
        }
    }
    best
}
