//! Severity Scorer
//!
//! Turns a classification into a severity index in [0, 1]. Three formula
//! families exist; all land on the same scale so the policy and the
//! rebalancing engine never need to know which one ran.

use std::str::FromStr;

use macro_core::{MacroError, Result};
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierKind;
use crate::model::{Axis, AxisScores, ClassificationResult, RiskProfile, Severity};

/// Convex weights of the axis formula, summing to 1
pub const AXIS_WEIGHTS: [(Axis, f64); 4] = [
    (Axis::Geopolitical, 0.35),
    (Axis::EconomicScale, 0.30),
    (Axis::CrossBorder, 0.20),
    (Axis::Transmission, 0.15),
];

/// Scale applied to the risk-profile combination before capping
pub const RISK_PROFILE_MULTIPLIER: f64 = 1.2;

/// Upper bound of the risk-profile formula
pub const RISK_PROFILE_CAP: f64 = 1.0;

/// Weighted combination of normalized axis scores
pub fn axis_weighted(scores: &AxisScores) -> f64 {
    AXIS_WEIGHTS
        .iter()
        .map(|(axis, weight)| weight * scores.normalized(*axis))
        .sum()
}

/// `0.5 * volatility + 0.3 * drawdown + 0.2 * contagion`, scaled and capped
pub fn risk_profile(profile: &RiskProfile) -> f64 {
    let combined = 0.5 * profile.volatility + 0.3 * profile.drawdown + 0.2 * profile.contagion;
    (combined * RISK_PROFILE_MULTIPLIER).min(RISK_PROFILE_CAP)
}

/// Where severity comes from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeveritySource {
    /// Follow the classifier: raw score for similarity/analogs, axes for rules
    #[default]
    Auto,

    /// Ignore the text beyond classification; use the archetype's risk profile
    RiskProfile,
}

impl FromStr for SeveritySource {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "risk_profile" | "risk-profile" | "profile" => Ok(Self::RiskProfile),
            other => Err(MacroError::configuration(format!("unknown severity source '{other}'"))),
        }
    }
}

/// Selected severity formula
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityFormula {
    /// `clamp(raw_score, 0, 1)`
    Direct,

    /// Convex combination of axis scores
    AxisWeighted,

    /// Archetype risk profile
    RiskProfile,
}

impl SeverityFormula {
    /// Pick the formula matching a classifier
    pub const fn select(kind: ClassifierKind, source: SeveritySource) -> Self {
        match (source, kind) {
            (SeveritySource::RiskProfile, _) => Self::RiskProfile,
            (SeveritySource::Auto, ClassifierKind::RuleBased) => Self::AxisWeighted,
            (SeveritySource::Auto, ClassifierKind::Similarity | ClassifierKind::AnalogWeighted) => {
                Self::Direct
            }
        }
    }

    pub fn score(self, result: &ClassificationResult) -> Result<Severity> {
        let value = match self {
            Self::Direct => result.raw_score,
            Self::AxisWeighted => {
                let axes = result.axis_scores.as_ref().ok_or_else(|| {
                    MacroError::configuration("axis-weighted severity needs axis scores")
                })?;
                axis_weighted(axes)
            }
            Self::RiskProfile => {
                let profile = result.archetype.risk_profile.as_ref().ok_or_else(|| {
                    MacroError::configuration(format!(
                        "archetype '{}' has no risk profile",
                        result.archetype.name
                    ))
                })?;
                risk_profile(profile)
            }
        };

        Ok(Severity::new(value))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::registry::{ArchetypeRegistry, FINANCIAL_CRISIS, LOCAL_NOISE};

    fn result(name: &str, raw_score: f64, axis_scores: Option<AxisScores>) -> ClassificationResult {
        let registry = ArchetypeRegistry::builtin().unwrap();
        ClassificationResult {
            archetype: registry.get(name).unwrap(),
            raw_score,
            axis_scores,
        }
    }

    #[test]
    fn test_weights_are_convex() {
        let total: f64 = AXIS_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis_formula_bounds() {
        assert!(axis_weighted(&AxisScores::default()).abs() < f64::EPSILON);
        assert!((axis_weighted(&AxisScores::new(3.0, 3.0, 3.0, 3.0)) - 1.0).abs() < 1e-12);

        // Geopolitical maximum alone contributes its weight
        let geo = axis_weighted(&AxisScores::new(3.0, 0.0, 0.0, 0.0));
        assert!((geo - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_risk_profile_formula() {
        let mild = RiskProfile {
            volatility: 0.3,
            drawdown: 0.2,
            contagion: 0.1,
        };
        // (0.15 + 0.06 + 0.02) * 1.2
        assert!((risk_profile(&mild) - 0.276).abs() < 1e-12);

        let extreme = RiskProfile {
            volatility: 0.9,
            drawdown: 0.9,
            contagion: 0.9,
        };
        assert!((risk_profile(&extreme) - RISK_PROFILE_CAP).abs() < f64::EPSILON);
    }

    #[test]
    fn test_direct_clamps_raw_score() {
        let r = result(FINANCIAL_CRISIS, 1.4, None);
        assert!((SeverityFormula::Direct.score(&r).unwrap().value() - 1.0).abs() < f64::EPSILON);

        let r = result(FINANCIAL_CRISIS, -0.3, None);
        assert!(SeverityFormula::Direct.score(&r).unwrap().value().abs() < f64::EPSILON);
    }

    #[test]
    fn test_axis_formula_requires_axes() {
        let r = result(FINANCIAL_CRISIS, 0.5, None);
        assert!(SeverityFormula::AxisWeighted.score(&r).is_err());
    }

    #[test]
    fn test_risk_profile_ignores_raw_score() {
        let a = result(FINANCIAL_CRISIS, 0.1, None);
        let b = result(FINANCIAL_CRISIS, 0.9, None);
        let formula = SeverityFormula::RiskProfile;
        assert_eq!(formula.score(&a).unwrap(), formula.score(&b).unwrap());

        let noise = result(LOCAL_NOISE, 0.9, None);
        assert!(formula.score(&noise).unwrap().value().abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_risk_profile_is_configuration_error() {
        let mut r = result(FINANCIAL_CRISIS, 0.5, None);
        let mut archetype = (*r.archetype).clone();
        archetype.risk_profile = None;
        r.archetype = Arc::new(archetype);
        assert!(SeverityFormula::RiskProfile.score(&r).is_err());
    }

    #[test]
    fn test_formula_selection() {
        use ClassifierKind::{AnalogWeighted, RuleBased, Similarity};

        assert_eq!(SeverityFormula::select(Similarity, SeveritySource::Auto), SeverityFormula::Direct);
        assert_eq!(SeverityFormula::select(AnalogWeighted, SeveritySource::Auto), SeverityFormula::Direct);
        assert_eq!(SeverityFormula::select(RuleBased, SeveritySource::Auto), SeverityFormula::AxisWeighted);
        assert_eq!(
            SeverityFormula::select(RuleBased, SeveritySource::RiskProfile),
            SeverityFormula::RiskProfile
        );
        assert!("bogus".parse::<SeveritySource>().is_err());
    }
}
