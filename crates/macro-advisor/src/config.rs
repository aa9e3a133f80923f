//! Analyzer Configuration
//!
//! Strategy selection and tuning knobs, read from the environment.
//! Unknown or malformed values are configuration errors.

use std::str::FromStr;

use macro_core::{MacroError, Result};
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierKind, DEFAULT_TIE_EPSILON};
use crate::model::WeightScale;
use crate::policy::TriggerMode;
use crate::rebalance::DEFAULT_AMPLIFICATION;
use crate::severity::SeveritySource;

/// Default number of analogs blended by the analog classifier
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Which classifier strategy runs
    pub classifier: ClassifierKind,

    /// Analogs blended per request (analog classifier only)
    pub top_k: usize,

    /// Severity formula override
    pub severity: SeveritySource,

    /// Decay before or after the threshold comparison
    pub trigger_mode: TriggerMode,

    /// Total the portfolio weights sum to
    pub weight_scale: WeightScale,

    /// Adjustment magnitude multiplier
    pub amplification: f64,

    /// Similarity margin treated as a tie
    pub tie_epsilon: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::default(),
            top_k: DEFAULT_TOP_K,
            severity: SeveritySource::default(),
            trigger_mode: TriggerMode::default(),
            weight_scale: WeightScale::default(),
            amplification: DEFAULT_AMPLIFICATION,
            tie_epsilon: DEFAULT_TIE_EPSILON,
        }
    }
}

fn parse<T>(name: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
{
    raw.map(|value| {
        value
            .trim()
            .parse()
            .map_err(|_| MacroError::configuration(format!("invalid value '{value}' for {name}")))
    })
    .transpose()
}

impl AnalyzerConfig {
    /// Read `MACRO_CLASSIFIER`, `MACRO_TOP_K`, `MACRO_SEVERITY`,
    /// `MACRO_TRIGGER`, `MACRO_WEIGHT_SCALE` and `MACRO_AMPLIFICATION`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env` with an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            classifier: parse("MACRO_CLASSIFIER", lookup("MACRO_CLASSIFIER"))?.unwrap_or(defaults.classifier),
            top_k: parse("MACRO_TOP_K", lookup("MACRO_TOP_K"))?.unwrap_or(defaults.top_k),
            severity: parse("MACRO_SEVERITY", lookup("MACRO_SEVERITY"))?.unwrap_or(defaults.severity),
            trigger_mode: parse("MACRO_TRIGGER", lookup("MACRO_TRIGGER"))?.unwrap_or(defaults.trigger_mode),
            weight_scale: parse("MACRO_WEIGHT_SCALE", lookup("MACRO_WEIGHT_SCALE"))?
                .unwrap_or(defaults.weight_scale),
            amplification: parse("MACRO_AMPLIFICATION", lookup("MACRO_AMPLIFICATION"))?
                .unwrap_or(defaults.amplification),
            tie_epsilon: defaults.tie_epsilon,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(MacroError::configuration("MACRO_TOP_K must be at least 1"));
        }
        if !self.amplification.is_finite() || self.amplification <= 0.0 {
            return Err(MacroError::configuration("MACRO_AMPLIFICATION must be positive"));
        }
        if !self.tie_epsilon.is_finite() || self.tie_epsilon < 0.0 {
            return Err(MacroError::configuration("tie epsilon must be non-negative"));
        }
        Ok(())
    }
}
