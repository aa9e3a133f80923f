//! Horizon & Risk Policy
//!
//! Pure lookups from the investor's horizon and risk tolerance to the
//! numbers the trigger decision and the rebalancing engine consume.

use std::str::FromStr;

use macro_core::{MacroError, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Horizon, RiskTolerance, Severity};

/// Decay and trigger threshold for one horizon
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HorizonPolicy {
    /// Multiplier on severity, in (0, 1]
    pub decay_factor: f64,

    /// Minimum impact that triggers a rebalance, in [0, 1]
    pub trigger_threshold: f64,
}

/// Whether horizon decay applies before the threshold comparison
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// `severity * decay >= threshold`
    #[default]
    Decayed,

    /// `severity >= threshold`
    Raw,
}

impl FromStr for TriggerMode {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "decayed" | "decay" => Ok(Self::Decayed),
            "raw" => Ok(Self::Raw),
            other => Err(MacroError::configuration(format!("unknown trigger mode '{other}'"))),
        }
    }
}

/// Outcome of the trigger check
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerDecision {
    pub severity: Severity,
    pub decay_factor: f64,

    /// `severity * decay_factor`, reported in every mode
    pub effective_impact: f64,

    pub threshold: f64,
    pub triggered: bool,
}

/// Horizon and risk lookup tables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyTable {
    pub short: HorizonPolicy,
    pub medium: HorizonPolicy,
    pub long: HorizonPolicy,
    pub low_risk: f64,
    pub medium_risk: f64,
    pub high_risk: f64,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            short: HorizonPolicy {
                decay_factor: 1.0,
                trigger_threshold: 0.30,
            },
            medium: HorizonPolicy {
                decay_factor: 0.8,
                trigger_threshold: 0.50,
            },
            long: HorizonPolicy {
                decay_factor: 0.6,
                trigger_threshold: 0.65,
            },
            low_risk: 0.5,
            medium_risk: 1.0,
            high_risk: 1.5,
        }
    }
}

impl PolicyTable {
    pub const fn horizon(&self, horizon: Horizon) -> HorizonPolicy {
        match horizon {
            Horizon::Short => self.short,
            Horizon::Medium => self.medium,
            Horizon::Long => self.long,
        }
    }

    pub const fn risk_scale(&self, tolerance: RiskTolerance) -> f64 {
        match tolerance {
            RiskTolerance::Low => self.low_risk,
            RiskTolerance::Medium => self.medium_risk,
            RiskTolerance::High => self.high_risk,
        }
    }

    /// Check every entry is inside its declared range
    pub fn validate(&self) -> Result<()> {
        for horizon in Horizon::ALL {
            let p = self.horizon(horizon);
            if !(p.decay_factor > 0.0 && p.decay_factor <= 1.0) {
                return Err(MacroError::configuration(format!(
                    "decay factor for {horizon:?} must be in (0, 1], got {}",
                    p.decay_factor
                )));
            }
            if !(0.0..=1.0).contains(&p.trigger_threshold) {
                return Err(MacroError::configuration(format!(
                    "trigger threshold for {horizon:?} must be in [0, 1], got {}",
                    p.trigger_threshold
                )));
            }
        }

        for tolerance in RiskTolerance::ALL {
            let scale = self.risk_scale(tolerance);
            if !scale.is_finite() || scale <= 0.0 {
                return Err(MacroError::configuration(format!(
                    "risk scale for {tolerance:?} must be positive, got {scale}"
                )));
            }
        }

        Ok(())
    }

    /// Decide whether a classified event warrants rebalancing.
    ///
    /// The noise archetype never triggers, whatever its severity.
    pub fn decide(&self, severity: Severity, horizon: Horizon, noise: bool, mode: TriggerMode) -> TriggerDecision {
        let policy = self.horizon(horizon);
        let effective_impact = severity.value() * policy.decay_factor;
        let compared = match mode {
            TriggerMode::Decayed => effective_impact,
            TriggerMode::Raw => severity.value(),
        };
        let triggered = !noise && compared >= policy.trigger_threshold;

        tracing::info!(
            "Trigger check: impact {:.3} vs threshold {:.2} ({:?}) -> {}",
            compared,
            policy.trigger_threshold,
            mode,
            if triggered { "rebalance" } else { "hold" }
        );

        TriggerDecision {
            severity,
            decay_factor: policy.decay_factor,
            effective_impact,
            threshold: policy.trigger_threshold,
            triggered,
        }
    }
}
