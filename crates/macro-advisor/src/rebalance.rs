//! Rebalancing Engine
//!
//! Linear beta-driven adjustment followed by clamping and renormalization.
//! Returns a fresh `PortfolioWeights`; the caller's weights are never touched.

use std::collections::BTreeMap;

use macro_core::{MacroError, Result};

use crate::model::{Archetype, Asset, PortfolioWeights, RebalanceResult, Severity};

/// Default adjustment amplification
pub const DEFAULT_AMPLIFICATION: f64 = 2.0;

/// Inputs that scale every adjustment
#[derive(Clone, Copy, Debug)]
pub struct RebalanceInputs {
    pub severity: Severity,
    pub decay_factor: f64,
    pub risk_scale: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct RebalancingEngine {
    amplification: f64,
}

impl Default for RebalancingEngine {
    fn default() -> Self {
        Self {
            amplification: DEFAULT_AMPLIFICATION,
        }
    }
}

impl RebalancingEngine {
    pub fn new(amplification: f64) -> Result<Self> {
        if !amplification.is_finite() || amplification <= 0.0 {
            return Err(MacroError::configuration(format!(
                "amplification must be positive, got {amplification}"
            )));
        }
        Ok(Self { amplification })
    }

    pub const fn amplification(&self) -> f64 {
        self.amplification
    }

    /// Signed adjustment for one asset, in units of the portfolio total
    pub fn adjustment(&self, beta: f64, inputs: RebalanceInputs, total: f64) -> f64 {
        beta * inputs.severity.value() * inputs.decay_factor * inputs.risk_scale * self.amplification * total
    }

    pub fn rebalance(
        &self,
        base: &PortfolioWeights,
        archetype: &Archetype,
        inputs: RebalanceInputs,
    ) -> Result<RebalanceResult> {
        let total = base.total();
        let mut adjustments = BTreeMap::new();
        let mut raw = BTreeMap::new();

        for (asset, weight) in base.iter() {
            let adjustment = self.adjustment(archetype.beta(asset), inputs, total);
            adjustments.insert(asset, adjustment);
            raw.insert(asset, (weight + adjustment).max(0.0));
        }

        let raw_total: f64 = raw.values().sum();
        if raw_total <= 0.0 || !raw_total.is_finite() {
            return Err(MacroError::validation(format!(
                "archetype '{}' drives every held weight to zero",
                archetype.name
            )));
        }

        let new_weights = PortfolioWeights::new(
            raw.into_iter()
                .map(|(asset, w): (Asset, f64)| (asset, w / raw_total * total)),
        );

        tracing::debug!(
            "Rebalanced for '{}': severity {:.3}, decay {:.2}, risk {:.2}",
            archetype.name,
            inputs.severity.value(),
            inputs.decay_factor,
            inputs.risk_scale
        );

        Ok(RebalanceResult {
            triggered: true,
            new_weights,
            adjustments,
        })
    }
}
