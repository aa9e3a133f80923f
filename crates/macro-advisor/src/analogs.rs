//! Historical Analog Library
//!
//! Labelled past events, each carrying the archetype it belonged to, the
//! severity it reached and its axis profile. The analog-weighted classifier
//! embeds them once at startup and averages the nearest ones per request.

use macro_core::{MacroError, Result};
use serde::{Deserialize, Serialize};

use crate::model::AxisScores;
use crate::registry::{
    ArchetypeRegistry, COMMODITY_SHOCK, CORPORATE_EARNINGS, FINANCIAL_CRISIS,
    GEOPOLITICAL_SHOCK, LOCAL_NOISE, MONETARY_POLICY_SHIFT, TRADE_AND_GLOBALIZATION,
};

/// A labelled historical event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalAnalog {
    pub headline: String,

    /// Name of a registry archetype
    pub archetype: String,

    /// Observed severity in [0, 1]
    pub severity: f64,

    pub axis_scores: AxisScores,
}

/// Validated collection of analogs
#[derive(Clone, Debug)]
pub struct AnalogLibrary {
    analogs: Vec<HistoricalAnalog>,
}

impl AnalogLibrary {
    /// Validate analogs against a registry
    pub fn new(analogs: Vec<HistoricalAnalog>, registry: &ArchetypeRegistry) -> Result<Self> {
        if analogs.is_empty() {
            return Err(MacroError::configuration("analog library is empty"));
        }

        for analog in &analogs {
            if analog.headline.trim().is_empty() {
                return Err(MacroError::configuration("analog with empty headline"));
            }
            registry.get(&analog.archetype)?;
            if !(0.0..=1.0).contains(&analog.severity) {
                return Err(MacroError::configuration(format!(
                    "analog '{}' has severity {} outside [0, 1]",
                    analog.headline, analog.severity
                )));
            }
            if !analog.axis_scores.is_within_range() {
                return Err(MacroError::configuration(format!(
                    "analog '{}' has axis scores outside the raw scale",
                    analog.headline
                )));
            }
        }

        Ok(Self { analogs })
    }

    /// Load from a JSON array
    pub fn from_json(json: &str, registry: &ArchetypeRegistry) -> Result<Self> {
        let analogs: Vec<HistoricalAnalog> = serde_json::from_str(json)
            .map_err(|e| MacroError::configuration(format!("malformed analog library: {e}")))?;
        Self::new(analogs, registry)
    }

    /// Built-in library, labelled against the built-in archetypes
    pub fn builtin(registry: &ArchetypeRegistry) -> Result<Self> {
        Self::new(builtin_analogs(), registry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoricalAnalog> {
        self.analogs.iter()
    }

    pub fn len(&self) -> usize {
        self.analogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analogs.is_empty()
    }
}

fn analog(headline: &str, archetype: &str, severity: f64, axes: (f64, f64, f64, f64)) -> HistoricalAnalog {
    HistoricalAnalog {
        headline: headline.into(),
        archetype: archetype.into(),
        severity,
        axis_scores: AxisScores::new(axes.0, axes.1, axes.2, axes.3),
    }
}

pub fn builtin_analogs() -> Vec<HistoricalAnalog> {
    vec![
        analog(
            "Russia launches full-scale military invasion of Ukraine",
            GEOPOLITICAL_SHOCK,
            0.85,
            (3.0, 2.0, 3.0, 3.0),
        ),
        analog(
            "Terror attacks on New York halt trading for a week",
            GEOPOLITICAL_SHOCK,
            0.8,
            (3.0, 2.0, 2.0, 2.0),
        ),
        analog(
            "Federal Reserve raises interest rates by 75 basis points to fight inflation",
            MONETARY_POLICY_SHIFT,
            0.65,
            (0.0, 2.0, 1.0, 2.0),
        ),
        analog(
            "Central bank cuts rates to zero in emergency move",
            MONETARY_POLICY_SHIFT,
            0.7,
            (0.0, 3.0, 2.0, 2.0),
        ),
        analog(
            "Drone strikes on Saudi oil facilities knock out half of output",
            COMMODITY_SHOCK,
            0.7,
            (2.0, 2.0, 2.0, 3.0),
        ),
        analog(
            "OPEC+ announces surprise oil production cut",
            COMMODITY_SHOCK,
            0.55,
            (1.0, 2.0, 2.0, 3.0),
        ),
        analog(
            "Tech giant posts record quarterly earnings and raises guidance",
            CORPORATE_EARNINGS,
            0.3,
            (0.0, 1.0, 0.0, 1.0),
        ),
        analog(
            "Retailer issues profit warning and cuts revenue guidance",
            CORPORATE_EARNINGS,
            0.35,
            (0.0, 1.0, 0.0, 1.0),
        ),
        analog(
            "Lehman Brothers files for bankruptcy as credit markets freeze",
            FINANCIAL_CRISIS,
            0.95,
            (0.0, 3.0, 3.0, 3.0),
        ),
        analog(
            "Regional bank collapses after deposit run",
            FINANCIAL_CRISIS,
            0.75,
            (0.0, 3.0, 1.0, 2.0),
        ),
        analog(
            "United States imposes sweeping tariffs on Chinese imports",
            TRADE_AND_GLOBALIZATION,
            0.6,
            (1.0, 2.0, 3.0, 2.0),
        ),
        analog(
            "Landmark free trade agreement signed between the EU and Mercosur",
            TRADE_AND_GLOBALIZATION,
            0.4,
            (0.0, 1.0, 3.0, 1.0),
        ),
        analog(
            "Celebrity wedding draws crowds in a small town",
            LOCAL_NOISE,
            0.05,
            (0.0, 0.0, 0.0, 0.0),
        ),
        analog(
            "Local council approves park renovation",
            LOCAL_NOISE,
            0.02,
            (0.0, 0.0, 0.0, 0.0),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_library_validates() {
        let registry = ArchetypeRegistry::builtin().unwrap();
        let library = AnalogLibrary::builtin(&registry).unwrap();
        assert_eq!(library.len(), 14);

        // Every archetype has at least one analog
        for archetype in registry.iter() {
            assert!(library.iter().any(|a| a.archetype == archetype.name), "{}", archetype.name);
        }
    }

    #[test]
    fn test_unknown_archetype_rejected() {
        let registry = ArchetypeRegistry::builtin().unwrap();
        let bad = vec![analog("Meteor strike", "Cosmic Event", 0.9, (0.0, 0.0, 0.0, 0.0))];
        assert!(AnalogLibrary::new(bad, &registry).is_err());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let registry = ArchetypeRegistry::builtin().unwrap();

        let severe = vec![analog("x", LOCAL_NOISE, 1.5, (0.0, 0.0, 0.0, 0.0))];
        assert!(AnalogLibrary::new(severe, &registry).is_err());

        let axes = vec![analog("x", LOCAL_NOISE, 0.1, (0.0, 5.0, 0.0, 0.0))];
        assert!(AnalogLibrary::new(axes, &registry).is_err());
    }

    #[test]
    fn test_empty_library_rejected() {
        let registry = ArchetypeRegistry::builtin().unwrap();
        assert!(AnalogLibrary::new(Vec::new(), &registry).is_err());
    }

    #[test]
    fn test_from_json() {
        let registry = ArchetypeRegistry::builtin().unwrap();
        let json = r#"[{
            "headline": "Gold spikes to record",
            "archetype": "Commodity Shock",
            "severity": 0.5,
            "axis_scores": {"geopolitical": 0, "economic_scale": 1, "cross_border": 1, "transmission": 3}
        }]"#;
        let library = AnalogLibrary::from_json(json, &registry).unwrap();
        assert_eq!(library.len(), 1);
    }
}
