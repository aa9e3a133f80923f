//! Domain Models
//!
//! Value types for macro event analysis. Weights and scores are `f64`;
//! capital amounts use `rust_decimal` (see `analyzer`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use macro_core::{Embedding, MacroError, Result};
use serde::{Deserialize, Serialize};

/// Floating tolerance for weight totals
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Upper end of the raw rule-based axis scale
pub const AXIS_MAX: f64 = 3.0;

/// The fixed asset universe, in canonical order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    Equities,
    Bonds,
    Gold,
    Crypto,
    Commodities,
    #[serde(rename = "ETFs")]
    Etfs,
}

impl Asset {
    pub const ALL: [Self; 6] = [
        Self::Equities,
        Self::Bonds,
        Self::Gold,
        Self::Crypto,
        Self::Commodities,
        Self::Etfs,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Equities => "Equities",
            Self::Bonds => "Bonds",
            Self::Gold => "Gold",
            Self::Crypto => "Crypto",
            Self::Commodities => "Commodities",
            Self::Etfs => "ETFs",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Asset {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MacroError::configuration(format!("unknown asset '{s}'")))
    }
}

/// Scale the weights of a portfolio sum to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightScale {
    /// Weights sum to 1.0
    Fraction,

    /// Weights sum to 100
    #[default]
    Percent,
}

impl WeightScale {
    pub const fn total(self) -> f64 {
        match self {
            Self::Fraction => 1.0,
            Self::Percent => 100.0,
        }
    }
}

impl FromStr for WeightScale {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fraction" | "1" => Ok(Self::Fraction),
            "percent" | "100" => Ok(Self::Percent),
            other => Err(MacroError::configuration(format!("unknown weight scale '{other}'"))),
        }
    }
}

/// Portfolio weights over the asset universe
///
/// Every asset of the universe is present; missing inputs become 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Asset, f64>", into = "BTreeMap<Asset, f64>")]
pub struct PortfolioWeights {
    weights: BTreeMap<Asset, f64>,
}

impl From<BTreeMap<Asset, f64>> for PortfolioWeights {
    fn from(mut weights: BTreeMap<Asset, f64>) -> Self {
        for asset in Asset::ALL {
            weights.entry(asset).or_insert(0.0);
        }
        Self { weights }
    }
}

impl From<PortfolioWeights> for BTreeMap<Asset, f64> {
    fn from(p: PortfolioWeights) -> Self {
        p.weights
    }
}

impl PortfolioWeights {
    pub fn new(weights: impl IntoIterator<Item = (Asset, f64)>) -> Self {
        Self::from(weights.into_iter().collect::<BTreeMap<_, _>>())
    }

    /// Equal weight across the universe
    pub fn equal(scale: WeightScale) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let each = scale.total() / Asset::ALL.len() as f64;
        Self::new(Asset::ALL.map(|a| (a, each)))
    }

    pub fn get(&self, asset: Asset) -> f64 {
        self.weights.get(&asset).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Iterate in canonical asset order
    pub fn iter(&self) -> impl Iterator<Item = (Asset, f64)> + '_ {
        self.weights.iter().map(|(a, w)| (*a, *w))
    }

    /// Check weights are finite, non-negative and sum to the scale total
    pub fn validate(&self, scale: WeightScale) -> Result<()> {
        for (asset, weight) in self.iter() {
            if !weight.is_finite() {
                return Err(MacroError::validation(format!("weight for {asset} is not a number")));
            }
            if weight < 0.0 {
                return Err(MacroError::validation(format!(
                    "weight for {asset} is negative ({weight})"
                )));
            }
        }

        let expected = scale.total();
        let total = self.total();
        if (total - expected).abs() > WEIGHT_TOLERANCE * expected {
            return Err(MacroError::validation(format!(
                "total allocation must equal {expected}, got {total}"
            )));
        }

        Ok(())
    }
}

/// Investment horizon
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    Short,
    Medium,
    Long,
}

impl Horizon {
    pub const ALL: [Self; 3] = [Self::Short, Self::Medium, Self::Long];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Short => "Short (≤1 year)",
            Self::Medium => "Medium (1–3 years)",
            Self::Long => "Long (3+ years)",
        }
    }
}

impl FromStr for Horizon {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => Err(MacroError::configuration(format!("unknown horizon '{other}'"))),
        }
    }
}

/// Risk tolerance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

impl RiskTolerance {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];
}

impl FromStr for RiskTolerance {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(MacroError::configuration(format!("unknown risk tolerance '{other}'"))),
        }
    }
}

/// Rule-based classification axes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Geopolitical,
    EconomicScale,
    CrossBorder,
    Transmission,
}

impl Axis {
    pub const ALL: [Self; 4] = [
        Self::Geopolitical,
        Self::EconomicScale,
        Self::CrossBorder,
        Self::Transmission,
    ];
}

/// Raw axis scores on the 0..=`AXIS_MAX` scale
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisScores {
    pub geopolitical: f64,
    pub economic_scale: f64,
    pub cross_border: f64,
    pub transmission: f64,
}

impl AxisScores {
    pub const fn new(geopolitical: f64, economic_scale: f64, cross_border: f64, transmission: f64) -> Self {
        Self {
            geopolitical,
            economic_scale,
            cross_border,
            transmission,
        }
    }

    pub const fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Geopolitical => self.geopolitical,
            Axis::EconomicScale => self.economic_scale,
            Axis::CrossBorder => self.cross_border,
            Axis::Transmission => self.transmission,
        }
    }

    pub const fn set(&mut self, axis: Axis, score: f64) {
        match axis {
            Axis::Geopolitical => self.geopolitical = score,
            Axis::EconomicScale => self.economic_scale = score,
            Axis::CrossBorder => self.cross_border = score,
            Axis::Transmission => self.transmission = score,
        }
    }

    /// Axis score mapped into [0, 1]
    pub fn normalized(&self, axis: Axis) -> f64 {
        (self.get(axis) / AXIS_MAX).clamp(0.0, 1.0)
    }

    pub fn is_within_range(&self) -> bool {
        Axis::ALL
            .iter()
            .all(|a| (0.0..=AXIS_MAX).contains(&self.get(*a)))
    }
}

/// Static risk sub-scores of an archetype, each in [0, 1]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub volatility: f64,
    pub drawdown: f64,
    pub contagion: f64,
}

/// What an archetype is matched against
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Ordered keyword phrases; embedded once at load for similarity matching
    Keywords(Vec<String>),

    /// Precomputed embedding
    Vector(Embedding),
}

/// A named macro-event category
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    /// Unique key
    pub name: String,

    /// Narrative shown in explanations
    pub description: String,

    pub anchor: Anchor,

    /// Per-asset betas in [-1, 1]; missing assets are 0
    #[serde(default)]
    pub impact: BTreeMap<Asset, f64>,

    #[serde(default)]
    pub risk_profile: Option<RiskProfile>,

    /// The single no-impact archetype
    #[serde(default)]
    pub noise: bool,
}

impl Archetype {
    pub fn beta(&self, asset: Asset) -> f64 {
        self.impact.get(&asset).copied().unwrap_or(0.0)
    }

    /// Non-zero betas in canonical asset order
    pub fn exposures(&self) -> impl Iterator<Item = (Asset, f64)> + '_ {
        Asset::ALL
            .into_iter()
            .map(|a| (a, self.beta(a)))
            .filter(|(_, b)| *b != 0.0)
    }
}

/// Severity index in [0, 1]
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Severity(f64);

impl Severity {
    pub const ZERO: Self = Self(0.0);
    pub const MAX: Self = Self(1.0);

    /// Clamp into [0, 1]; NaN becomes 0
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self::ZERO
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    /// Qualitative band used in explanations
    pub fn band(self) -> &'static str {
        match self.0 {
            v if v >= 0.75 => "severe",
            v if v >= 0.5 => "elevated",
            v if v >= 0.25 => "moderate",
            _ => "low",
        }
    }
}

/// Output of an event classifier
#[derive(Clone, Debug)]
pub struct ClassificationResult {
    pub archetype: Arc<Archetype>,

    /// Similarity or rule confidence, in [0, 1]
    pub raw_score: f64,

    /// Present for rule-based and analog-weighted classification
    pub axis_scores: Option<AxisScores>,
}

impl ClassificationResult {
    pub fn is_noise(&self) -> bool {
        self.archetype.noise
    }
}

/// Output of the rebalancing engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RebalanceResult {
    pub triggered: bool,
    pub new_weights: PortfolioWeights,

    /// Unclamped adjustment per asset, in portfolio units
    pub adjustments: BTreeMap<Asset, f64>,
}

impl RebalanceResult {
    /// No-trigger outcome: weights returned unchanged
    pub fn identity(base: &PortfolioWeights) -> Self {
        Self {
            triggered: false,
            new_weights: base.clone(),
            adjustments: Asset::ALL.into_iter().map(|a| (a, 0.0)).collect(),
        }
    }
}
