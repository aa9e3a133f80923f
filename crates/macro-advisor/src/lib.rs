//! # macro-advisor
//!
//! Interprets a macro-economic news headline and rebalances a portfolio
//! in response.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌─────────┐   ┌───────────┐
//! │ headline │──▶│ classifier │──▶│ severity │──▶│ trigger │──▶│ rebalance │
//! └──────────┘   └────────────┘   └──────────┘   └─────────┘   └───────────┘
//!                 similarity        [0, 1]        horizon        betas × severity
//!                 rule-based                      decay +        × decay × risk
//!                 analog top-K                    threshold      then renormalize
//! ```
//!
//! ## Example
//!
//! ```text
//! Headline:  "Regional bank collapses after deposit run"
//! Archetype: Financial Crisis        Severity: 0.75
//! Horizon:   Short (≤1 year)         Threshold: 0.30  → triggered
//!
//!            before   after
//! Equities   40.0  →  reduced
//! Bonds      30.0  →  increased
//! Gold       10.0  →  increased
//! ```
//!
//! Severity is a heuristic index, not a calibrated risk model.

pub mod analogs;
pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod explain;
pub mod model;
pub mod policy;
pub mod rebalance;
pub mod registry;
pub mod severity;

pub use analogs::{AnalogLibrary, HistoricalAnalog};
pub use analyzer::{AnalysisReport, AnalysisRequest, AnalyzerBuilder, MacroAnalyzer};
pub use classifier::{ClassifierKind, EventClassifier};
pub use config::AnalyzerConfig;
pub use model::{
    Anchor, Archetype, Asset, Axis, AxisScores, ClassificationResult, Horizon, PortfolioWeights,
    RebalanceResult, RiskProfile, RiskTolerance, Severity, WeightScale,
};
pub use policy::{HorizonPolicy, PolicyTable, TriggerDecision, TriggerMode};
pub use rebalance::RebalancingEngine;
pub use registry::ArchetypeRegistry;
pub use severity::{SeverityFormula, SeveritySource};

pub use macro_core::{MacroError, Result};
