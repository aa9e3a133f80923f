//! Archetype Registry
//!
//! Immutable table of macro archetypes, validated once at load. The order
//! of the table is the canonical order used for tie-breaking.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use macro_core::{MacroError, Result};

use crate::model::{Anchor, Archetype, Asset, RiskProfile};

pub const GEOPOLITICAL_SHOCK: &str = "Geopolitical Shock";
pub const MONETARY_POLICY_SHIFT: &str = "Monetary Policy Shift";
pub const COMMODITY_SHOCK: &str = "Commodity Shock";
pub const CORPORATE_EARNINGS: &str = "Corporate Earnings";
pub const FINANCIAL_CRISIS: &str = "Financial Crisis";
pub const TRADE_AND_GLOBALIZATION: &str = "Trade & Globalization";
pub const LOCAL_NOISE: &str = "Local / Noise";

/// Validated archetype table
#[derive(Debug)]
pub struct ArchetypeRegistry {
    archetypes: Vec<Arc<Archetype>>,
    by_name: HashMap<String, usize>,
    noise: usize,
}

impl ArchetypeRegistry {
    /// Validate and index a table of archetypes
    pub fn new(archetypes: Vec<Archetype>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(archetypes.len());
        let mut noise = None;

        for (idx, archetype) in archetypes.iter().enumerate() {
            validate_archetype(archetype)?;

            if by_name.insert(archetype.name.clone(), idx).is_some() {
                return Err(MacroError::configuration(format!(
                    "duplicate archetype '{}'",
                    archetype.name
                )));
            }

            if archetype.noise {
                if noise.is_some() {
                    return Err(MacroError::configuration(
                        "more than one noise archetype is declared",
                    ));
                }
                noise = Some(idx);
            }
        }

        let noise = noise.ok_or_else(|| MacroError::configuration("no noise archetype is declared"))?;

        tracing::info!(
            "Archetype registry loaded: {} archetypes, noise = '{}'",
            archetypes.len(),
            archetypes[noise].name
        );

        Ok(Self {
            archetypes: archetypes.into_iter().map(Arc::new).collect(),
            by_name,
            noise,
        })
    }

    /// Load from a JSON array of archetypes
    pub fn from_json(json: &str) -> Result<Self> {
        let archetypes: Vec<Archetype> = serde_json::from_str(json)
            .map_err(|e| MacroError::configuration(format!("malformed archetype table: {e}")))?;
        Self::new(archetypes)
    }

    /// The built-in seven-archetype table
    pub fn builtin() -> Result<Self> {
        Self::new(builtin_archetypes())
    }

    /// Look up by unique name
    pub fn get(&self, name: &str) -> Result<Arc<Archetype>> {
        self.by_name
            .get(name)
            .map(|idx| self.archetypes[*idx].clone())
            .ok_or_else(|| MacroError::configuration(format!("unknown archetype '{name}'")))
    }

    /// Position in canonical order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn noise(&self) -> Arc<Archetype> {
        self.archetypes[self.noise].clone()
    }

    /// Archetypes in canonical order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Archetype>> {
        self.archetypes.iter()
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Check every archetype carries a risk profile
    pub fn require_risk_profiles(&self) -> Result<()> {
        match self.archetypes.iter().find(|a| a.risk_profile.is_none()) {
            Some(a) => Err(MacroError::configuration(format!(
                "archetype '{}' has no risk profile",
                a.name
            ))),
            None => Ok(()),
        }
    }
}

fn validate_archetype(archetype: &Archetype) -> Result<()> {
    let fail = |msg: String| -> Result<()> {
        Err(MacroError::configuration(format!("archetype '{}': {msg}", archetype.name)))
    };

    if archetype.name.trim().is_empty() {
        return Err(MacroError::configuration("archetype with empty name"));
    }

    match &archetype.anchor {
        Anchor::Keywords(words) if words.iter().all(|w| w.trim().is_empty()) => {
            return fail("anchor has no keywords".into());
        }
        Anchor::Vector(v) if v.dimension() == 0 => return fail("anchor vector is empty".into()),
        _ => {}
    }

    for (asset, beta) in &archetype.impact {
        if !(-1.0..=1.0).contains(beta) {
            return fail(format!("beta {beta} for {asset} is outside [-1, 1]"));
        }
    }

    if archetype.noise && archetype.impact.values().any(|b| *b != 0.0) {
        return fail("noise archetype must have all betas = 0".into());
    }

    if let Some(profile) = &archetype.risk_profile {
        let in_range = [profile.volatility, profile.drawdown, profile.contagion]
            .iter()
            .all(|v| (0.0..=1.0).contains(v));
        if !in_range {
            return fail("risk profile scores must lie in [0, 1]".into());
        }
    }

    Ok(())
}

fn archetype(
    name: &str,
    description: &str,
    keywords: &str,
    impact: &[(Asset, f64)],
    risk: (f64, f64, f64),
) -> Archetype {
    Archetype {
        name: name.into(),
        description: description.into(),
        anchor: Anchor::Keywords(keywords.split_whitespace().map(String::from).collect()),
        impact: impact.iter().copied().collect::<BTreeMap<_, _>>(),
        risk_profile: Some(RiskProfile {
            volatility: risk.0,
            drawdown: risk.1,
            contagion: risk.2,
        }),
        noise: false,
    }
}

/// Built-in archetypes in canonical order
pub fn builtin_archetypes() -> Vec<Archetype> {
    use Asset::{Bonds, Commodities, Equities, Gold};

    let mut noise = archetype(
        LOCAL_NOISE,
        "This event lacks sufficient macroeconomic relevance to impact diversified portfolios.",
        "celebrity local unrelated minor event",
        &[],
        (0.0, 0.0, 0.0),
    );
    noise.noise = true;

    vec![
        archetype(
            GEOPOLITICAL_SHOCK,
            "Geopolitical shocks increase uncertainty and risk aversion across global markets.",
            "war assassination conflict sanctions military instability",
            &[(Equities, -0.20), (Bonds, 0.15), (Gold, 0.30)],
            (0.8, 0.6, 0.7),
        ),
        archetype(
            MONETARY_POLICY_SHIFT,
            "Changes in monetary policy directly affect liquidity, borrowing costs, and asset valuations.",
            "interest rates central bank inflation tightening easing",
            &[(Equities, -0.10), (Bonds, -0.15), (Gold, 0.10)],
            (0.5, 0.4, 0.6),
        ),
        archetype(
            COMMODITY_SHOCK,
            "Commodity shocks signal inflationary pressure or supply constraints in the global economy.",
            "gold oil commodities supply shock price spike",
            &[(Equities, -0.05), (Gold, 0.35), (Commodities, 0.30)],
            (0.6, 0.4, 0.5),
        ),
        archetype(
            CORPORATE_EARNINGS,
            "Earnings events primarily impact equity valuations and investor sentiment.",
            "earnings profit revenue downgrade guidance",
            &[(Equities, 0.20)],
            (0.3, 0.2, 0.1),
        ),
        archetype(
            FINANCIAL_CRISIS,
            "Financial crises trigger systemic risk and capital flight toward safe-haven assets.",
            "bank collapse liquidity credit crisis",
            &[(Equities, -0.35), (Bonds, 0.25), (Gold, 0.40)],
            (0.9, 0.9, 0.9),
        ),
        archetype(
            TRADE_AND_GLOBALIZATION,
            "Trade developments influence growth expectations and cross-border capital flows.",
            "trade deal tariffs exports imports agreement",
            &[(Equities, 0.15), (Commodities, 0.20)],
            (0.4, 0.3, 0.6),
        ),
        noise,
    ]
}
