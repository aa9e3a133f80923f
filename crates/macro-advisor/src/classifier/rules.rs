//! Rule-Based Classification
//!
//! Keyword groups assign raw axis scores; a fixed decision tree maps the
//! scores to an archetype. Within an axis, rules are listed from the highest
//! score down and the first match wins, so overlapping keyword sets resolve
//! deterministically.

use std::sync::Arc;

use macro_core::Result;

use crate::model::{Archetype, Axis, AxisScores, ClassificationResult};
use crate::registry::{
    ArchetypeRegistry, COMMODITY_SHOCK, CORPORATE_EARNINGS, FINANCIAL_CRISIS,
    GEOPOLITICAL_SHOCK, MONETARY_POLICY_SHIFT, TRADE_AND_GLOBALIZATION,
};
use crate::severity;

/// A keyword group that sets one axis to a fixed score
#[derive(Clone, Copy, Debug)]
pub struct KeywordRule {
    pub axis: Axis,
    pub score: f64,
    pub keywords: &'static [&'static str],
}

const fn rule(axis: Axis, score: f64, keywords: &'static [&'static str]) -> KeywordRule {
    KeywordRule {
        axis,
        score,
        keywords,
    }
}

/// Rules in evaluation order
pub const RULES: &[KeywordRule] = &[
    // Geopolitical intensity
    rule(Axis::Geopolitical, 3.0, &[
        "war", "wars", "invasion", "invade", "invades", "military", "missile", "missiles",
        "airstrike", "airstrikes", "assassination", "assassinated", "coup", "nuclear", "troops",
    ]),
    rule(Axis::Geopolitical, 2.0, &[
        "sanctions", "sanction", "conflict", "terror", "terrorist", "attack", "attacks",
        "embargo", "unrest", "blockade", "hostilities",
    ]),
    rule(Axis::Geopolitical, 1.0, &[
        "election", "elections", "diplomatic", "tension", "tensions", "protest", "protests",
        "summit", "geopolitical",
    ]),
    // Economic scale
    rule(Axis::EconomicScale, 3.0, &[
        "recession", "crisis", "collapse", "collapses", "collapsed", "default", "defaults",
        "depression", "bankruptcy", "bank run", "meltdown", "crash",
    ]),
    rule(Axis::EconomicScale, 2.0, &[
        "interest rate", "interest rates", "rates", "rate hike", "rate cut", "inflation",
        "central bank", "fed", "federal reserve", "ecb", "gdp", "unemployment", "stimulus",
        "tightening", "easing",
    ]),
    rule(Axis::EconomicScale, 1.0, &[
        "earnings", "profit", "profits", "revenue", "guidance", "merger", "acquisition", "ipo",
        "layoffs", "quarterly", "q1", "q2", "q3", "q4", "outlook",
    ]),
    // Cross-border reach
    rule(Axis::CrossBorder, 3.0, &[
        "tariff", "tariffs", "trade deal", "trade agreement", "trade war", "free trade",
    ]),
    rule(Axis::CrossBorder, 2.0, &[
        "trade", "export", "exports", "import", "imports", "sanctions", "embargo", "opec",
        "foreign", "nato", "g7", "g20", "cross border",
    ]),
    rule(Axis::CrossBorder, 1.0, &[
        "global", "worldwide", "international", "world", "overseas", "emerging markets",
        "currency", "dollar",
    ]),
    // Asset transmission
    rule(Axis::Transmission, 3.0, &[
        "oil", "crude", "gold", "commodity", "commodities", "energy", "gas", "opec",
    ]),
    rule(Axis::Transmission, 2.0, &[
        "bond", "bonds", "yield", "yields", "treasury", "treasuries", "stocks", "stock",
        "equities", "shares", "market", "markets", "crypto", "bitcoin", "credit", "liquidity",
    ]),
    rule(Axis::Transmission, 1.0, &[
        "earnings", "profit", "profits", "revenue", "dividend", "price", "prices", "sales",
    ]),
];

/// Lower-case and collapse to single-space separated words, padded with spaces
fn normalize(text: &str) -> String {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect();
    format!(" {} ", words.join(" "))
}

/// Whole-word (or whole-phrase) membership
fn contains_keyword(normalized: &str, keyword: &str) -> bool {
    normalized.contains(&format!(" {keyword} "))
}

/// Score every axis; returns `None` when no rule matched at all
pub fn score_axes(text: &str) -> Option<AxisScores> {
    let normalized = normalize(text);
    let mut scores = AxisScores::default();
    let mut decided = Vec::with_capacity(Axis::ALL.len());

    for rule in RULES {
        if decided.contains(&rule.axis) {
            continue;
        }
        if rule.keywords.iter().any(|k| contains_keyword(&normalized, k)) {
            scores.set(rule.axis, rule.score);
            decided.push(rule.axis);
        }
    }

    if decided.is_empty() { None } else { Some(scores) }
}

/// Decision tree from axis scores to archetype name; `None` means noise.
///
/// Branches are checked top to bottom:
///
/// 1. geopolitical >= 2 → Geopolitical Shock
/// 2. economic scale >= 3 → Financial Crisis
/// 3. transmission >= 3 → Commodity Shock
/// 4. cross-border >= 2 → Trade & Globalization
/// 5. economic scale >= 2 → Monetary Policy Shift
/// 6. economic scale >= 1 → Corporate Earnings
/// 7. geopolitical >= 1 → Geopolitical Shock
pub fn decide(scores: &AxisScores) -> Option<&'static str> {
    if scores.geopolitical >= 2.0 {
        Some(GEOPOLITICAL_SHOCK)
    } else if scores.economic_scale >= 3.0 {
        Some(FINANCIAL_CRISIS)
    } else if scores.transmission >= 3.0 {
        Some(COMMODITY_SHOCK)
    } else if scores.cross_border >= 2.0 {
        Some(TRADE_AND_GLOBALIZATION)
    } else if scores.economic_scale >= 2.0 {
        Some(MONETARY_POLICY_SHIFT)
    } else if scores.economic_scale >= 1.0 {
        Some(CORPORATE_EARNINGS)
    } else if scores.geopolitical >= 1.0 {
        Some(GEOPOLITICAL_SHOCK)
    } else {
        None
    }
}

const DECISION_TARGETS: [&str; 6] = [
    GEOPOLITICAL_SHOCK,
    FINANCIAL_CRISIS,
    COMMODITY_SHOCK,
    TRADE_AND_GLOBALIZATION,
    MONETARY_POLICY_SHIFT,
    CORPORATE_EARNINGS,
];

/// Keyword and decision-tree classifier
pub struct RuleClassifier {
    targets: Vec<(&'static str, Arc<Archetype>)>,
    noise: Arc<Archetype>,
}

impl RuleClassifier {
    /// The registry must contain every archetype the decision tree can emit
    pub fn new(registry: &ArchetypeRegistry) -> Result<Self> {
        let targets = DECISION_TARGETS
            .iter()
            .map(|name| registry.get(name).map(|a| (*name, a)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            targets,
            noise: registry.noise(),
        })
    }

    fn archetype(&self, name: &str) -> Arc<Archetype> {
        self.targets
            .iter()
            .find(|(n, _)| *n == name)
            .map_or_else(|| self.noise.clone(), |(_, a)| a.clone())
    }

    pub fn classify(&self, text: &str) -> ClassificationResult {
        let Some(scores) = score_axes(text) else {
            return ClassificationResult {
                archetype: self.noise.clone(),
                raw_score: 0.0,
                axis_scores: Some(AxisScores::default()),
            };
        };

        let archetype = decide(&scores).map_or_else(|| self.noise.clone(), |name| self.archetype(name));

        ClassificationResult {
            archetype,
            raw_score: severity::axis_weighted(&scores),
            axis_scores: Some(scores),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AXIS_MAX;
    use crate::registry::LOCAL_NOISE;

    fn classifier() -> RuleClassifier {
        RuleClassifier::new(&ArchetypeRegistry::builtin().unwrap()).unwrap()
    }

    #[test]
    fn test_geopolitical_keywords_hit_axis_maximum() {
        let c = classifier();
        for headline in [
            "War breaks out on the border",
            "Invasion fears grip the region",
            "Military drills near the strait",
            "US-China trade war escalates",
        ] {
            let result = c.classify(headline);
            assert_eq!(result.archetype.name, GEOPOLITICAL_SHOCK, "{headline}");
            let axes = result.axis_scores.unwrap();
            assert!((axes.geopolitical - AXIS_MAX).abs() < f64::EPSILON, "{headline}");
        }
    }

    #[test]
    fn test_earnings_headline() {
        let result = classifier().classify("Q3 earnings beat expectations");
        assert_eq!(result.archetype.name, CORPORATE_EARNINGS);
        assert!(result.archetype.beta(crate::model::Asset::Equities) > 0.0);
        assert!(result.raw_score > 0.0);
    }

    #[test]
    fn test_decision_tree_branches() {
        let c = classifier();
        assert_eq!(c.classify("Regional bank collapse sparks panic").archetype.name, FINANCIAL_CRISIS);
        assert_eq!(c.classify("Crude prices spike after OPEC cut").archetype.name, COMMODITY_SHOCK);
        assert_eq!(c.classify("New tariffs on steel imports").archetype.name, TRADE_AND_GLOBALIZATION);
        assert_eq!(c.classify("Fed signals rate hike as inflation persists").archetype.name, MONETARY_POLICY_SHIFT);
        assert_eq!(c.classify("Diplomatic tensions rise before summit").archetype.name, GEOPOLITICAL_SHOCK);
    }

    #[test]
    fn test_whole_word_matching() {
        // "award" and "warning" must not match "war"
        assert!(score_axes("Local bakery wins award despite warning").is_none());
        assert!(contains_keyword(&normalize("Central-Bank decision"), "central bank"));
    }

    #[test]
    fn test_first_matching_rule_wins_per_axis() {
        // "sanctions" (2) and "war" (3) both present; the higher rule is listed first
        let axes = score_axes("Sanctions follow the war").unwrap();
        assert!((axes.geopolitical - 3.0).abs() < f64::EPSILON);
        // "sanctions" also scores cross-border
        assert!((axes.cross_border - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_match_is_noise_at_minimum() {
        let result = classifier().classify("Celebrity opens a bakery");
        assert_eq!(result.archetype.name, LOCAL_NOISE);
        assert_eq!(result.axis_scores, Some(AxisScores::default()));
        assert!(result.raw_score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_matched_but_undecided_is_noise() {
        // Only transmission scores; the tree has no branch for it
        let result = classifier().classify("Stocks drift sideways");
        assert_eq!(result.archetype.name, LOCAL_NOISE);
        assert!(result.axis_scores.unwrap().transmission > 0.0);
    }

    #[test]
    fn test_registry_must_cover_tree() {
        let registry = ArchetypeRegistry::from_json(
            r#"[{"name": "Quiet", "description": "", "anchor": {"keywords": ["x"]}, "noise": true}]"#,
        )
        .unwrap();
        assert!(RuleClassifier::new(&registry).is_err());
    }

    #[test]
    fn test_rule_scores_within_scale() {
        for rule in RULES {
            assert!((0.0..=AXIS_MAX).contains(&rule.score));
            assert!(!rule.keywords.is_empty());
        }
    }
}
