//! Explanation assembly: fixed sentences keyed by archetype, severity,
//! horizon and the sign of each beta.

use crate::model::{Archetype, Horizon};
use crate::policy::TriggerDecision;

pub fn assemble(archetype: &Archetype, decision: &TriggerDecision, horizon: Horizon) -> Vec<String> {
    let mut lines = Vec::with_capacity(3 + archetype.exposures().count());

    lines.push(format!("Macro interpretation: {}", archetype.description));
    lines.push(format!(
        "Severity index {:.2} ({}), effective impact {:.2} against a {:.2} threshold for a {} horizon.",
        decision.severity.value(),
        decision.severity.band(),
        decision.effective_impact,
        decision.threshold,
        horizon.label()
    ));

    if archetype.noise {
        lines.push("This event lacks the macroeconomic relevance to move a diversified portfolio; no rebalancing was triggered.".into());
        return lines;
    }

    if !decision.triggered {
        lines.push(
            "The severity of this event is not high enough to justify portfolio changes given your investment horizon."
                .into(),
        );
        return lines;
    }

    lines.push(
        "Historically, markets respond to this type of event by reallocating capital toward assets that offer protection or benefit from the macro shift."
            .into(),
    );
    for (asset, beta) in archetype.exposures() {
        let direction = if beta > 0.0 { "increased" } else { "reduced" };
        lines.push(format!(
            "Exposure to {asset} was {direction} due to its historical behavior during similar events."
        ));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;
    use crate::registry::{ArchetypeRegistry, FINANCIAL_CRISIS};

    fn decision(triggered: bool) -> TriggerDecision {
        TriggerDecision {
            severity: Severity::new(0.8),
            decay_factor: 1.0,
            effective_impact: 0.8,
            threshold: 0.3,
            triggered,
        }
    }

    #[test]
    fn test_triggered_lists_each_exposure() {
        let registry = ArchetypeRegistry::builtin().unwrap();
        let crisis = registry.get(FINANCIAL_CRISIS).unwrap();
        let lines = assemble(&crisis, &decision(true), Horizon::Short);

        assert_eq!(lines.len(), 6);
        assert!(lines[0].contains("capital flight"));
        assert!(lines[1].contains("0.80 (severe)"));
        assert!(lines[1].contains(Horizon::Short.label()));
        assert_eq!(
            lines[3],
            "Exposure to Equities was reduced due to its historical behavior during similar events."
        );
        assert!(lines[4].starts_with("Exposure to Bonds was increased"));
        assert!(lines[5].starts_with("Exposure to Gold was increased"));
    }

    #[test]
    fn test_not_triggered() {
        let registry = ArchetypeRegistry::builtin().unwrap();
        let crisis = registry.get(FINANCIAL_CRISIS).unwrap();
        let lines = assemble(&crisis, &decision(false), Horizon::Long);

        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("not high enough"));
        assert!(!lines.iter().any(|l| l.starts_with("Exposure")));
    }

    #[test]
    fn test_noise() {
        let registry = ArchetypeRegistry::builtin().unwrap();
        let lines = assemble(&registry.noise(), &decision(false), Horizon::Medium);
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("no rebalancing"));
    }

    #[test]
    fn test_deterministic() {
        let registry = ArchetypeRegistry::builtin().unwrap();
        let crisis = registry.get(FINANCIAL_CRISIS).unwrap();
        assert_eq!(
            assemble(&crisis, &decision(true), Horizon::Short),
            assemble(&crisis, &decision(true), Horizon::Short)
        );
    }
}
