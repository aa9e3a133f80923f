//! Analysis Pipeline
//!
//! Validation → classification → severity → trigger decision → rebalancing
//! → explanation, for one headline at a time.
//!
//! All embeddings of anchors and analogs are computed when the analyzer is
//! built. Afterwards the analyzer is immutable and can be shared across
//! tasks behind an `Arc`; each call embeds the headline at most once.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use macro_core::{EmbeddingProvider, MacroError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analogs::AnalogLibrary;
use crate::classifier::{AnalogClassifier, ClassifierKind, EventClassifier, RuleClassifier, SimilarityClassifier};
use crate::config::AnalyzerConfig;
use crate::explain;
use crate::model::{Asset, AxisScores, Horizon, PortfolioWeights, RebalanceResult, RiskTolerance, Severity};
use crate::policy::PolicyTable;
use crate::rebalance::{RebalanceInputs, RebalancingEngine};
use crate::registry::ArchetypeRegistry;
use crate::severity::{SeverityFormula, SeveritySource};

/// One analysis request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Free-text news headline
    pub headline: String,

    /// Current allocation
    pub weights: PortfolioWeights,

    pub horizon: Horizon,

    pub risk_tolerance: RiskTolerance,

    /// Amount to distribute over the new weights
    pub capital: Decimal,
}

/// Full result of one analysis
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub headline: String,
    pub classifier: ClassifierKind,

    /// Matched archetype name
    pub archetype: String,

    pub severity: Severity,
    pub effective_impact: f64,
    pub trigger_threshold: f64,
    pub triggered: bool,

    /// Raw axis scores, when the classifier produced them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_scores: Option<AxisScores>,

    pub horizon: Horizon,
    pub risk_tolerance: RiskTolerance,
    pub base_weights: PortfolioWeights,
    pub new_weights: PortfolioWeights,
    pub adjustments: BTreeMap<Asset, f64>,
    pub capital_per_asset: BTreeMap<Asset, Decimal>,
    pub explanation: Vec<String>,
}

/// Builder for [`MacroAnalyzer`]
pub struct AnalyzerBuilder {
    provider: Arc<dyn EmbeddingProvider>,
    config: AnalyzerConfig,
    registry: Option<ArchetypeRegistry>,
    analogs: Option<AnalogLibrary>,
    policy: PolicyTable,
}

impl AnalyzerBuilder {
    #[must_use]
    pub fn config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the built-in archetype table
    #[must_use]
    pub fn registry(mut self, registry: ArchetypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the built-in analog library (analog classifier only)
    #[must_use]
    pub fn analogs(mut self, analogs: AnalogLibrary) -> Self {
        self.analogs = Some(analogs);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: PolicyTable) -> Self {
        self.policy = policy;
        self
    }

    /// Validate everything and pre-embed anchors or analogs
    pub async fn build(self) -> Result<MacroAnalyzer> {
        let Self {
            provider,
            config,
            registry,
            analogs,
            policy,
        } = self;

        config.validate()?;
        policy.validate()?;

        let registry = match registry {
            Some(r) => r,
            None => ArchetypeRegistry::builtin()?,
        };
        if config.severity == SeveritySource::RiskProfile {
            registry.require_risk_profiles()?;
        }

        let engine = RebalancingEngine::new(config.amplification)?;
        let formula = SeverityFormula::select(config.classifier, config.severity);

        let classifier = match config.classifier {
            ClassifierKind::Similarity => EventClassifier::Similarity(
                SimilarityClassifier::build(&registry, provider.as_ref(), config.tie_epsilon).await?,
            ),
            ClassifierKind::RuleBased => EventClassifier::RuleBased(RuleClassifier::new(&registry)?),
            ClassifierKind::AnalogWeighted => {
                let library = match analogs {
                    Some(l) => l,
                    None => AnalogLibrary::builtin(&registry)?,
                };
                EventClassifier::AnalogWeighted(
                    AnalogClassifier::build(
                        &library,
                        &registry,
                        provider.as_ref(),
                        config.top_k,
                        config.tie_epsilon,
                    )
                    .await?,
                )
            }
        };

        tracing::info!(
            "Macro analyzer ready: {:?} classifier, {:?} severity, {} provider",
            config.classifier,
            formula,
            provider.info().name
        );

        Ok(MacroAnalyzer {
            provider,
            registry,
            classifier,
            formula,
            policy,
            engine,
            config,
        })
    }
}

/// Immutable analysis pipeline
pub struct MacroAnalyzer {
    provider: Arc<dyn EmbeddingProvider>,
    registry: ArchetypeRegistry,
    classifier: EventClassifier,
    formula: SeverityFormula,
    policy: PolicyTable,
    engine: RebalancingEngine,
    config: AnalyzerConfig,
}

impl MacroAnalyzer {
    pub fn builder(provider: Arc<dyn EmbeddingProvider>) -> AnalyzerBuilder {
        AnalyzerBuilder {
            provider,
            config: AnalyzerConfig::default(),
            registry: None,
            analogs: None,
            policy: PolicyTable::default(),
        }
    }

    pub const fn registry(&self) -> &ArchetypeRegistry {
        &self.registry
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub const fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    fn validate(&self, request: &AnalysisRequest) -> Result<()> {
        if request.headline.trim().is_empty() {
            return Err(MacroError::validation("headline must not be empty"));
        }
        request.weights.validate(self.config.weight_scale)?;
        if request.capital <= Decimal::ZERO {
            return Err(MacroError::validation(format!(
                "capital must be positive, got {}",
                request.capital
            )));
        }
        Ok(())
    }

    /// `share / total * capital`, rounded to cents
    fn allocate(&self, weights: &PortfolioWeights, capital: Decimal) -> Result<BTreeMap<Asset, Decimal>> {
        let total = self.config.weight_scale.total();
        weights
            .iter()
            .map(|(asset, weight)| {
                let share = Decimal::try_from(weight / total).map_err(|e| {
                    MacroError::validation(format!("weight for {asset} not representable: {e}"))
                })?;
                Ok((asset, (capital * share).round_dp(2)))
            })
            .collect()
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        self.validate(request)?;

        let classification = self.classifier.classify(&request.headline, self.provider.as_ref()).await?;
        let severity = self.formula.score(&classification)?;
        let decision = self.policy.decide(
            severity,
            request.horizon,
            classification.is_noise(),
            self.config.trigger_mode,
        );

        let rebalance = if decision.triggered {
            self.engine.rebalance(
                &request.weights,
                &classification.archetype,
                RebalanceInputs {
                    severity,
                    decay_factor: decision.decay_factor,
                    risk_scale: self.policy.risk_scale(request.risk_tolerance),
                },
            )?
        } else {
            RebalanceResult::identity(&request.weights)
        };

        let explanation = explain::assemble(&classification.archetype, &decision, request.horizon);
        let capital_per_asset = self.allocate(&rebalance.new_weights, request.capital)?;

        Ok(AnalysisReport {
            id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            headline: request.headline.clone(),
            classifier: self.classifier.kind(),
            archetype: classification.archetype.name.clone(),
            severity,
            effective_impact: decision.effective_impact,
            trigger_threshold: decision.threshold,
            triggered: rebalance.triggered,
            axis_scores: classification.axis_scores,
            horizon: request.horizon,
            risk_tolerance: request.risk_tolerance,
            base_weights: request.weights.clone(),
            new_weights: rebalance.new_weights,
            adjustments: rebalance.adjustments,
            capital_per_asset,
            explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use macro_core::{Embedding, ErrorKind, HashEmbedder, ProviderInfo};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::registry::{CORPORATE_EARNINGS, GEOPOLITICAL_SHOCK, LOCAL_NOISE};

    /// Hash embedder that counts calls and can be told to fail
    #[derive(Default)]
    struct CountingEmbedder {
        inner: HashEmbedder,
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl CountingEmbedder {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        fn info(&self) -> ProviderInfo {
            self.inner.info()
        }

        async fn embed(&self, text: &str) -> Result<Embedding> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(MacroError::RetrievalTimeout { after_ms: 10 });
            }
            self.inner.embed(text).await
        }
    }

    fn request(headline: &str) -> AnalysisRequest {
        AnalysisRequest {
            headline: headline.into(),
            weights: PortfolioWeights::new([
                (Asset::Equities, 40.0),
                (Asset::Bonds, 30.0),
                (Asset::Gold, 10.0),
                (Asset::Crypto, 5.0),
                (Asset::Commodities, 10.0),
                (Asset::Etfs, 5.0),
            ]),
            horizon: Horizon::Short,
            risk_tolerance: RiskTolerance::Medium,
            capital: dec!(10000),
        }
    }

    async fn analyzer(kind: ClassifierKind) -> (Arc<CountingEmbedder>, MacroAnalyzer) {
        let provider = Arc::new(CountingEmbedder::default());
        let analyzer = MacroAnalyzer::builder(provider.clone())
            .config(AnalyzerConfig {
                classifier: kind,
                ..Default::default()
            })
            .build()
            .await
            .unwrap();
        (provider, analyzer)
    }

    #[tokio::test]
    async fn test_empty_headline_rejected_before_embedding() {
        for kind in [ClassifierKind::Similarity, ClassifierKind::AnalogWeighted] {
            let (provider, analyzer) = analyzer(kind).await;
            let before = provider.calls();

            for headline in ["", "   ", "\n\t"] {
                let err = analyzer.analyze(&request(headline)).await.unwrap_err();
                assert_eq!(err.kind(), ErrorKind::Validation);
            }
            assert_eq!(provider.calls(), before);
        }
    }

    #[tokio::test]
    async fn test_one_embed_per_analysis() {
        for (kind, expected) in [
            (ClassifierKind::Similarity, 1),
            (ClassifierKind::AnalogWeighted, 1),
            (ClassifierKind::RuleBased, 0),
        ] {
            let (provider, analyzer) = analyzer(kind).await;
            let before = provider.calls();
            analyzer.analyze(&request("Oil prices surge after strikes")).await.unwrap();
            assert_eq!(provider.calls() - before, expected, "{kind:?}");
        }
    }

    #[tokio::test]
    async fn test_rule_based_war_headline() {
        let (_, analyzer) = analyzer(ClassifierKind::RuleBased).await;
        let report = analyzer
            .analyze(&request("Military invasion sparks war fears"))
            .await
            .unwrap();

        assert_eq!(report.archetype, GEOPOLITICAL_SHOCK);
        let axes = report.axis_scores.unwrap();
        assert!((axes.geopolitical - 3.0).abs() < f64::EPSILON);
        assert!((report.new_weights.total() - 100.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_rule_based_earnings_headline() {
        let (_, analyzer) = analyzer(ClassifierKind::RuleBased).await;
        let report = analyzer.analyze(&request("Q3 earnings beat expectations")).await.unwrap();

        assert_eq!(report.archetype, CORPORATE_EARNINGS);
        assert!(report.effective_impact >= 0.0);
        assert!(analyzer.registry().get(CORPORATE_EARNINGS).unwrap().beta(Asset::Equities) > 0.0);
    }

    #[tokio::test]
    async fn test_below_threshold_event_keeps_weights() {
        let (_, analyzer) = analyzer(ClassifierKind::RuleBased).await;
        let req = request("Q3 earnings beat expectations");
        let report = analyzer.analyze(&req).await.unwrap();

        // Economic 1/3 and transmission 1/3 give severity 0.15, under the short 0.30
        assert_eq!(report.archetype, CORPORATE_EARNINGS);
        assert!(report.effective_impact < report.trigger_threshold);
        assert!(!report.triggered);
        assert_eq!(report.new_weights, req.weights);
        assert!(report.adjustments.values().all(|a| *a == 0.0));
        assert_eq!(report.capital_per_asset[&Asset::Equities], dec!(4000));
    }

    #[tokio::test]
    async fn test_long_horizon_decay_suppresses_trigger() {
        let headline = "War and tariffs deepen oil crisis";
        let mut req = request(headline);
        req.horizon = Horizon::Long;

        let (_, analyzer) = analyzer(ClassifierKind::RuleBased).await;
        let report = analyzer.analyze(&req).await.unwrap();

        // Every axis at 3: severity 1.0, decayed to 0.6 against the long 0.65
        assert_eq!(report.archetype, GEOPOLITICAL_SHOCK);
        assert!((report.severity.value() - 1.0).abs() < 1e-9);
        assert!((report.effective_impact - 0.6).abs() < 1e-9);
        assert!(!report.triggered);
        assert_eq!(report.new_weights, req.weights);
        assert!(report.adjustments.values().all(|a| *a == 0.0));

        let raw = MacroAnalyzer::builder(Arc::new(HashEmbedder::default()))
            .config(AnalyzerConfig {
                classifier: ClassifierKind::RuleBased,
                trigger_mode: crate::policy::TriggerMode::Raw,
                ..Default::default()
            })
            .build()
            .await
            .unwrap();
        let undecayed = raw.analyze(&req).await.unwrap();
        assert!(undecayed.triggered);
        assert_ne!(undecayed.new_weights, req.weights);
    }

    #[tokio::test]
    async fn test_noise_is_identity() {
        let (_, analyzer) = analyzer(ClassifierKind::RuleBased).await;
        let req = request("Celebrity opens a bakery");
        let report = analyzer.analyze(&req).await.unwrap();

        assert_eq!(report.archetype, LOCAL_NOISE);
        assert!(!report.triggered);
        assert_eq!(report.new_weights, req.weights);
        assert!(report.adjustments.values().all(|a| *a == 0.0));
        assert_eq!(report.capital_per_asset[&Asset::Equities], dec!(4000));
        assert_eq!(report.capital_per_asset[&Asset::Etfs], dec!(500));
    }

    #[tokio::test]
    async fn test_capital_follows_new_weights() {
        let (_, analyzer) = analyzer(ClassifierKind::RuleBased).await;
        let report = analyzer
            .analyze(&request("Banking crisis deepens as markets crash"))
            .await
            .unwrap();

        assert!(report.triggered);
        let allocated: Decimal = report.capital_per_asset.values().copied().sum();
        assert!((allocated - dec!(10000)).abs() <= dec!(0.05));
        assert!(report.capital_per_asset.values().all(|c| *c >= Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_deterministic_with_local_embedder() {
        let (_, analyzer) = analyzer(ClassifierKind::Similarity).await;
        let a = analyzer.analyze(&request("Central bank surprises with rate hike")).await.unwrap();
        let b = analyzer.analyze(&request("Central bank surprises with rate hike")).await.unwrap();

        assert_eq!(a.archetype, b.archetype);
        assert_eq!(a.severity, b.severity);
        assert_eq!(a.new_weights, b.new_weights);
        assert_eq!(a.explanation, b.explanation);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_invalid_weights_and_capital() {
        let (_, analyzer) = analyzer(ClassifierKind::RuleBased).await;

        let mut bad_weights = request("War breaks out");
        bad_weights.weights = PortfolioWeights::new([(Asset::Equities, 90.0)]);
        assert_eq!(
            analyzer.analyze(&bad_weights).await.unwrap_err().kind(),
            ErrorKind::Validation
        );

        let mut no_capital = request("War breaks out");
        no_capital.capital = Decimal::ZERO;
        assert_eq!(
            analyzer.analyze(&no_capital).await.unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[tokio::test]
    async fn test_retrieval_failure_propagates() {
        let (provider, analyzer) = analyzer(ClassifierKind::Similarity).await;
        provider.failing.store(true, Ordering::SeqCst);

        let err = analyzer.analyze(&request("Oil tanker seized")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Retrieval);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_risk_profile_needs_profiles() {
        let mut table = crate::registry::builtin_archetypes();
        for archetype in &mut table {
            archetype.risk_profile = None;
        }
        let result = MacroAnalyzer::builder(Arc::new(HashEmbedder::default()))
            .registry(ArchetypeRegistry::new(table).unwrap())
            .config(AnalyzerConfig {
                severity: SeveritySource::RiskProfile,
                ..Default::default()
            })
            .build()
            .await;

        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Configuration));
    }

    #[tokio::test]
    async fn test_risk_profile_severity_ignores_wording() {
        let analyzer = MacroAnalyzer::builder(Arc::new(HashEmbedder::default()))
            .config(AnalyzerConfig {
                classifier: ClassifierKind::RuleBased,
                severity: SeveritySource::RiskProfile,
                ..Default::default()
            })
            .build()
            .await
            .unwrap();

        let a = analyzer.analyze(&request("War breaks out")).await.unwrap();
        let b = analyzer.analyze(&request("Troops mass at border amid war")).await.unwrap();
        assert_eq!(a.archetype, b.archetype);
        assert_eq!(a.severity, b.severity);
    }
}
