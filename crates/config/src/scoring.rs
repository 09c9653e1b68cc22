//! Scoring model configuration
//!
//! Weights, intent bonus rules, the normalization curve, confidence blend,
//! tier thresholds and segment model definitions. Loaded from a versioned
//! YAML file; compiled defaults apply for anything the file omits.

use lead_intel_core::{Feature, Segment, SegmentSignal, SignalName};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::constants::model;
use crate::extraction::ExtractionConfig;
use crate::segments::SegmentRulesConfig;
use crate::ConfigError;

/// One model weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: Feature,
    pub weight: f64,
}

impl FeatureWeight {
    pub fn new(feature: Feature, weight: f64) -> Self {
        Self { feature, weight }
    }
}

fn base(signal: SignalName, weight: f64) -> FeatureWeight {
    FeatureWeight::new(Feature::Base(signal), weight)
}

fn seg(signal: SegmentSignal, weight: f64) -> FeatureWeight {
    FeatureWeight::new(Feature::Segment(signal), weight)
}

/// How the conditions of a bonus rule combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConditionMode {
    #[default]
    All,
    Any,
}

/// `signal >= min`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalCondition {
    pub signal: SignalName,
    pub min: f64,
}

/// Reward for a high-value combination of signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusRule {
    pub name: String,
    #[serde(default)]
    pub mode: ConditionMode,
    pub conditions: Vec<SignalCondition>,
    pub bonus: f64,
}

impl BonusRule {
    fn new(name: &str, mode: ConditionMode, conditions: &[(SignalName, f64)], bonus: f64) -> Self {
        Self {
            name: name.to_string(),
            mode,
            conditions: conditions
                .iter()
                .map(|(signal, min)| SignalCondition {
                    signal: *signal,
                    min: *min,
                })
                .collect(),
            bonus,
        }
    }
}

/// Intent bonus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentBonusConfig {
    pub cap: f64,
    /// Share of the bonus removed at full objection intensity
    pub objection_damping: f64,
    pub rules: Vec<BonusRule>,
}

impl Default for IntentBonusConfig {
    fn default() -> Self {
        use SignalName::*;
        Self {
            cap: model::INTENT_BONUS_CAP,
            objection_damping: 0.5,
            rules: vec![
                BonusRule::new(
                    "budget_and_timeline",
                    ConditionMode::All,
                    &[(BudgetMatch, 0.7), (TimelineUrgency, 0.8)],
                    0.10,
                ),
                BonusRule::new(
                    "financially_ready",
                    ConditionMode::Any,
                    &[(PreApproval, 0.5), (CashBuyer, 0.5)],
                    0.08,
                ),
                BonusRule::new(
                    "urgent_language",
                    ConditionMode::All,
                    &[(UrgencyLanguage, 0.3)],
                    0.04,
                ),
                BonusRule::new(
                    "late_stage",
                    ConditionMode::All,
                    &[(DecisionStage, 0.75)],
                    0.03,
                ),
            ],
        }
    }
}

/// Point on the normalization curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knot {
    pub raw: f64,
    pub score: f64,
}

/// Piecewise-linear raw → 0-100 mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub knots: Vec<Knot>,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            knots: [(0.0, 0.0), (0.3, 25.0), (0.5, 50.0), (0.7, 70.0), (1.0, 100.0)]
                .iter()
                .map(|(raw, score)| Knot {
                    raw: *raw,
                    score: *score,
                })
                .collect(),
        }
    }
}

/// Confidence blend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub completeness_weight: f64,
    pub balance_weight: f64,
    pub min: f64,
    pub max: f64,
    /// Multiplier applied on the degraded path
    pub fallback_penalty: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            completeness_weight: 0.6,
            balance_weight: 0.4,
            min: lead_intel_core::MIN_CONFIDENCE,
            max: lead_intel_core::MAX_CONFIDENCE,
            fallback_penalty: model::FALLBACK_CONFIDENCE_PENALTY,
        }
    }
}

/// Hot / warm cut-offs on the 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBands {
    pub hot: f64,
    pub warm: f64,
}

/// Tier thresholds that tighten when confidence is low
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    pub low_confidence_below: f64,
    pub low_confidence: TierBands,
    pub normal: TierBands,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            low_confidence_below: 0.5,
            low_confidence: TierBands {
                hot: 80.0,
                warm: 60.0,
            },
            normal: TierBands {
                hot: 70.0,
                warm: 50.0,
            },
        }
    }
}

/// Multiplicative boost applied when a feature clears a threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostRule {
    pub feature: Feature,
    pub threshold: f64,
    pub multiplier: f64,
}

/// Specialised model for one segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentModelConfig {
    #[serde(default = "default_segment_version")]
    pub version: String,
    pub weights: Vec<FeatureWeight>,
    #[serde(default)]
    pub boost: Option<BoostRule>,
}

fn default_segment_version() -> String {
    model::SEGMENT_VERSION.to_string()
}

fn default_segment_models() -> HashMap<Segment, SegmentModelConfig> {
    use SegmentSignal::*;
    use SignalName::*;

    let variant = |weights: Vec<FeatureWeight>, boost: Option<(Feature, f64, f64)>| {
        SegmentModelConfig {
            version: default_segment_version(),
            weights,
            boost: boost.map(|(feature, threshold, multiplier)| BoostRule {
                feature,
                threshold,
                multiplier,
            }),
        }
    };

    let mut models = HashMap::new();
    models.insert(
        Segment::TechHub,
        variant(
            vec![
                base(EngagementScore, 0.15),
                base(ResponseTime, 0.10),
                base(BudgetMatch, 0.15),
                base(TimelineUrgency, 0.15),
                base(DigitalEngagement, 0.10),
                seg(EmployerAffiliation, 0.15),
                seg(EquityCompensation, 0.10),
                base(SourceQuality, 0.10),
            ],
            Some((Feature::Segment(EmployerAffiliation), 0.5, 1.05)),
        ),
    );
    models.insert(
        Segment::EnergySector,
        variant(
            vec![
                base(EngagementScore, 0.15),
                base(BudgetMatch, 0.15),
                base(TimelineUrgency, 0.10),
                seg(EmployerAffiliation, 0.15),
                seg(IndustryStability, 0.15),
                seg(RelocationTimeline, 0.15),
                base(SourceQuality, 0.15),
            ],
            Some((Feature::Segment(EmployerAffiliation), 0.5, 1.05)),
        ),
    );
    models.insert(
        Segment::Military,
        variant(
            vec![
                base(EngagementScore, 0.15),
                base(TimelineUrgency, 0.10),
                seg(VaLoanEligibility, 0.25),
                seg(RelocationTimeline, 0.20),
                base(ResponseTime, 0.10),
                base(BudgetMatch, 0.10),
                base(SourceQuality, 0.10),
            ],
            Some((Feature::Segment(VaLoanEligibility), 0.5, 1.10)),
        ),
    );
    models.insert(
        Segment::Luxury,
        variant(
            vec![
                base(EngagementScore, 0.15),
                base(BudgetMatch, 0.20),
                seg(LuxuryIndicators, 0.25),
                base(CommunicationQuality, 0.15),
                base(PropertyMatchCount, 0.10),
                base(SourceQuality, 0.15),
            ],
            Some((Feature::Segment(LuxuryIndicators), 0.6, 1.08)),
        ),
    );
    models.insert(
        Segment::FirstTimeBuyer,
        variant(
            vec![
                base(EngagementScore, 0.20),
                seg(FirstTimeReadiness, 0.25),
                base(FinancingReadiness, 0.20),
                base(ResponseTime, 0.10),
                base(TimelineUrgency, 0.15),
                base(PageViews, 0.10),
            ],
            None,
        ),
    );
    models.insert(
        Segment::InvestmentFocused,
        variant(
            vec![
                seg(InvestmentIntent, 0.25),
                base(BudgetMatch, 0.15),
                base(FinancingReadiness, 0.15),
                base(TimelineUrgency, 0.15),
                base(EngagementScore, 0.15),
                base(PropertyMatchCount, 0.15),
            ],
            Some((Feature::Segment(InvestmentIntent), 0.6, 1.05)),
        ),
    );
    models
}

/// Phrase lists behind the segment-specific signals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentSignalConfig {
    pub tech_employers: Vec<String>,
    pub energy_employers: Vec<String>,
    pub va_phrases: Vec<String>,
    pub military_phrases: Vec<String>,
    pub relocation_phrases: Vec<String>,
    pub luxury_phrases: Vec<String>,
    pub luxury_budget: f64,
    pub first_time_phrases: Vec<String>,
    pub investment_phrases: Vec<String>,
    pub equity_phrases: Vec<String>,
    pub stable_phrases: Vec<String>,
    pub unstable_phrases: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SegmentSignalConfig {
    fn default() -> Self {
        Self {
            tech_employers: strings(&[
                "google", "microsoft", "apple", "amazon", "meta", "nvidia", "salesforce",
                "software", "tech company", "startup", "developer", "data scientist",
            ]),
            energy_employers: strings(&[
                "exxon", "chevron", "shell", "conocophillips", "halliburton", "bp", "oil", "gas",
                "energy", "refinery", "drilling", "petroleum",
            ]),
            va_phrases: strings(&["va loan", "va benefits", "veteran", "active duty", "gi bill"]),
            military_phrases: strings(&["military", "army", "navy", "air force", "marine", "base"]),
            relocation_phrases: strings(&[
                "pcs", "orders", "report date", "relocating", "relocation", "transfer",
                "rotation", "new assignment",
            ]),
            luxury_phrases: strings(&[
                "luxury", "waterfront", "penthouse", "gated", "wine cellar", "concierge",
                "high-end", "custom build",
            ]),
            luxury_budget: 2_000_000.0,
            first_time_phrases: strings(&[
                "first time", "first-time", "first home", "never owned", "renting",
            ]),
            investment_phrases: strings(&[
                "investment", "rental", "cash flow", "roi", "cap rate", "portfolio", "1031",
                "duplex", "multifamily", "flip",
            ]),
            equity_phrases: strings(&["rsu", "rsus", "stock options", "vesting", "ipo", "equity"]),
            stable_phrases: strings(&["permanent", "tenure", "long-term", "salaried", "senior"]),
            unstable_phrases: strings(&["contract", "layoff", "laid off", "temporary"]),
        }
    }
}

/// Complete scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub model_version: String,
    pub base_weights: Vec<FeatureWeight>,
    pub intent_bonus: IntentBonusConfig,
    pub normalization: NormalizationConfig,
    pub confidence: ConfidenceConfig,
    pub tiers: TierConfig,
    pub max_boost: f64,
    pub segment_models: HashMap<Segment, SegmentModelConfig>,
    pub segment_signals: SegmentSignalConfig,
    pub segment_rules: SegmentRulesConfig,
    pub extraction: ExtractionConfig,
}

/// Base model weights; a plain dot product over eight signals
pub fn default_base_weights() -> Vec<FeatureWeight> {
    use SignalName::*;
    vec![
        base(EngagementScore, 0.20),
        base(ResponseTime, 0.10),
        base(PageViews, 0.10),
        base(BudgetMatch, 0.15),
        base(TimelineUrgency, 0.15),
        base(PropertyMatchCount, 0.10),
        base(CommunicationQuality, 0.10),
        base(SourceQuality, 0.10),
    ]
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            model_version: model::BASE_VERSION.to_string(),
            base_weights: default_base_weights(),
            intent_bonus: IntentBonusConfig::default(),
            normalization: NormalizationConfig::default(),
            confidence: ConfidenceConfig::default(),
            tiers: TierConfig::default(),
            max_boost: model::MAX_BOOST,
            segment_models: default_segment_models(),
            segment_signals: SegmentSignalConfig::default(),
            segment_rules: SegmentRulesConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_weights(field: &str, weights: &[FeatureWeight]) -> Result<(), ConfigError> {
    if weights.is_empty() {
        return Err(invalid(field, "At least one weight is required"));
    }
    for w in weights {
        if !w.weight.is_finite() || w.weight < 0.0 {
            return Err(invalid(
                format!("{}.{}", field, w.feature),
                format!("Weight must be finite and non-negative, got {}", w.weight),
            ));
        }
    }
    let total: f64 = weights.iter().map(|w| w.weight).sum();
    if (total - 1.0).abs() > 1e-6 {
        return Err(invalid(field, format!("Weights must sum to 1.0, got {:.4}", total)));
    }
    Ok(())
}

impl ScoringConfig {
    /// Load from a YAML file and validate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::FileNotFound(format!("{}: {}", path.as_ref().display(), e))
        })?;

        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn base_version(&self) -> String {
        format!("base-v{}", self.model_version)
    }

    /// Validate weights, curve, bounds and thresholds
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_weights("base_weights", &self.base_weights)?;
        for w in &self.base_weights {
            if matches!(w.feature, Feature::Segment(_)) {
                return Err(invalid(
                    "base_weights",
                    format!("Base model cannot use segment feature '{}'", w.feature),
                ));
            }
        }

        for (segment, model) in &self.segment_models {
            let field = format!("segment_models.{}", segment);
            validate_weights(&field, &model.weights)?;
            if let Some(boost) = &model.boost {
                if !boost.multiplier.is_finite() || boost.multiplier < 1.0 {
                    return Err(invalid(
                        format!("{}.boost.multiplier", field),
                        format!("Must be at least 1.0, got {}", boost.multiplier),
                    ));
                }
            }
        }
        if !(1.0..=2.0).contains(&self.max_boost) {
            return Err(invalid(
                "max_boost",
                format!("Must be between 1.0 and 2.0, got {}", self.max_boost),
            ));
        }

        let bonus = &self.intent_bonus;
        if !(0.0..=0.5).contains(&bonus.cap) {
            return Err(invalid(
                "intent_bonus.cap",
                format!("Must be between 0.0 and 0.5, got {}", bonus.cap),
            ));
        }
        if !(0.0..=1.0).contains(&bonus.objection_damping) {
            return Err(invalid(
                "intent_bonus.objection_damping",
                format!("Must be between 0.0 and 1.0, got {}", bonus.objection_damping),
            ));
        }
        for rule in &bonus.rules {
            if rule.bonus < 0.0 || rule.conditions.is_empty() {
                return Err(invalid(
                    format!("intent_bonus.rules.{}", rule.name),
                    "Bonus must be non-negative with at least one condition",
                ));
            }
        }

        let knots = &self.normalization.knots;
        if knots.len() < 2 {
            return Err(invalid("normalization.knots", "At least two knots are required"));
        }
        for pair in knots.windows(2) {
            if pair[1].raw <= pair[0].raw || pair[1].score < pair[0].score {
                return Err(invalid(
                    "normalization.knots",
                    "Knots must be strictly increasing in raw and non-decreasing in score",
                ));
            }
        }
        if knots.iter().any(|k| !(0.0..=100.0).contains(&k.score)) {
            return Err(invalid("normalization.knots", "Scores must lie in [0, 100]"));
        }

        let conf = &self.confidence;
        if conf.min < 0.0 || conf.max > 1.0 || conf.min >= conf.max {
            return Err(invalid(
                "confidence",
                format!("Invalid bounds [{}, {}]", conf.min, conf.max),
            ));
        }
        if !(0.0..=1.0).contains(&conf.fallback_penalty) {
            return Err(invalid(
                "confidence.fallback_penalty",
                format!("Must be between 0.0 and 1.0, got {}", conf.fallback_penalty),
            ));
        }

        for (name, bands) in [
            ("tiers.low_confidence", &self.tiers.low_confidence),
            ("tiers.normal", &self.tiers.normal),
        ] {
            if bands.warm > bands.hot {
                return Err(invalid(name, "Warm threshold must not exceed hot threshold"));
            }
        }

        self.segment_rules.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_weights.len(), 8);
        assert!(!config.segment_models.contains_key(&Segment::General));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = ScoringConfig::default();
        config.base_weights[0].weight = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_knots_must_increase() {
        let mut config = ScoringConfig::default();
        config.normalization.knots.swap(1, 2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_rejects_segment_feature() {
        let mut config = ScoringConfig::default();
        config.base_weights[0].feature = Feature::Segment(SegmentSignal::VaLoanEligibility);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
model_version: "3.0"
intent_bonus:
  cap: 0.2
segment_models:
  military:
    weights:
      - {{ feature: va_loan_eligibility, weight: 0.6 }}
      - {{ feature: engagement, weight: 0.4 }}
"#
        )
        .unwrap();

        let config = ScoringConfig::load(file.path()).unwrap();
        assert_eq!(config.model_version, "3.0");
        assert_eq!(config.intent_bonus.cap, 0.2);
        assert_eq!(config.segment_models.len(), 1);
        assert_eq!(config.base_weights.len(), 8);
        assert_eq!(config.base_version(), "base-v3.0");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScoringConfig::load("/nonexistent/scoring.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
