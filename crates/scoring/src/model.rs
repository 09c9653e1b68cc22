//! Linear scoring models and the calibration shared by every model
//!
//! A model is a list of features and a matching weight vector. Everything
//! applied after the dot product (intent bonus, boost, normalization curve,
//! confidence and tier) lives in `Calibration` so the scalar path and the
//! batch matrix path finish a score with exactly the same code.

use lead_intel_config::{
    ConditionMode, ConfidenceConfig, FeatureWeight, IntentBonusConfig, NormalizationConfig,
    ScoringConfig, TierConfig,
};
use lead_intel_core::{
    ConversationTurn, FactorContribution, Feature, LeadRecord, ScoringError, SegmentSignals,
    SignalName, SignalVector, Tier,
};

/// Round to 4 decimal places
#[inline]
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone)]
pub struct LinearModel {
    label: String,
    features: Vec<Feature>,
    weights: Vec<f64>,
}

impl LinearModel {
    pub fn new(label: impl Into<String>, weights: &[FeatureWeight]) -> Self {
        Self {
            label: label.into(),
            features: weights.iter().map(|w| w.feature).collect(),
            weights: weights.iter().map(|w| w.weight).collect(),
        }
    }

    /// Model version label, e.g. `base-v2.1`
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Feature values in weight order
    pub fn feature_row(&self, signals: &SignalVector, segment: &SegmentSignals) -> Vec<f64> {
        self.features
            .iter()
            .map(|f| f.read(signals, segment))
            .collect()
    }

    pub fn dot(&self, row: &[f64]) -> Result<f64, ScoringError> {
        if row.len() != self.weights.len() {
            return Err(ScoringError::ShapeMismatch {
                weights: self.weights.len(),
                features: row.len(),
            });
        }
        Ok(row.iter().zip(&self.weights).map(|(x, w)| x * w).sum())
    }

    pub fn contributions(&self, row: &[f64]) -> Vec<FactorContribution> {
        self.features
            .iter()
            .zip(&self.weights)
            .zip(row)
            .map(|((feature, weight), value)| FactorContribution {
                feature: feature.as_str().to_string(),
                value: *value,
                weight: *weight,
                contribution: value * weight,
            })
            .collect()
    }
}

/// Post-dot-product calibration
#[derive(Debug, Clone)]
pub struct Calibration {
    intent_bonus: IntentBonusConfig,
    normalization: NormalizationConfig,
    confidence: ConfidenceConfig,
    tiers: TierConfig,
    max_boost: f64,
}

impl Calibration {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            intent_bonus: config.intent_bonus.clone(),
            normalization: config.normalization.clone(),
            confidence: config.confidence.clone(),
            tiers: config.tiers.clone(),
            max_boost: config.max_boost,
        }
    }

    pub fn max_boost(&self) -> f64 {
        self.max_boost
    }

    /// Sum of matching bonus rules, damped by objections and capped
    pub fn intent_bonus(&self, signals: &SignalVector) -> f64 {
        let config = &self.intent_bonus;
        let total: f64 = config
            .rules
            .iter()
            .filter(|rule| {
                let mut met = rule.conditions.iter().map(|c| signals.get(c.signal) >= c.min);
                match rule.mode {
                    ConditionMode::All => met.all(|m| m),
                    ConditionMode::Any => met.any(|m| m),
                }
            })
            .map(|rule| rule.bonus)
            .sum();
        let damping = 1.0 - config.objection_damping * signals.get(SignalName::ObjectionIntensity);
        (total * damping).clamp(0.0, config.cap)
    }

    /// Piecewise-linear raw → [0, 100], rounded to 4 decimals
    pub fn normalize(&self, raw: f64) -> f64 {
        let knots = &self.normalization.knots;
        let (first, last) = match (knots.first(), knots.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return round4(raw.clamp(0.0, 1.0) * 100.0),
        };
        if let Some(k) = knots.iter().find(|k| k.raw == raw) {
            return k.score;
        }
        if raw <= first.raw {
            return first.score;
        }
        if raw >= last.raw {
            return last.score;
        }
        for pair in knots.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if raw < hi.raw {
                let t = (raw - lo.raw) / (hi.raw - lo.raw);
                return round4(lo.score + t * (hi.score - lo.score));
            }
        }
        last.score
    }

    /// Fraction of the expected inputs that are present
    pub fn completeness(&self, lead: &LeadRecord, conversation: &[ConversationTurn]) -> f64 {
        let e = &lead.engagement;
        let present = [
            lead.budget.is_some_and(|b| b > 0.0),
            lead.source.is_some(),
            lead.timeline.is_some(),
            lead.financing.is_some(),
            lead.location.is_some(),
            e.emails_sent > 0,
            e.page_views > 0,
            e.last_activity_at.is_some(),
            conversation.iter().any(|t| t.is_lead()),
            lead.preferred_channel.is_some(),
        ];
        present.iter().filter(|p| **p).count() as f64 / present.len() as f64
    }

    /// How evenly the contributions are spread; 1.0 is perfectly even
    pub fn balance(&self, contributions: &[FactorContribution]) -> f64 {
        let n = contributions.len();
        let total: f64 = contributions.iter().map(|c| c.contribution).sum();
        if n <= 1 || total <= 0.0 {
            return 0.0;
        }
        let max_share = contributions
            .iter()
            .map(|c| c.contribution / total)
            .fold(0.0, f64::max);
        let even = 1.0 / n as f64;
        (1.0 - (max_share - even) / (1.0 - even)).clamp(0.0, 1.0)
    }

    pub fn confidence(&self, completeness: f64, balance: f64, degraded: bool) -> f64 {
        let c = &self.confidence;
        let mut value = c.completeness_weight * completeness + c.balance_weight * balance;
        if degraded {
            value *= c.fallback_penalty;
        }
        round4(value.clamp(c.min, c.max))
    }

    pub fn tier(&self, score: f64, confidence: f64) -> Tier {
        let bands = if confidence < self.tiers.low_confidence_below {
            &self.tiers.low_confidence
        } else {
            &self.tiers.normal
        };
        if score >= bands.hot {
            Tier::Hot
        } else if score >= bands.warm {
            Tier::Warm
        } else {
            Tier::Cold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lead_intel_config::default_base_weights;

    fn calibration() -> Calibration {
        Calibration::from_config(&ScoringConfig::default())
    }

    #[test]
    fn test_curve_knots_exact() {
        let c = calibration();
        assert_eq!(c.normalize(0.3), 25.0);
        assert_eq!(c.normalize(0.5), 50.0);
        assert_eq!(c.normalize(0.7), 70.0);
        assert_eq!(c.normalize(1.0), 100.0);
        assert_eq!(c.normalize(1.2), 100.0);
        assert_eq!(c.normalize(-0.1), 0.0);
        assert_eq!(c.normalize(0.4), 37.5);
    }

    #[test]
    fn test_curve_monotonic() {
        let c = calibration();
        let mut last = -1.0;
        for i in 0..=125 {
            let score = c.normalize(i as f64 / 100.0);
            assert!(score >= last);
            last = score;
        }
    }

    #[test]
    fn test_tier_bands_depend_on_confidence() {
        let c = calibration();
        assert_eq!(c.tier(75.0, 0.4), Tier::Warm);
        assert_eq!(c.tier(75.0, 0.8), Tier::Hot);
        assert_eq!(c.tier(55.0, 0.4), Tier::Cold);
        assert_eq!(c.tier(55.0, 0.8), Tier::Warm);
    }

    #[test]
    fn test_intent_bonus_rules() {
        let c = calibration();
        let signals = SignalVector::zeros()
            .with(SignalName::BudgetMatch, 0.9)
            .with(SignalName::TimelineUrgency, 1.0)
            .with(SignalName::CashBuyer, 1.0);
        assert!((c.intent_bonus(&signals) - 0.18).abs() < 1e-9);

        let objecting = signals.with(SignalName::ObjectionIntensity, 1.0);
        assert!((c.intent_bonus(&objecting) - 0.09).abs() < 1e-9);
    }

    #[test]
    fn test_intent_bonus_cap() {
        let c = calibration();
        let everything = SignalVector::zeros()
            .with(SignalName::BudgetMatch, 1.0)
            .with(SignalName::TimelineUrgency, 1.0)
            .with(SignalName::PreApproval, 1.0)
            .with(SignalName::UrgencyLanguage, 1.0)
            .with(SignalName::DecisionStage, 1.0);
        assert!(c.intent_bonus(&everything) <= 0.25);
    }

    #[test]
    fn test_confidence_bounds() {
        let c = calibration();
        assert_eq!(c.confidence(0.0, 0.0, false), 0.3);
        assert_eq!(c.confidence(1.0, 1.0, false), 0.95);
        assert_eq!(c.confidence(1.0, 1.0, true), 0.7);
    }

    #[test]
    fn test_balance() {
        let c = calibration();
        let model = LinearModel::new("base", &default_base_weights());
        let even: Vec<f64> = model.weights().iter().map(|w| 0.1 / w).collect();
        let contributions = model.contributions(&even);
        assert!((c.balance(&contributions) - 1.0).abs() < 1e-9);

        let zero = model.contributions(&vec![0.0; model.features().len()]);
        assert_eq!(c.balance(&zero), 0.0);
    }

    #[test]
    fn test_completeness() {
        let c = calibration();
        assert_eq!(c.completeness(&LeadRecord::new("a"), &[]), 0.0);
        let lead = LeadRecord::new("a")
            .with_budget(500_000.0)
            .with_source("referral")
            .with_timeline("immediate")
            .with_financing("cash")
            .with_location("Austin");
        let turns = vec![ConversationTurn::lead("hello", Utc::now())];
        assert_eq!(c.completeness(&lead, &turns), 0.6);
    }

    #[test]
    fn test_dot_shape_checked() {
        let model = LinearModel::new("base", &default_base_weights());
        assert!(model.dot(&[1.0, 2.0]).is_err());
        let ones = vec![1.0; model.weights().len()];
        assert!((model.dot(&ones).unwrap() - 1.0).abs() < 1e-9);
    }
}
