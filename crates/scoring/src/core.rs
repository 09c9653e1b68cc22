//! Scoring core
//!
//! Resolves which model applies to a lead, builds its feature row and turns
//! a dot product into a `ScoreResult`. The scoring flow is split into
//! `prepare` and `finish` so the batch engine can replace the per-lead dot
//! product with one matrix product per model while sharing everything else.

use lead_intel_config::{BoostRule, ScoringConfig};
use lead_intel_core::{
    ConversationTurn, LeadRecord, Outcome, ScoreResult, ScoringError, Segment,
    SegmentSignals, SignalVector, Stage,
};
use std::collections::HashMap;

use crate::model::{Calibration, LinearModel};
use crate::segment_signals::SegmentSignalExtractor;
use crate::BuildError;

/// Which model a prepared row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKey {
    Base,
    Segment(Segment),
}

#[derive(Debug, Clone)]
struct SegmentModel {
    model: LinearModel,
    boost: Option<BoostRule>,
}

/// Everything needed to finish a score once the dot product is known
#[derive(Debug, Clone)]
pub struct PreparedScore {
    pub segment: Segment,
    pub model_key: ModelKey,
    pub model_version: String,
    pub row: Vec<f64>,
    pub signals: SignalVector,
    pub segment_signals: SegmentSignals,
    pub completeness: f64,
    /// Confidence takes the fallback penalty
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct ScoringCore {
    base: LinearModel,
    fallback_version: String,
    segments: HashMap<Segment, SegmentModel>,
    segment_signals: SegmentSignalExtractor,
    calibration: Calibration,
}

impl ScoringCore {
    pub fn new(config: &ScoringConfig) -> Result<Self, BuildError> {
        let base_version = config.base_version();
        let segments = config
            .segment_models
            .iter()
            .map(|(segment, variant)| {
                let label = format!("{}-v{}", segment, variant.version);
                (
                    *segment,
                    SegmentModel {
                        model: LinearModel::new(label, &variant.weights),
                        boost: variant.boost.clone(),
                    },
                )
            })
            .collect();

        Ok(Self {
            base: LinearModel::new(base_version.clone(), &config.base_weights),
            fallback_version: format!("{}+fallback", base_version),
            segments,
            segment_signals: SegmentSignalExtractor::new(&config.segment_signals)?,
            calibration: Calibration::from_config(config),
        })
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn base_model(&self) -> &LinearModel {
        &self.base
    }

    /// Model for a key; unknown segment keys resolve to the base model
    pub fn model(&self, key: ModelKey) -> &LinearModel {
        match key {
            ModelKey::Base => &self.base,
            ModelKey::Segment(segment) => self
                .segments
                .get(&segment)
                .map(|s| &s.model)
                .unwrap_or(&self.base),
        }
    }

    /// Resolve the model and build its feature row.
    ///
    /// `upstream_degraded` marks inputs that were already defaulted, which
    /// forces the fallback version and confidence penalty.
    pub fn prepare(
        &self,
        lead: &LeadRecord,
        conversation: &[ConversationTurn],
        signals: &SignalVector,
        segment: Segment,
        upstream_degraded: bool,
    ) -> Outcome<PreparedScore> {
        let completeness = self.calibration.completeness(lead, conversation);
        let base_prepared = |degraded: bool| PreparedScore {
            segment,
            model_key: ModelKey::Base,
            model_version: if degraded {
                self.fallback_version.clone()
            } else {
                self.base.label().to_string()
            },
            row: self.base.feature_row(signals, &SegmentSignals::default()),
            signals: signals.clone(),
            segment_signals: SegmentSignals::default(),
            completeness,
            degraded,
        };

        let Some(variant) = self.segments.get(&segment) else {
            return Outcome::Complete(base_prepared(upstream_degraded));
        };

        match self
            .segment_signals
            .extract(lead, conversation, signals, segment)
        {
            Ok(segment_signals) => Outcome::Complete(PreparedScore {
                segment,
                model_key: ModelKey::Segment(segment),
                model_version: if upstream_degraded {
                    self.fallback_version.clone()
                } else {
                    variant.model.label().to_string()
                },
                row: variant.model.feature_row(signals, &segment_signals),
                signals: signals.clone(),
                segment_signals,
                completeness,
                degraded: upstream_degraded,
            }),
            Err(e) => {
                tracing::warn!(
                    lead_id = %lead.id,
                    segment = %segment,
                    error = %e,
                    "Segment model failed, falling back to base model"
                );
                let cause = ScoringError::SegmentModel {
                    segment: segment.to_string(),
                    message: e.to_string(),
                };
                Outcome::degraded(base_prepared(true), Stage::Scoring, cause.to_string())
            },
        }
    }

    /// Apply bonus, boost, curve, confidence and tier to a dot product
    pub fn finish(&self, prepared: &PreparedScore, dot: f64) -> Result<ScoreResult, ScoringError> {
        if !dot.is_finite() {
            return Err(ScoringError::NonFiniteScore {
                model: self.model(prepared.model_key).label().to_string(),
            });
        }

        let bonus = self.calibration.intent_bonus(&prepared.signals);
        let boost = self.boost(prepared);
        let raw = (dot + bonus) * boost;
        let score = self.calibration.normalize(raw);
        Ok(self.assemble(prepared, score, raw, bonus, boost))
    }

    /// Build the result once the curve has been applied
    pub fn assemble(
        &self,
        prepared: &PreparedScore,
        score: f64,
        raw: f64,
        bonus: f64,
        boost: f64,
    ) -> ScoreResult {
        let breakdown = self.model(prepared.model_key).contributions(&prepared.row);
        let balance = self.calibration.balance(&breakdown);
        let confidence = self
            .calibration
            .confidence(prepared.completeness, balance, prepared.degraded);
        let tier = self.calibration.tier(score, confidence);

        ScoreResult {
            score,
            confidence,
            tier,
            segment: prepared.segment,
            breakdown,
            raw_score: raw,
            intent_bonus: bonus,
            boost,
            model_version: prepared.model_version.clone(),
            cache_hit: false,
            latency_ms: 0.0,
            fingerprint: String::new(),
        }
    }

    /// Segment multiplier, capped, or 1.0 when the rule does not fire
    pub fn boost(&self, prepared: &PreparedScore) -> f64 {
        let ModelKey::Segment(segment) = prepared.model_key else {
            return 1.0;
        };
        let Some(rule) = self.segments.get(&segment).and_then(|s| s.boost.as_ref()) else {
            return 1.0;
        };
        let value = rule
            .feature
            .read(&prepared.signals, &prepared.segment_signals);
        if value >= rule.threshold {
            rule.multiplier.min(self.calibration.max_boost())
        } else {
            1.0
        }
    }

    /// Score one lead end to end on the scalar path
    pub fn score(
        &self,
        lead: &LeadRecord,
        conversation: &[ConversationTurn],
        signals: &SignalVector,
        segment: Segment,
        upstream_degraded: bool,
    ) -> Outcome<ScoreResult> {
        let prepared = self.prepare(lead, conversation, signals, segment, upstream_degraded);
        let degradation = prepared
            .degradation()
            .map(|(stage, cause)| (stage, cause.to_string()));
        let prepared = prepared.into_value();

        let finished = self
            .model(prepared.model_key)
            .dot(&prepared.row)
            .and_then(|dot| self.finish(&prepared, dot));

        match (finished, degradation) {
            (Ok(result), None) => Outcome::Complete(result),
            (Ok(result), Some((stage, cause))) => Outcome::degraded(result, stage, cause),
            (Err(e), _) => {
                tracing::error!(lead_id = %lead.id, error = %e, "Scoring failed, using emergency result");
                Outcome::degraded(ScoreResult::emergency(""), Stage::Scoring, e.to_string())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_intel_core::SignalName;

    fn core() -> ScoringCore {
        ScoringCore::new(&ScoringConfig::default()).unwrap()
    }

    fn lead() -> LeadRecord {
        LeadRecord::new("lead-1")
            .with_budget(600_000.0)
            .with_source("referral")
            .with_timeline("immediate")
            .with_financing("pre_approved")
            .with_location("Austin, TX")
    }

    #[test]
    fn test_score_bounds() {
        let c = core();
        for signals in [SignalVector::zeros(), SignalVector::neutral(), SignalVector::fallback()] {
            let r = c.score(&lead(), &[], &signals, Segment::General, false).into_value();
            assert!((0.0..=100.0).contains(&r.score));
            assert!((0.3..=0.95).contains(&r.confidence));
        }
        let all_ones = SignalName::ALL
            .iter()
            .fold(SignalVector::zeros(), |v, n| v.with(*n, 1.0));
        let r = c.score(&lead(), &[], &all_ones, Segment::General, false).into_value();
        assert_eq!(r.score, 100.0);
    }

    #[test]
    fn test_base_version_for_general() {
        let r = core()
            .score(&lead(), &[], &SignalVector::neutral(), Segment::General, false)
            .into_value();
        assert_eq!(r.model_version, "base-v2.1");
        assert_eq!(r.breakdown.len(), 8);
    }

    #[test]
    fn test_segment_version_and_boost() {
        let signals = SignalVector::neutral();
        let lead = lead().with_employer("Microsoft");
        let r = core()
            .score(&lead, &[], &signals, Segment::TechHub, false)
            .into_value();
        assert_eq!(r.model_version, "tech_hub-v1.0");
        assert_eq!(r.boost, 1.05);
    }

    #[test]
    fn test_segment_failure_falls_back_to_base() {
        let lead = lead().with_budget(f64::NAN);
        let outcome = core().score(&lead, &[], &SignalVector::neutral(), Segment::Luxury, false);
        assert!(outcome.is_degraded());
        let r = outcome.into_value();
        assert_eq!(r.model_version, "base-v2.1+fallback");
        assert_eq!(r.segment, Segment::Luxury);
    }

    #[test]
    fn test_missing_variant_is_complete() {
        let mut config = ScoringConfig::default();
        config.segment_models.remove(&Segment::Luxury);
        let c = ScoringCore::new(&config).unwrap();
        let outcome = c.score(&lead(), &[], &SignalVector::neutral(), Segment::Luxury, false);
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.value().model_version, "base-v2.1");
    }

    #[test]
    fn test_raw_score_monotonic_in_budget_match() {
        let c = core();
        let mut last = f64::MIN;
        for step in 3..=9 {
            let signals = SignalVector::neutral().with(SignalName::BudgetMatch, step as f64 / 10.0);
            let r = c.score(&lead(), &[], &signals, Segment::General, false).into_value();
            assert!(r.raw_score >= last);
            last = r.raw_score;
        }
    }

    #[test]
    fn test_degraded_penalty() {
        let c = core();
        let clean = c
            .score(&lead(), &[], &SignalVector::neutral(), Segment::General, false)
            .into_value();
        let degraded = c
            .score(&lead(), &[], &SignalVector::neutral(), Segment::General, true)
            .into_value();
        assert!(degraded.confidence < clean.confidence);
        assert_eq!(degraded.model_version, "base-v2.1+fallback");
        assert_eq!(degraded.score, clean.score);
    }

    #[test]
    fn test_prepare_finish_matches_score() {
        let c = core();
        let signals = SignalVector::neutral().with(SignalName::CashBuyer, 1.0);
        let prepared = c
            .prepare(&lead(), &[], &signals, Segment::Military, false)
            .into_value();
        let dot = c.model(prepared.model_key).dot(&prepared.row).unwrap();
        let split = c.finish(&prepared, dot).unwrap();
        let whole = c
            .score(&lead(), &[], &signals, Segment::Military, false)
            .into_value();
        assert!(split.same_decision(&whole));
        assert_eq!(split.model_version, "military-v1.0");
    }
}
