//! Scoring output types

use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// Lower bound of reported confidence
pub const MIN_CONFIDENCE: f64 = 0.3;
/// Upper bound of reported confidence
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Model version reported by the emergency result
pub const EMERGENCY_MODEL_VERSION: &str = "emergency-default";

/// Coarse triage bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Hot,
    Warm,
    Cold,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hot => "hot",
            Tier::Warm => "warm",
            Tier::Cold => "cold",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted input of a composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub feature: String,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Result of scoring one lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Normalized score in [0, 100]
    pub score: f64,
    /// Confidence in [0.3, 0.95]
    pub confidence: f64,
    pub tier: Tier,
    pub segment: Segment,
    pub breakdown: Vec<FactorContribution>,
    /// Weighted sum before normalization, including bonus and boost
    pub raw_score: f64,
    pub intent_bonus: f64,
    pub boost: f64,
    pub model_version: String,
    pub cache_hit: bool,
    pub latency_ms: f64,
    pub fingerprint: String,
}

impl ScoreResult {
    /// Fixed result used when no model can run
    pub fn emergency(fingerprint: impl Into<String>) -> Self {
        Self {
            score: 25.0,
            confidence: MIN_CONFIDENCE,
            tier: Tier::Cold,
            segment: Segment::General,
            breakdown: Vec::new(),
            raw_score: 0.3,
            intent_bonus: 0.0,
            boost: 1.0,
            model_version: EMERGENCY_MODEL_VERSION.to_string(),
            cache_hit: false,
            latency_ms: 0.0,
            fingerprint: fingerprint.into(),
        }
    }

    pub fn is_emergency(&self) -> bool {
        self.model_version == EMERGENCY_MODEL_VERSION
    }

    /// Compare everything except timing and cache flag
    pub fn same_decision(&self, other: &ScoreResult) -> bool {
        self.score == other.score
            && self.confidence == other.confidence
            && self.tier == other.tier
            && self.segment == other.segment
            && self.breakdown == other.breakdown
            && self.model_version == other.model_version
            && self.fingerprint == other.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emergency_result_shape() {
        let r = ScoreResult::emergency("fp");
        assert!(r.is_emergency());
        assert_eq!(r.tier, Tier::Cold);
        assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&r.confidence));
    }

    #[test]
    fn test_tier_serde() {
        assert_eq!(serde_json::to_string(&Tier::Hot).unwrap(), "\"hot\"");
    }
}
