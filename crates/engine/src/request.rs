//! Request and response types of the inference engine

use lead_intel_config::BatchSettings;
use lead_intel_core::{
    request_fingerprint, ConversationTurn, LeadPriority, LeadRecord, RoutingRecommendation,
    RoutingStrategy, ScoreResult, SignalVector, Stage,
};
use serde::{Deserialize, Serialize};

/// Latency class of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMode {
    /// Single lead, cache-backed, under the pipeline budget
    #[default]
    RealTime,
    BatchFast,
    BatchBulk,
    /// No latency budget; used for cache pre-warming
    Background,
}

impl InferenceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferenceMode::RealTime => "real_time",
            InferenceMode::BatchFast => "batch_fast",
            InferenceMode::BatchBulk => "batch_bulk",
            InferenceMode::Background => "background",
        }
    }

    /// Leads processed per chunk
    pub fn chunk_size(&self, batch: &BatchSettings) -> usize {
        match self {
            InferenceMode::RealTime => 1,
            InferenceMode::BatchFast => batch.fast_max_leads,
            InferenceMode::BatchBulk | InferenceMode::Background => batch.bulk_max_leads,
        }
    }

    pub fn workers(&self, batch: &BatchSettings) -> usize {
        match self {
            InferenceMode::RealTime => 1,
            InferenceMode::BatchFast => batch.fast_workers,
            InferenceMode::BatchBulk => batch.bulk_workers,
            InferenceMode::Background => batch.background_workers,
        }
    }
}

impl std::fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lead to score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub lead: LeadRecord,
    #[serde(default)]
    pub conversation: Vec<ConversationTurn>,
}

impl ScoreRequest {
    pub fn new(lead: LeadRecord, conversation: Vec<ConversationTurn>) -> Self {
        Self { lead, conversation }
    }

    pub fn fingerprint(&self) -> String {
        request_fingerprint(&self.lead, &self.conversation)
    }
}

/// A stage that did not complete normally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degradation {
    pub stage: Stage,
    pub cause: String,
}

/// Score, signals and routing for one lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceOutcome {
    pub lead_id: String,
    pub fingerprint: String,
    pub score: ScoreResult,
    pub signals: SignalVector,
    pub routing: RoutingRecommendation,
    #[serde(default)]
    pub degradations: Vec<Degradation>,
}

impl InferenceOutcome {
    /// Fixed outcome used when nothing else could run
    pub fn emergency(lead_id: &str, fingerprint: &str, stage: Stage, cause: impl Into<String>) -> Self {
        let cause = cause.into();
        Self {
            lead_id: lead_id.to_string(),
            fingerprint: fingerprint.to_string(),
            score: ScoreResult::emergency(fingerprint),
            signals: SignalVector::fallback(),
            routing: RoutingRecommendation::fallback(
                LeadPriority::Low,
                RoutingStrategy::default(),
                240,
                cause.clone(),
            ),
            degradations: vec![Degradation { stage, cause }],
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_sizes() {
        let batch = BatchSettings::default();
        assert_eq!(InferenceMode::BatchFast.chunk_size(&batch), 10);
        assert_eq!(InferenceMode::BatchBulk.chunk_size(&batch), 100);
        assert_eq!(InferenceMode::BatchBulk.workers(&batch), 10);
        assert_eq!(InferenceMode::Background.workers(&batch), 4);
    }

    #[test]
    fn test_outcome_serde() {
        let outcome = InferenceOutcome::emergency("l1", "fp", Stage::Pipeline, "timeout");
        let bytes = serde_json::to_vec(&outcome).unwrap();
        let back: InferenceOutcome = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, outcome);
        assert!(back.score.is_emergency());
        assert!(back.is_degraded());
    }
}
