//! Signal extraction, segment classification and lead scoring
//!
//! Everything in this crate is synchronous and deterministic. The engine
//! crate decides where it runs (inline, `spawn_blocking`, batched).

pub mod classifier;
pub mod core;
pub mod extractor;
pub mod lexicon;
pub mod model;
pub mod segment_signals;

pub use crate::core::{ModelKey, PreparedScore, ScoringCore};
pub use classifier::SegmentClassifier;
pub use extractor::SignalExtractor;
pub use lexicon::{LexiconMatcher, PhraseSet};
pub use model::{round4, Calibration, LinearModel};
pub use segment_signals::SegmentSignalExtractor;

use chrono::{DateTime, Utc};
use lead_intel_config::ScoringConfig;
use lead_intel_core::{ConversationTurn, LeadRecord, Outcome, ScoreResult};
use thiserror::Error;

/// Failure to compile a scoring configuration
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Invalid phrase pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid scoring configuration: {0}")]
    Config(String),
}

impl From<lead_intel_config::ConfigError> for BuildError {
    fn from(err: lead_intel_config::ConfigError) -> Self {
        BuildError::Config(err.to_string())
    }
}

/// Extractor, classifier and core compiled from one configuration
#[derive(Debug, Clone)]
pub struct LeadScorer {
    pub extractor: SignalExtractor,
    pub classifier: SegmentClassifier,
    pub core: ScoringCore,
}

impl LeadScorer {
    pub fn new(config: &ScoringConfig) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self {
            extractor: SignalExtractor::new(config.extraction.clone())?,
            classifier: SegmentClassifier::new(&config.segment_rules)?,
            core: ScoringCore::new(config)?,
        })
    }

    /// Extract, classify and score on the calling thread
    pub fn score(
        &self,
        lead: &LeadRecord,
        conversation: &[ConversationTurn],
        now: DateTime<Utc>,
    ) -> Outcome<ScoreResult> {
        let signals = self.extractor.extract_detailed(lead, conversation, now);
        let segment = self.classifier.classify_detailed(lead, conversation);
        let degraded = signals.is_degraded();
        let outcome = self.core.score(
            lead,
            conversation,
            signals.value(),
            *segment.value(),
            degraded,
        );

        // surface the first upstream degradation when scoring itself was clean
        match (outcome, signals.degradation(), segment.degradation()) {
            (Outcome::Complete(result), Some((stage, cause)), _)
            | (Outcome::Complete(result), None, Some((stage, cause))) => {
                Outcome::degraded(result, stage, cause)
            },
            (outcome, _, _) => outcome,
        }
    }
}
