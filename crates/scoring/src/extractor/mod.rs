//! Signal extraction
//!
//! Turns a lead and its conversation into a fixed `SignalVector`. Eight
//! independent category extractors each own a group of signals. A category
//! that fails is replaced by neutral values and logged; it never fails the
//! whole extraction. If every category fails, the documented
//! `SignalVector::fallback()` is returned instead.
//!
//! Extraction is deterministic: the caller supplies "now".

mod communication;
mod decision;
mod engagement;
mod financial;
mod lifestyle;
mod objections;
mod technical;
mod urgency;
pub mod util;

use chrono::{DateTime, Utc};
use lead_intel_config::ExtractionConfig;
use lead_intel_core::{
    lead_text, ConversationTurn, ExtractionError, LeadRecord, Outcome, SignalCategory, SignalName,
    SignalVector, Stage,
};
use std::cell::RefCell;

use crate::lexicon::{LexiconMatcher, PhraseSet};
use crate::BuildError;

pub(crate) type CategoryResult = Result<Vec<(SignalName, f64)>, ExtractionError>;

/// Per-request view shared by the category extractors
pub(crate) struct ExtractionContext<'a> {
    pub lead: &'a LeadRecord,
    pub conversation: &'a [ConversationTurn],
    pub now: DateTime<Utc>,
    /// Lowercased lead-authored text
    pub lead_text: String,
    /// Lowercased profile text followed by lead text
    pub combined_text: String,
    /// Generic lexicon scores over `combined_text`
    pub lexicon: SignalVector,
    anomalies: RefCell<Vec<String>>,
}

impl<'a> ExtractionContext<'a> {
    fn new(
        lead: &'a LeadRecord,
        conversation: &'a [ConversationTurn],
        now: DateTime<Utc>,
        lexicon: &LexiconMatcher,
    ) -> Self {
        let lead_text = lead_text(conversation);
        let combined_text = format!("{} {}", lead.profile_text(), lead_text);
        let lexicon = lexicon.score(&combined_text);
        Self {
            lead,
            conversation,
            now,
            lead_text,
            combined_text,
            lexicon,
            anomalies: RefCell::new(Vec::new()),
        }
    }

    /// Numeric extra, logging values that had to be coerced to 0
    pub fn extra(&self, key: &str) -> Option<f64> {
        let coerced = self.lead.extra(key)?;
        if coerced.anomaly {
            tracing::warn!(
                lead_id = %self.lead.id,
                key = %key,
                "Non-numeric extra attribute coerced to 0"
            );
            self.anomalies.borrow_mut().push(key.to_string());
        }
        Some(coerced.value)
    }

    pub fn lead_turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.conversation.iter().filter(|t| t.is_lead())
    }

    fn take_anomalies(&self) -> Vec<String> {
        std::mem::take(&mut *self.anomalies.borrow_mut())
    }
}

/// Deterministic signal extractor
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    config: ExtractionConfig,
    lexicon: LexiconMatcher,
    formal: PhraseSet,
    casual: PhraseSet,
    stages: Vec<(f64, PhraseSet)>,
    timeline_phrases: Vec<(f64, PhraseSet)>,
}

impl SignalExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self, BuildError> {
        let lexicon = LexiconMatcher::new(&config.lexicon)?;
        let formal = PhraseSet::new(&config.formal_phrases)?;
        let casual = PhraseSet::new(&config.casual_phrases)?;
        let stages = config
            .decision_stages
            .iter()
            .map(|s| Ok((s.value, PhraseSet::new(&s.phrases)?)))
            .collect::<Result<Vec<_>, BuildError>>()?;
        let timeline_phrases = config
            .timeline_phrases
            .iter()
            .map(|p| Ok((p.value, PhraseSet::new(&[p.phrase.as_str()])?)))
            .collect::<Result<Vec<_>, BuildError>>()?;

        Ok(Self {
            config,
            lexicon,
            formal,
            casual,
            stages,
            timeline_phrases,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Full signal vector; never fails
    pub fn extract(
        &self,
        lead: &LeadRecord,
        conversation: &[ConversationTurn],
        now: DateTime<Utc>,
    ) -> SignalVector {
        self.extract_detailed(lead, conversation, now).into_value()
    }

    /// Structured fields only; conversation-derived signals take their
    /// no-data values
    pub fn extract_minimal(&self, lead: &LeadRecord, now: DateTime<Utc>) -> SignalVector {
        self.extract(lead, &[], now)
    }

    /// Signal vector plus whether any category had to be defaulted
    pub fn extract_detailed(
        &self,
        lead: &LeadRecord,
        conversation: &[ConversationTurn],
        now: DateTime<Utc>,
    ) -> Outcome<SignalVector> {
        let ctx = ExtractionContext::new(lead, conversation, now, &self.lexicon);
        let mut vector = SignalVector::neutral();
        let mut failed: Vec<SignalCategory> = Vec::new();

        for category in SignalCategory::ALL {
            match self.run_category(category, &ctx) {
                Ok(values) => {
                    for (name, value) in values {
                        debug_assert_eq!(name.category(), category);
                        vector.set(name, value);
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        lead_id = %lead.id,
                        category = %category,
                        error = %e,
                        "Signal category failed, using neutral defaults"
                    );
                    for name in category.signals() {
                        vector.set(name, name.neutral());
                    }
                    failed.push(category);
                },
            }
        }

        let anomalies = ctx.take_anomalies();
        if !anomalies.is_empty() {
            tracing::debug!(
                lead_id = %lead.id,
                count = anomalies.len(),
                keys = ?anomalies,
                "Extraction completed with coerced extras"
            );
        }

        if failed.len() == SignalCategory::ALL.len() {
            tracing::error!(lead_id = %lead.id, "Every signal category failed, using fallback vector");
            return Outcome::degraded(
                SignalVector::fallback(),
                Stage::Extraction,
                "all signal categories failed",
            );
        }
        if failed.is_empty() {
            Outcome::Complete(vector)
        } else {
            let names: Vec<&str> = failed.iter().map(|c| c.as_str()).collect();
            Outcome::degraded(
                vector,
                Stage::Extraction,
                format!("categories defaulted: {}", names.join(", ")),
            )
        }
    }

    fn run_category(&self, category: SignalCategory, ctx: &ExtractionContext<'_>) -> CategoryResult {
        match category {
            SignalCategory::Engagement => engagement::extract(ctx, &self.config),
            SignalCategory::FinancialReadiness => financial::extract(ctx, &self.config),
            SignalCategory::Urgency => urgency::extract(ctx, &self.config, &self.timeline_phrases),
            SignalCategory::Objections => objections::extract(ctx),
            SignalCategory::CommunicationStyle => {
                communication::extract(ctx, &self.config, &self.formal, &self.casual)
            },
            SignalCategory::DecisionStage => decision::extract(ctx, &self.config, &self.stages),
            SignalCategory::Lifestyle => lifestyle::extract(ctx, &self.config),
            SignalCategory::TechnicalEngagement => technical::extract(ctx, &self.config),
        }
    }
}
