//! Segment-specific signals consumed by the specialised models

use lead_intel_config::SegmentSignalConfig;
use lead_intel_core::{
    lead_text, ConversationTurn, ExtractionError, LeadRecord, Segment, SegmentSignal,
    SegmentSignals, SignalName, SignalVector,
};

use crate::classifier::extra_flag;
use crate::extractor::util::{finite, saturate, table_key};
use crate::lexicon::PhraseSet;
use crate::BuildError;

#[derive(Debug, Clone)]
pub struct SegmentSignalExtractor {
    tech_employers: PhraseSet,
    energy_employers: PhraseSet,
    va: PhraseSet,
    military: PhraseSet,
    relocation: PhraseSet,
    luxury: PhraseSet,
    luxury_budget: f64,
    first_time: PhraseSet,
    investment: PhraseSet,
    equity: PhraseSet,
    stable: PhraseSet,
    unstable: PhraseSet,
}

impl SegmentSignalExtractor {
    pub fn new(config: &SegmentSignalConfig) -> Result<Self, BuildError> {
        Ok(Self {
            tech_employers: PhraseSet::new(&config.tech_employers)?,
            energy_employers: PhraseSet::new(&config.energy_employers)?,
            va: PhraseSet::new(&config.va_phrases)?,
            military: PhraseSet::new(&config.military_phrases)?,
            relocation: PhraseSet::new(&config.relocation_phrases)?,
            luxury: PhraseSet::new(&config.luxury_phrases)?,
            luxury_budget: config.luxury_budget,
            first_time: PhraseSet::new(&config.first_time_phrases)?,
            investment: PhraseSet::new(&config.investment_phrases)?,
            equity: PhraseSet::new(&config.equity_phrases)?,
            stable: PhraseSet::new(&config.stable_phrases)?,
            unstable: PhraseSet::new(&config.unstable_phrases)?,
        })
    }

    /// Compute every segment signal for a lead classified into `segment`
    pub fn extract(
        &self,
        lead: &LeadRecord,
        conversation: &[ConversationTurn],
        base: &SignalVector,
        segment: Segment,
    ) -> Result<SegmentSignals, ExtractionError> {
        let profile = lead.profile_text();
        let spoken = lead_text(conversation);
        let combined = format!("{} {}", profile, spoken);
        let presence = |set: &PhraseSet| -> f64 {
            if set.is_match(&combined) {
                1.0
            } else {
                0.0
            }
        };

        let mut out = SegmentSignals::default();

        let employer = |set: &PhraseSet| -> f64 {
            if set.is_match(&profile) {
                1.0
            } else if set.is_match(&spoken) {
                0.7
            } else {
                0.0
            }
        };
        let affiliation = match segment {
            Segment::TechHub => employer(&self.tech_employers),
            Segment::EnergySector => employer(&self.energy_employers),
            _ => employer(&self.tech_employers).max(employer(&self.energy_employers)),
        };
        out.set(SegmentSignal::EmployerAffiliation, affiliation);

        let va_financing = lead.financing.as_deref().map(table_key).as_deref() == Some("va");
        let va = if self.va.is_match(&combined)
            || va_financing
            || extra_flag(lead, "military_status")
            || extra_flag(lead, "veteran")
        {
            1.0
        } else if self.military.is_match(&combined) {
            0.6
        } else {
            0.0
        };
        out.set(SegmentSignal::VaLoanEligibility, va);

        let timeline = base.get(SignalName::TimelineUrgency);
        let relocation = if self.relocation.is_match(&combined) {
            timeline.max(0.6)
        } else {
            timeline * 0.5
        };
        out.set(SegmentSignal::RelocationTimeline, relocation);

        let budget_level = match lead.budget {
            Some(b) => saturate(finite("budget", b)?, self.luxury_budget),
            None => 0.0,
        };
        out.set(
            SegmentSignal::LuxuryIndicators,
            0.6 * budget_level + 0.4 * presence(&self.luxury),
        );

        let first_time = if self.first_time.is_match(&combined) || extra_flag(lead, "first_time_buyer") {
            1.0
        } else {
            0.0
        };
        out.set(
            SegmentSignal::FirstTimeReadiness,
            0.4 * first_time
                + 0.3 * base.get(SignalName::PreApproval)
                + 0.3 * base.get(SignalName::FinancingReadiness),
        );

        out.set(
            SegmentSignal::InvestmentIntent,
            saturate(self.investment.count(&combined) as f64, 3.0),
        );
        out.set(SegmentSignal::EquityCompensation, presence(&self.equity));

        let stability = if self.stable.is_match(&combined) {
            1.0
        } else if self.unstable.is_match(&combined) {
            0.3
        } else {
            0.5
        };
        out.set(SegmentSignal::IndustryStability, stability);

        Ok(out)
    }
}
