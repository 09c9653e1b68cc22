//! Segment classification
//!
//! Ordered rules, first match wins. All rule phrases are compiled into one
//! `RegexSet` so a single pass over the text answers every rule at once.

use lead_intel_config::{SegmentRule, SegmentRulesConfig};
use lead_intel_core::{
    lead_text, ClassificationError, ConversationTurn, LeadRecord, Outcome, Segment, Stage,
};
use regex::RegexSet;
use serde_json::Value;

use crate::lexicon::alternation;
use crate::BuildError;

/// Whether a boolean-ish extra is set
pub(crate) fn extra_flag(lead: &LeadRecord, key: &str) -> bool {
    match lead.extras().find(|(k, _)| k.as_str() == key).map(|(_, v)| v) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => {
            let s = s.trim().to_lowercase();
            !s.is_empty() && !matches!(s.as_str(), "false" | "no" | "0" | "none")
        },
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub struct SegmentClassifier {
    rules: Vec<SegmentRule>,
    /// Position of each rule's pattern in `phrases`, when it has one
    pattern_index: Vec<Option<usize>>,
    phrases: RegexSet,
}

impl SegmentClassifier {
    pub fn new(config: &SegmentRulesConfig) -> Result<Self, BuildError> {
        let rules: Vec<SegmentRule> = config.by_priority().cloned().collect();
        let mut patterns = Vec::new();
        let mut pattern_index = Vec::with_capacity(rules.len());
        for rule in &rules {
            match alternation(&rule.phrases) {
                Some(pattern) => {
                    pattern_index.push(Some(patterns.len()));
                    patterns.push(pattern);
                },
                None => pattern_index.push(None),
            }
        }
        let phrases = RegexSet::new(&patterns)?;

        Ok(Self {
            rules,
            pattern_index,
            phrases,
        })
    }

    /// Segment for a lead; failures degrade to `general`
    pub fn classify(&self, lead: &LeadRecord, conversation: &[ConversationTurn]) -> Segment {
        self.classify_detailed(lead, conversation).into_value()
    }

    pub fn classify_detailed(
        &self,
        lead: &LeadRecord,
        conversation: &[ConversationTurn],
    ) -> Outcome<Segment> {
        match self.try_classify(lead, conversation) {
            Ok(segment) => Outcome::Complete(segment),
            Err(e) => {
                tracing::warn!(lead_id = %lead.id, error = %e, "Segment classification failed, using general");
                Outcome::degraded(Segment::General, Stage::Classification, e.to_string())
            },
        }
    }

    pub fn try_classify(
        &self,
        lead: &LeadRecord,
        conversation: &[ConversationTurn],
    ) -> Result<Segment, ClassificationError> {
        let budget = match lead.budget {
            Some(b) if !b.is_finite() => return Err(ClassificationError::InvalidBudget(b)),
            other => other,
        };

        let text = format!("{} {}", lead.profile_text(), lead_text(conversation));
        let hits = self.phrases.matches(&text);

        for (rule, index) in self.rules.iter().zip(&self.pattern_index) {
            let phrase_hit = index.is_some_and(|i| hits.matched(i));
            let flag_hit = rule.extra_flags.iter().any(|f| extra_flag(lead, f));
            let budget_hit = matches!((rule.min_budget, budget), (Some(min), Some(b)) if b >= min);
            let vetoed = matches!((rule.max_budget, budget), (Some(max), Some(b)) if b > max);

            if (phrase_hit || flag_hit || budget_hit) && !vetoed {
                tracing::debug!(lead_id = %lead.id, segment = %rule.segment, "Segment classified");
                return Ok(rule.segment);
            }
        }
        Ok(Segment::General)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn classifier() -> SegmentClassifier {
        SegmentClassifier::new(&SegmentRulesConfig::default()).unwrap()
    }

    #[test]
    fn test_tech_professional() {
        let lead = LeadRecord::new("a")
            .with_occupation("Software Engineer")
            .with_employer("a large tech company")
            .with_budget(750_000.0);
        assert_eq!(classifier().classify(&lead, &[]), Segment::TechHub);
    }

    #[test]
    fn test_military_takes_precedence() {
        let lead = LeadRecord::new("a").with_occupation("Software developer");
        let turns = vec![ConversationTurn::lead("I'm a veteran, can I use a VA loan?", Utc::now())];
        assert_eq!(classifier().classify(&lead, &turns), Segment::Military);
    }

    #[test]
    fn test_flag_and_budget_triggers() {
        let c = classifier();
        let flagged = LeadRecord::new("a").with_extra("military_status", "active");
        assert_eq!(c.classify(&flagged, &[]), Segment::Military);

        let wealthy = LeadRecord::new("a").with_budget(3_000_000.0);
        assert_eq!(c.classify(&wealthy, &[]), Segment::Luxury);

        let off = LeadRecord::new("a").with_extra("military_status", false);
        assert_eq!(c.classify(&off, &[]), Segment::General);
    }

    #[test]
    fn test_first_time_budget_veto() {
        let c = classifier();
        let turns = vec![ConversationTurn::lead("This would be our first home", Utc::now())];
        let modest = LeadRecord::new("a").with_budget(300_000.0);
        assert_eq!(c.classify(&modest, &turns), Segment::FirstTimeBuyer);

        let large = LeadRecord::new("a").with_budget(900_000.0);
        assert_eq!(c.classify(&large, &turns), Segment::General);
    }

    #[test]
    fn test_state_abbreviation_is_not_military() {
        let lead = LeadRecord::new("a")
            .with_occupation("Data scientist")
            .with_notes("Relocating to Arlington, VA for a new role");
        assert_eq!(classifier().classify(&lead, &[]), Segment::TechHub);

        let turns = vec![ConversationTurn::lead("We love Richmond VA", Utc::now())];
        assert_eq!(classifier().classify(&LeadRecord::new("b"), &turns), Segment::General);
    }

    #[test]
    fn test_word_boundaries() {
        // "gas" inside "vegas" must not trigger the energy rule
        let lead = LeadRecord::new("a").with_notes("Moving to Las Vegas");
        assert_eq!(classifier().classify(&lead, &[]), Segment::General);
    }

    #[test]
    fn test_invalid_budget_degrades() {
        let lead = LeadRecord::new("a").with_budget(f64::NAN);
        let outcome = classifier().classify_detailed(&lead, &[]);
        assert!(outcome.is_degraded());
        assert_eq!(*outcome.value(), Segment::General);
    }

    #[test]
    fn test_no_signal_is_general() {
        assert_eq!(classifier().classify(&LeadRecord::new("a"), &[]), Segment::General);
    }
}
