//! Generic phrase matching
//!
//! Every keyword-driven signal goes through the same matcher: a phrase list
//! is compiled once into a single word-bounded alternation, and the
//! declarative lexicon table maps match counts to signal values.

use lead_intel_config::{LexiconEntry, MatchMode};
use lead_intel_core::{SignalName, SignalVector};
use regex::Regex;

use crate::BuildError;

/// Compiled phrase list. Matching is linear in text length.
#[derive(Debug, Clone)]
pub struct PhraseSet {
    regex: Option<Regex>,
}

/// Word-bounded alternation pattern for a phrase list
pub(crate) fn alternation<S: AsRef<str>>(phrases: &[S]) -> Option<String> {
    let escaped: Vec<String> = phrases
        .iter()
        .map(|p| p.as_ref().trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .map(|p| regex::escape(&p))
        .collect();
    if escaped.is_empty() {
        None
    } else {
        Some(format!(r"\b(?:{})\b", escaped.join("|")))
    }
}

impl PhraseSet {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Result<Self, BuildError> {
        let regex = match alternation(phrases) {
            Some(pattern) => Some(Regex::new(&pattern)?),
            None => None,
        };
        Ok(Self { regex })
    }

    /// Non-overlapping matches in already-lowercased text
    pub fn count(&self, text: &str) -> usize {
        self.regex
            .as_ref()
            .map(|r| r.find_iter(text).count())
            .unwrap_or(0)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(text))
    }
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    signal: SignalName,
    mode: MatchMode,
    weight: f64,
    saturation: f64,
    phrases: PhraseSet,
}

/// The phrase table, compiled
#[derive(Debug, Clone)]
pub struct LexiconMatcher {
    entries: Vec<CompiledEntry>,
}

impl LexiconMatcher {
    pub fn new(table: &[LexiconEntry]) -> Result<Self, BuildError> {
        let entries = table
            .iter()
            .map(|e| {
                Ok(CompiledEntry {
                    signal: e.signal,
                    mode: e.mode,
                    weight: e.weight,
                    saturation: if e.saturation > 0.0 { e.saturation } else { 1.0 },
                    phrases: PhraseSet::new(&e.phrases)?,
                })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;
        Ok(Self { entries })
    }

    /// Signals covered by at least one entry
    pub fn signals(&self) -> impl Iterator<Item = SignalName> + '_ {
        self.entries.iter().map(|e| e.signal)
    }

    /// Score lowercased text against every entry.
    ///
    /// Signals without an entry stay at 0.
    pub fn score(&self, text: &str) -> SignalVector {
        let mut out = SignalVector::zeros();
        for entry in &self.entries {
            let current = out.get(entry.signal);
            let next = match entry.mode {
                MatchMode::Presence => {
                    if entry.phrases.is_match(text) {
                        1.0
                    } else {
                        current
                    }
                },
                MatchMode::Weighted => {
                    let hits = entry.phrases.count(text) as f64;
                    current + entry.weight * hits / entry.saturation
                },
            };
            out.set(entry.signal, next);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_intel_config::default_lexicon;

    #[test]
    fn test_phrase_set_word_boundaries() {
        let set = PhraseSet::new(&["now", "cash buyer"]).unwrap();
        assert!(set.is_match("i need it now"));
        assert!(!set.is_match("i know the area"));
        assert_eq!(set.count("cash buyer, cash buyer and now"), 3);
    }

    #[test]
    fn test_empty_phrase_set() {
        let set = PhraseSet::new::<&str>(&[]).unwrap();
        assert!(!set.is_match("anything"));
        assert_eq!(set.count("anything"), 0);
    }

    #[test]
    fn test_phrases_are_escaped() {
        let set = PhraseSet::new(&["pre-approved", "1031"]).unwrap();
        assert!(set.is_match("we are pre-approved"));
        assert!(set.is_match("doing a 1031 exchange"));
        assert!(!set.is_match("preeapproved"));
    }

    #[test]
    fn test_weighted_urgency() {
        let matcher = LexiconMatcher::new(&default_lexicon()).unwrap();
        let scores = matcher.score("we need to move asap, soon please");
        // asap (3) + soon (2) over saturation 10
        assert!((scores.get(SignalName::UrgencyLanguage) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_presence_signals() {
        let matcher = LexiconMatcher::new(&default_lexicon()).unwrap();
        let scores = matcher.score("we are pre-approved and i'm a cash buyer");
        assert_eq!(scores.get(SignalName::PreApproval), 1.0);
        assert_eq!(scores.get(SignalName::CashBuyer), 1.0);
        assert_eq!(scores.get(SignalName::PriceObjection), 0.0);
    }

    #[test]
    fn test_weighted_saturates() {
        let matcher = LexiconMatcher::new(&default_lexicon()).unwrap();
        let scores = matcher.score(&"urgent ".repeat(20));
        assert_eq!(scores.get(SignalName::UrgencyLanguage), 1.0);
    }
}
