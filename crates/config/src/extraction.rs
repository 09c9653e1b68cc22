//! Signal extraction configuration
//!
//! Lookup tables, decay windows and the phrase lexicon consumed by the
//! signal extractor. Everything here is versioned data: tuning a phrase
//! list or a table value never requires touching extractor control flow.

use lead_intel_core::SignalName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a lexicon entry turns matches into a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Any match yields 1.0
    #[default]
    Presence,
    /// weight * match count / saturation, summed across entries
    Weighted,
}

/// One row of the phrase table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub signal: SignalName,
    pub phrases: Vec<String>,
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_saturation")]
    pub saturation: f64,
}

fn default_weight() -> f64 {
    1.0
}

fn default_saturation() -> f64 {
    10.0
}

impl LexiconEntry {
    pub fn presence(signal: SignalName, phrases: &[&str]) -> Self {
        Self {
            signal,
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            mode: MatchMode::Presence,
            weight: 1.0,
            saturation: 1.0,
        }
    }

    pub fn weighted(signal: SignalName, phrases: &[&str], weight: f64, saturation: f64) -> Self {
        Self {
            signal,
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            mode: MatchMode::Weighted,
            weight,
            saturation,
        }
    }
}

/// Linear decay window: 1.0 at or below `fast`, 0.0 at or above `slow`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayWindow {
    pub fast: f64,
    pub slow: f64,
}

/// Budget band considered a full market fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketBand {
    pub min_budget: f64,
    pub max_budget: f64,
}

impl Default for MarketBand {
    fn default() -> Self {
        Self {
            min_budget: 150_000.0,
            max_budget: 2_000_000.0,
        }
    }
}

/// A phrase that pins a timeline value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseValue {
    pub phrase: String,
    pub value: f64,
}

/// Phrases indicating one buying stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageLexicon {
    pub stage: String,
    pub value: f64,
    pub phrases: Vec<String>,
}

/// Saturation points: the raw count mapping to 1.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Saturation {
    pub page_views: f64,
    pub sessions: f64,
    pub properties: f64,
    pub virtual_tours: f64,
    pub app_sessions: f64,
    pub documents: f64,
    pub household_size: f64,
    /// chars per message of slope that moves the trend signal by 0.5
    pub message_trend: f64,
    pub message_length: f64,
    pub questions: f64,
}

impl Default for Saturation {
    fn default() -> Self {
        Self {
            page_views: 20.0,
            sessions: 10.0,
            properties: 10.0,
            virtual_tours: 5.0,
            app_sessions: 10.0,
            documents: 5.0,
            household_size: 3.0,
            message_trend: 20.0,
            message_length: 100.0,
            questions: 5.0,
        }
    }
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Lead source credibility on a 0-100 scale
    pub source_scores: HashMap<String, f64>,
    pub unknown_source_score: f64,
    pub missing_source_score: f64,
    /// Financing status readiness in [0, 1]
    pub financing_readiness: HashMap<String, f64>,
    pub unknown_financing: f64,
    /// Timeline field urgency in [0, 1]
    pub timeline_urgency: HashMap<String, f64>,
    pub unknown_timeline: f64,
    pub timeline_phrases: Vec<PhraseValue>,
    /// Response time window in hours
    pub response_time: DecayWindow,
    /// Activity recency window in days
    pub recency: DecayWindow,
    pub market: MarketBand,
    pub saturation: Saturation,
    pub lexicon: Vec<LexiconEntry>,
    pub formal_phrases: Vec<String>,
    pub casual_phrases: Vec<String>,
    pub decision_stages: Vec<StageLexicon>,
}

fn table(entries: &[(&str, f64)]) -> HashMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            source_scores: table(&[
                ("referral", 90.0),
                ("past_client", 85.0),
                ("google_organic", 75.0),
                ("open_house", 70.0),
                ("facebook_ads", 65.0),
                ("zillow", 60.0),
                ("realtor_com", 55.0),
                ("google_ads", 50.0),
                ("unknown", 30.0),
            ]),
            unknown_source_score: 40.0,
            missing_source_score: 30.0,
            financing_readiness: table(&[
                ("cash", 1.0),
                ("pre_approved", 0.9),
                ("va", 0.7),
                ("conventional", 0.6),
                ("jumbo", 0.6),
                ("fha", 0.5),
                ("needs_financing", 0.3),
            ]),
            unknown_financing: 0.2,
            timeline_urgency: table(&[
                ("immediate", 1.0),
                ("1_month", 0.9),
                ("2_months", 0.7),
                ("3_months", 0.5),
                ("6_months", 0.3),
                ("1_year", 0.2),
                ("flexible", 0.1),
            ]),
            unknown_timeline: 0.3,
            timeline_phrases: [
                ("asap", 1.0),
                ("immediately", 1.0),
                ("right away", 1.0),
                ("this month", 0.9),
                ("within 30 days", 0.9),
                ("next month", 0.8),
                ("this spring", 0.6),
                ("in a few months", 0.5),
                ("this year", 0.4),
                ("next year", 0.2),
                ("just looking", 0.1),
            ]
            .iter()
            .map(|(p, v)| PhraseValue {
                phrase: p.to_string(),
                value: *v,
            })
            .collect(),
            response_time: DecayWindow {
                fast: 1.0,
                slow: 48.0,
            },
            recency: DecayWindow {
                fast: 1.0,
                slow: 30.0,
            },
            market: MarketBand::default(),
            saturation: Saturation::default(),
            lexicon: default_lexicon(),
            formal_phrases: strings(&[
                "please",
                "thank you",
                "regards",
                "sincerely",
                "appreciate",
                "would you",
                "could you",
                "kindly",
            ]),
            casual_phrases: strings(&[
                "hey", "yeah", "cool", "gonna", "wanna", "lol", "thx", "yep",
            ]),
            decision_stages: vec![
                StageLexicon {
                    stage: "exploration".to_string(),
                    value: 0.25,
                    phrases: strings(&["just looking", "curious", "browsing", "thinking about"]),
                },
                StageLexicon {
                    stage: "evaluation".to_string(),
                    value: 0.5,
                    phrases: strings(&["compare", "comparing", "options", "which one", "pros and cons"]),
                },
                StageLexicon {
                    stage: "negotiation".to_string(),
                    value: 0.75,
                    phrases: strings(&["offer", "price", "negotiate", "counter", "closing costs"]),
                },
                StageLexicon {
                    stage: "commitment".to_string(),
                    value: 1.0,
                    phrases: strings(&["ready to buy", "sign", "contract", "let's do it", "move forward"]),
                },
            ],
        }
    }
}

/// Default phrase table
pub fn default_lexicon() -> Vec<LexiconEntry> {
    use SignalName::*;
    vec![
        LexiconEntry::weighted(
            UrgencyLanguage,
            &["asap", "immediately", "urgent", "emergency", "now"],
            3.0,
            10.0,
        ),
        LexiconEntry::weighted(
            UrgencyLanguage,
            &["soon", "quickly", "fast", "hurry", "rush"],
            2.0,
            10.0,
        ),
        LexiconEntry::weighted(
            UrgencyLanguage,
            &["eventually", "sometime", "when possible"],
            1.0,
            10.0,
        ),
        LexiconEntry::presence(
            PreApproval,
            &["pre-approved", "preapproved", "pre approved", "pre-approval", "approval letter"],
        ),
        LexiconEntry::presence(
            CashBuyer,
            &["cash buyer", "all cash", "paying cash", "cash offer", "pay cash"],
        ),
        LexiconEntry::weighted(
            ObjectionIntensity,
            &["too expensive", "not sure", "think about it", "not ready", "can't afford"],
            2.0,
            6.0,
        ),
        LexiconEntry::weighted(
            ObjectionIntensity,
            &["other agent", "just browsing", "maybe later", "concerned"],
            1.0,
            6.0,
        ),
        LexiconEntry::presence(
            PriceObjection,
            &["too expensive", "overpriced", "can't afford", "out of my budget", "lower price"],
        ),
        LexiconEntry::presence(
            FamilyOrientation,
            &["kids", "children", "school district", "schools", "family", "backyard"],
        ),
        LexiconEntry::presence(
            RelocationIntent,
            &["relocating", "relocation", "moving from", "transfer", "new job", "moving to"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let config = ExtractionConfig::default();
        assert_eq!(config.source_scores["referral"], 90.0);
        assert_eq!(config.financing_readiness["cash"], 1.0);
        assert_eq!(config.timeline_urgency["immediate"], 1.0);
        assert!(config.lexicon.iter().any(|e| e.signal == SignalName::CashBuyer));
    }

    #[test]
    fn test_lexicon_yaml() {
        let yaml = r#"
signal: urgency_language
phrases: ["asap"]
mode: weighted
weight: 3.0
"#;
        let entry: LexiconEntry = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entry.signal, SignalName::UrgencyLanguage);
        assert_eq!(entry.mode, MatchMode::Weighted);
        assert_eq!(entry.saturation, 10.0);
    }
}
