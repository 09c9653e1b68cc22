//! Segment classification rules
//!
//! Rules are evaluated in list order; the first matching rule decides the
//! segment. A lead matching nothing is `general`.

use lead_intel_core::Segment;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One ordered classification rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRule {
    pub segment: Segment,
    /// Phrases matched on word boundaries against profile and lead text
    #[serde(default)]
    pub phrases: Vec<String>,
    /// Extras whose truthy value triggers the rule
    #[serde(default)]
    pub extra_flags: Vec<String>,
    /// Budget at or above this triggers the rule on its own
    #[serde(default)]
    pub min_budget: Option<f64>,
    /// Budget above this vetoes the rule
    #[serde(default)]
    pub max_budget: Option<f64>,
}

impl SegmentRule {
    pub fn new(segment: Segment, phrases: &[&str]) -> Self {
        Self {
            segment,
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            extra_flags: Vec::new(),
            min_budget: None,
            max_budget: None,
        }
    }

    pub fn with_flags(mut self, flags: &[&str]) -> Self {
        self.extra_flags = flags.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_min_budget(mut self, budget: f64) -> Self {
        self.min_budget = Some(budget);
        self
    }

    pub fn with_max_budget(mut self, budget: f64) -> Self {
        self.max_budget = Some(budget);
        self
    }
}

/// Ordered rule list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentRulesConfig {
    pub rules: Vec<SegmentRule>,
}

impl Default for SegmentRulesConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                SegmentRule::new(
                    Segment::Military,
                    &[
                        "military", "veteran", "active duty", "va loan", "va benefits", "pcs",
                        "army", "navy", "air force", "marine corps", "deployment", "base housing",
                    ],
                )
                .with_flags(&["military_status", "veteran"]),
                SegmentRule::new(
                    Segment::TechHub,
                    &[
                        "software", "tech company", "startup", "developer", "data scientist",
                        "product manager", "google", "microsoft", "amazon", "meta", "nvidia",
                        "salesforce", "saas",
                    ],
                ),
                SegmentRule::new(
                    Segment::EnergySector,
                    &[
                        "oil", "gas", "energy", "petroleum", "refinery", "drilling", "pipeline",
                        "exxon", "chevron", "shell", "conocophillips", "halliburton", "offshore",
                        "lng",
                    ],
                ),
                SegmentRule::new(
                    Segment::Luxury,
                    &["luxury", "waterfront", "penthouse", "mansion", "high-end", "gated estate"],
                )
                .with_min_budget(1_000_000.0),
                SegmentRule::new(
                    Segment::InvestmentFocused,
                    &[
                        "investment property", "investor", "rental", "cash flow", "roi",
                        "cap rate", "portfolio", "1031", "duplex", "multifamily", "flip",
                    ],
                )
                .with_flags(&["investor"]),
                SegmentRule::new(
                    Segment::FirstTimeBuyer,
                    &["first time", "first-time", "first home", "never owned"],
                )
                .with_flags(&["first_time_buyer"])
                .with_max_budget(750_000.0),
            ],
        }
    }
}

impl SegmentRulesConfig {
    /// Rules in evaluation order
    pub fn by_priority(&self) -> impl Iterator<Item = &SegmentRule> {
        self.rules.iter()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.rules {
            if rule.segment == Segment::General {
                return Err(ConfigError::InvalidValue {
                    field: "segment_rules".to_string(),
                    message: "general is the implicit default and cannot have a rule".to_string(),
                });
            }
            if rule.phrases.is_empty() && rule.extra_flags.is_empty() && rule.min_budget.is_none()
            {
                return Err(ConfigError::InvalidValue {
                    field: format!("segment_rules.{}", rule.segment),
                    message: "Rule has no trigger".to_string(),
                });
            }
            if let (Some(min), Some(max)) = (rule.min_budget, rule.max_budget) {
                if min > max {
                    return Err(ConfigError::InvalidValue {
                        field: format!("segment_rules.{}", rule.segment),
                        message: format!("min_budget {} exceeds max_budget {}", min, max),
                    });
                }
            }
        }
        Ok(())
    }
}
