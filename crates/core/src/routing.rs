//! Agent profiles and routing recommendations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Agent id returned when no real agent can take the lead
pub const FALLBACK_AGENT_ID: &str = "unassigned-queue";

/// Confidence attached to the fallback sentinel
pub const FALLBACK_CONFIDENCE: f64 = 0.2;

/// Rolling performance statistics for an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentStats {
    /// Closed / assigned over the rolling window, in [0, 1]
    pub conversion_rate: f64,
    pub avg_response_minutes: f64,
    /// Client satisfaction on a 0-5 scale
    pub satisfaction: f64,
    pub closed_deals_90d: u32,
}

impl Default for AgentStats {
    fn default() -> Self {
        Self {
            conversion_rate: 0.1,
            avg_response_minutes: 30.0,
            satisfaction: 4.0,
            closed_deals_90d: 0,
        }
    }
}

/// Inclusive price band an agent usually works
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        (self.max - self.min).max(0.0)
    }
}

/// Read-only snapshot of an agent's capability and load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Maximum concurrent active leads
    pub capacity: u32,
    #[serde(default)]
    pub current_load: u32,
    /// Client-type tags, matched against segment names
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub stats: AgentStats,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl AgentProfile {
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            capacity,
            current_load: 0,
            specializations: Vec::new(),
            price_range: None,
            regions: Vec::new(),
            channels: Vec::new(),
            stats: AgentStats::default(),
            available: true,
        }
    }

    pub fn with_load(mut self, load: u32) -> Self {
        self.current_load = load;
        self
    }

    pub fn with_specializations(mut self, tags: &[&str]) -> Self {
        self.specializations = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_price_range(mut self, min: f64, max: f64) -> Self {
        self.price_range = Some(PriceRange::new(min, max));
        self
    }

    pub fn with_regions(mut self, regions: &[&str]) -> Self {
        self.regions = regions.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_channels(mut self, channels: &[&str]) -> Self {
        self.channels = channels.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_stats(mut self, stats: AgentStats) -> Self {
        self.stats = stats;
        self
    }

    /// Fraction of capacity in use, 1.0 for zero-capacity agents
    pub fn load_ratio(&self) -> f64 {
        if self.capacity == 0 {
            1.0
        } else {
            (self.current_load as f64 / self.capacity as f64).min(1.0)
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.available && self.current_load < self.capacity
    }
}

/// Agent selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    /// Least relatively loaded agent
    RoundRobin,
    PerformanceBased,
    SpecializationMatch,
    #[default]
    Hybrid,
}

impl RoutingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingStrategy::RoundRobin => "round_robin",
            RoutingStrategy::PerformanceBased => "performance_based",
            RoutingStrategy::SpecializationMatch => "specialization_match",
            RoutingStrategy::Hybrid => "hybrid",
        }
    }
}

impl FromStr for RoutingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round_robin" => Ok(Self::RoundRobin),
            "performance_based" => Ok(Self::PerformanceBased),
            "specialization_match" => Ok(Self::SpecializationMatch),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!("unknown routing strategy '{}'", other)),
        }
    }
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lead handling priority; ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl LeadPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadPriority::Low => "low",
            LeadPriority::Medium => "medium",
            LeadPriority::High => "high",
            LeadPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for LeadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranked alternative to the primary agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupAgent {
    pub agent_id: String,
    pub match_score: f64,
}

/// Which agent should handle a lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRecommendation {
    pub agent_id: String,
    /// Composite match score in [0, 100]
    pub match_score: f64,
    pub confidence: f64,
    /// At most three ranked alternatives
    pub backups: Vec<BackupAgent>,
    pub sla_minutes: u32,
    pub priority: LeadPriority,
    pub strategy: RoutingStrategy,
    pub predicted_response_minutes: f64,
    pub is_fallback: bool,
    pub reasons: Vec<String>,
}

impl RoutingRecommendation {
    /// Explicit sentinel used when no agent is eligible
    pub fn fallback(
        priority: LeadPriority,
        strategy: RoutingStrategy,
        sla_minutes: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: FALLBACK_AGENT_ID.to_string(),
            match_score: 0.0,
            confidence: FALLBACK_CONFIDENCE,
            backups: Vec::new(),
            sla_minutes,
            priority,
            strategy,
            predicted_response_minutes: sla_minutes as f64,
            is_fallback: true,
            reasons: vec![reason.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(LeadPriority::Urgent > LeadPriority::High);
        assert!(LeadPriority::Medium > LeadPriority::Low);
    }

    #[test]
    fn test_eligibility() {
        let agent = AgentProfile::new("a1", 2).with_load(2);
        assert!(!agent.is_eligible());
        assert_eq!(agent.load_ratio(), 1.0);

        let zero = AgentProfile::new("a2", 0);
        assert!(!zero.is_eligible());
    }

    #[test]
    fn test_fallback_sentinel() {
        let r = RoutingRecommendation::fallback(
            LeadPriority::High,
            RoutingStrategy::Hybrid,
            15,
            "no agents",
        );
        assert_eq!(r.agent_id, FALLBACK_AGENT_ID);
        assert!(r.is_fallback);
        assert!(r.confidence <= 0.3);
        assert!(r.backups.is_empty());
    }
}
