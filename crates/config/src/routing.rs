//! Agent routing configuration

use lead_intel_core::{LeadPriority, RoutingStrategy, Segment, FALLBACK_CONFIDENCE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ConfigError;

/// Hybrid composite weights for one priority level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridWeights {
    pub performance: f64,
    pub specialization: f64,
    pub capacity: f64,
}

impl HybridWeights {
    pub const fn new(performance: f64, specialization: f64, capacity: f64) -> Self {
        Self {
            performance,
            specialization,
            capacity,
        }
    }

    fn sum(&self) -> f64 {
        self.performance + self.specialization + self.capacity
    }
}

/// Hybrid weights keyed by priority
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeightTable {
    pub urgent: HybridWeights,
    pub high: HybridWeights,
    pub medium: HybridWeights,
    pub low: HybridWeights,
}

impl Default for HybridWeightTable {
    fn default() -> Self {
        Self {
            urgent: HybridWeights::new(0.5, 0.2, 0.3),
            high: HybridWeights::new(0.5, 0.2, 0.3),
            medium: HybridWeights::new(0.4, 0.35, 0.25),
            low: HybridWeights::new(0.25, 0.55, 0.2),
        }
    }
}

impl HybridWeightTable {
    pub fn for_priority(&self, priority: LeadPriority) -> HybridWeights {
        match priority {
            LeadPriority::Urgent => self.urgent,
            LeadPriority::High => self.high,
            LeadPriority::Medium => self.medium,
            LeadPriority::Low => self.low,
        }
    }
}

/// Per-priority values (score cut-offs or SLA minutes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityTable<T> {
    pub urgent: T,
    pub high: T,
    pub medium: T,
    pub low: T,
}

impl<T: Copy> PriorityTable<T> {
    pub fn get(&self, priority: LeadPriority) -> T {
        match priority {
            LeadPriority::Urgent => self.urgent,
            LeadPriority::High => self.high,
            LeadPriority::Medium => self.medium,
            LeadPriority::Low => self.low,
        }
    }
}

/// Performance sub-score composition (points out of 100)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub conversion_points: f64,
    pub satisfaction_points: f64,
    pub response_points: f64,
    /// Response at or below this many minutes earns full points
    pub fast_minutes: f64,
    /// Response at or above this many minutes earns none
    pub slow_minutes: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            conversion_points: 50.0,
            satisfaction_points: 30.0,
            response_points: 20.0,
            fast_minutes: 5.0,
            slow_minutes: 120.0,
        }
    }
}

/// Specialization sub-score caps (points out of 100)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecializationConfig {
    pub price_points: f64,
    pub geography_points: f64,
    pub client_type_points: f64,
    pub channel_points: f64,
    /// Specialization tags that count as a client-type fit per segment
    pub segment_tags: HashMap<Segment, Vec<String>>,
}

impl Default for SpecializationConfig {
    fn default() -> Self {
        let tags = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut segment_tags = HashMap::new();
        segment_tags.insert(Segment::TechHub, tags(&["tech_hub", "tech", "relocation"]));
        segment_tags.insert(Segment::EnergySector, tags(&["energy_sector", "energy", "relocation"]));
        segment_tags.insert(Segment::Military, tags(&["military", "va", "relocation"]));
        segment_tags.insert(Segment::Luxury, tags(&["luxury", "high_end"]));
        segment_tags.insert(Segment::FirstTimeBuyer, tags(&["first_time_buyer", "first_time"]));
        segment_tags.insert(Segment::InvestmentFocused, tags(&["investment_focused", "investor"]));
        segment_tags.insert(Segment::General, tags(&["general"]));
        Self {
            price_points: 30.0,
            geography_points: 25.0,
            client_type_points: 30.0,
            channel_points: 15.0,
            segment_tags,
        }
    }
}

/// Recommendation confidence shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfidenceConfig {
    pub base: f64,
    /// Maximum amount added on top of `base`
    pub span: f64,
    /// Score gap (0-100 scale) that earns the full span
    pub gap_window: f64,
    pub single_candidate: f64,
    pub fallback: f64,
}

impl Default for RoutingConfidenceConfig {
    fn default() -> Self {
        Self {
            base: 0.7,
            span: 0.25,
            gap_window: 25.0,
            single_candidate: 0.75,
            fallback: FALLBACK_CONFIDENCE,
        }
    }
}

/// Signal levels that escalate priority regardless of score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub cash_buyer: f64,
    pub timeline_urgency: f64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            cash_buyer: 0.5,
            timeline_urgency: 0.9,
        }
    }
}

/// Agent router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub default_strategy: RoutingStrategy,
    pub hybrid_weights: HybridWeightTable,
    /// Minimum score for each priority; below `medium` is low
    pub priority_thresholds: PriorityTable<f64>,
    pub sla_minutes: PriorityTable<u32>,
    pub escalation: EscalationConfig,
    pub performance: PerformanceConfig,
    pub specialization: SpecializationConfig,
    pub confidence: RoutingConfidenceConfig,
    pub max_backups: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_strategy: RoutingStrategy::Hybrid,
            hybrid_weights: HybridWeightTable::default(),
            priority_thresholds: PriorityTable {
                urgent: 85.0,
                high: 70.0,
                medium: 50.0,
                low: 0.0,
            },
            sla_minutes: PriorityTable {
                urgent: 5,
                high: 15,
                medium: 60,
                low: 240,
            },
            escalation: EscalationConfig::default(),
            performance: PerformanceConfig::default(),
            specialization: SpecializationConfig::default(),
            confidence: RoutingConfidenceConfig::default(),
            max_backups: 3,
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let table = &self.hybrid_weights;
        for (name, w) in [
            ("urgent", table.urgent),
            ("high", table.high),
            ("medium", table.medium),
            ("low", table.low),
        ] {
            if (w.sum() - 1.0).abs() > 1e-6 {
                return Err(ConfigError::InvalidValue {
                    field: format!("routing.hybrid_weights.{}", name),
                    message: format!("Weights must sum to 1.0, got {:.4}", w.sum()),
                });
            }
        }

        let t = &self.priority_thresholds;
        if !(t.urgent >= t.high && t.high >= t.medium && t.medium >= t.low) {
            return Err(ConfigError::InvalidValue {
                field: "routing.priority_thresholds".to_string(),
                message: "Thresholds must be non-increasing from urgent to low".to_string(),
            });
        }

        if self.max_backups > 3 {
            return Err(ConfigError::InvalidValue {
                field: "routing.max_backups".to_string(),
                message: format!("At most 3 backups are reported, got {}", self.max_backups),
            });
        }

        let c = &self.confidence;
        if c.fallback > 0.3 {
            return Err(ConfigError::InvalidValue {
                field: "routing.confidence.fallback".to_string(),
                message: format!("Fallback confidence must be at most 0.3, got {}", c.fallback),
            });
        }
        if c.base + c.span > 1.0 || c.gap_window <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "routing.confidence".to_string(),
                message: "base + span must not exceed 1.0 and gap_window must be positive"
                    .to_string(),
            });
        }
        Ok(())
    }
}
