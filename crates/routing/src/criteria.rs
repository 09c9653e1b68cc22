//! Per-agent sub-scores, each on a 0-100 scale

use lead_intel_config::{PerformanceConfig, SpecializationConfig};
use lead_intel_core::{linear_decay, AgentProfile, LeadRecord, Segment};

/// Track record: conversion, satisfaction and response speed
pub fn performance_score(agent: &AgentProfile, config: &PerformanceConfig) -> f64 {
    let s = &agent.stats;
    let conversion = s.conversion_rate.clamp(0.0, 1.0);
    let satisfaction = (s.satisfaction / 5.0).clamp(0.0, 1.0);
    let speed = linear_decay(s.avg_response_minutes, config.fast_minutes, config.slow_minutes);

    config.conversion_points * conversion
        + config.satisfaction_points * satisfaction
        + config.response_points * speed
}

/// Spare capacity
pub fn capacity_score(agent: &AgentProfile) -> f64 {
    100.0 * (1.0 - agent.load_ratio())
}

/// Fit of one agent for one lead, with the parts that earned points
#[derive(Debug, Clone, PartialEq)]
pub struct Specialization {
    pub score: f64,
    pub reasons: Vec<String>,
}

pub fn specialization_score(
    agent: &AgentProfile,
    lead: &LeadRecord,
    segment: Segment,
    config: &SpecializationConfig,
) -> Specialization {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    if let (Some(budget), Some(range)) = (lead.budget.filter(|b| b.is_finite() && *b > 0.0), agent.price_range) {
        if range.contains(budget) {
            score += config.price_points;
            reasons.push("budget within price range".to_string());
        } else {
            let distance = if budget < range.min {
                range.min - budget
            } else {
                budget - range.max
            };
            let width = if range.width() > 0.0 { range.width() } else { range.max.max(1.0) };
            let partial = config.price_points * (1.0 - distance / width).max(0.0);
            if partial > 0.0 {
                score += partial;
                reasons.push("budget near price range".to_string());
            }
        }
    }

    if let Some(location) = lead.location.as_deref().map(str::to_lowercase) {
        if let Some(region) = agent
            .regions
            .iter()
            .find(|r| !r.is_empty() && location.contains(&r.to_lowercase()))
        {
            score += config.geography_points;
            reasons.push(format!("covers {}", region));
        }
    }

    let has_tag = |tag: &str| agent.specializations.iter().any(|s| s.eq_ignore_ascii_case(tag));
    let client_fit = match config.segment_tags.get(&segment) {
        Some(tags) => tags.iter().any(|t| has_tag(t)),
        None => has_tag(segment.as_str()),
    };
    if client_fit {
        score += config.client_type_points;
        reasons.push(format!("specializes in {}", segment.display_name()));
    }

    if let Some(channel) = lead.preferred_channel.as_deref() {
        if agent.channels.iter().any(|c| c.eq_ignore_ascii_case(channel)) {
            score += config.channel_points;
            reasons.push(format!("works via {}", channel));
        }
    }

    Specialization {
        score: score.min(100.0),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_intel_core::AgentStats;

    #[test]
    fn test_performance_score() {
        let config = PerformanceConfig::default();
        let star = AgentProfile::new("a", 10).with_stats(AgentStats {
            conversion_rate: 1.0,
            avg_response_minutes: 2.0,
            satisfaction: 5.0,
            closed_deals_90d: 40,
        });
        assert_eq!(performance_score(&star, &config), 100.0);

        let slow = AgentProfile::new("b", 10).with_stats(AgentStats {
            conversion_rate: 0.2,
            avg_response_minutes: 240.0,
            satisfaction: 2.5,
            closed_deals_90d: 1,
        });
        assert!((performance_score(&slow, &config) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_capacity_score() {
        assert_eq!(capacity_score(&AgentProfile::new("a", 10).with_load(4)), 60.0);
        assert_eq!(capacity_score(&AgentProfile::new("a", 0)), 0.0);
    }

    #[test]
    fn test_specialization_full_fit() {
        let config = SpecializationConfig::default();
        let agent = AgentProfile::new("a", 10)
            .with_price_range(500_000.0, 1_000_000.0)
            .with_regions(&["Austin"])
            .with_specializations(&["tech"])
            .with_channels(&["sms"]);
        let lead = LeadRecord::new("l")
            .with_budget(750_000.0)
            .with_location("Austin, TX")
            .with_preferred_channel("SMS");
        let fit = specialization_score(&agent, &lead, Segment::TechHub, &config);
        assert_eq!(fit.score, 100.0);
        assert_eq!(fit.reasons.len(), 4);
    }

    #[test]
    fn test_price_partial_credit() {
        let config = SpecializationConfig::default();
        let agent = AgentProfile::new("a", 10).with_price_range(400_000.0, 600_000.0);
        let lead = LeadRecord::new("l").with_budget(700_000.0);
        let fit = specialization_score(&agent, &lead, Segment::General, &config);
        // 100k outside a 200k-wide band
        assert!((fit.score - 15.0).abs() < 1e-9);

        let far = LeadRecord::new("l").with_budget(2_000_000.0);
        assert_eq!(specialization_score(&agent, &far, Segment::General, &config).score, 0.0);
    }
}
