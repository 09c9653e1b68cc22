//! Lead priority and response SLA

use lead_intel_config::RoutingConfig;
use lead_intel_core::{LeadPriority, SignalName, SignalVector};

/// Priority from the score, escalated by strong buying signals.
///
/// A cash buyer or an immediate timeline is at least `High`; both together
/// are `Urgent`.
pub fn lead_priority(score: f64, signals: &SignalVector, config: &RoutingConfig) -> LeadPriority {
    let t = &config.priority_thresholds;
    let from_score = if score >= t.urgent {
        LeadPriority::Urgent
    } else if score >= t.high {
        LeadPriority::High
    } else if score >= t.medium {
        LeadPriority::Medium
    } else {
        LeadPriority::Low
    };

    let cash = signals.get(SignalName::CashBuyer) >= config.escalation.cash_buyer;
    let immediate = signals.get(SignalName::TimelineUrgency) >= config.escalation.timeline_urgency;
    let floor = match (cash, immediate) {
        (true, true) => LeadPriority::Urgent,
        (true, false) | (false, true) => LeadPriority::High,
        (false, false) => LeadPriority::Low,
    };
    from_score.max(floor)
}

pub fn sla_minutes(priority: LeadPriority, config: &RoutingConfig) -> u32 {
    config.sla_minutes.get(priority)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_bands() {
        let config = RoutingConfig::default();
        let quiet = SignalVector::zeros();
        assert_eq!(lead_priority(90.0, &quiet, &config), LeadPriority::Urgent);
        assert_eq!(lead_priority(70.0, &quiet, &config), LeadPriority::High);
        assert_eq!(lead_priority(50.0, &quiet, &config), LeadPriority::Medium);
        assert_eq!(lead_priority(49.9, &quiet, &config), LeadPriority::Low);
    }

    #[test]
    fn test_escalation() {
        let config = RoutingConfig::default();
        let cash = SignalVector::zeros().with(SignalName::CashBuyer, 1.0);
        assert_eq!(lead_priority(20.0, &cash, &config), LeadPriority::High);

        let both = cash.with(SignalName::TimelineUrgency, 1.0);
        assert_eq!(lead_priority(20.0, &both, &config), LeadPriority::Urgent);
        assert_eq!(sla_minutes(LeadPriority::Urgent, &config), 5);
        assert_eq!(sla_minutes(LeadPriority::Low, &config), 240);
    }

    #[test]
    fn test_defaulted_categories_never_escalate() {
        let config = RoutingConfig::default();
        let mut defaulted = SignalVector::zeros();
        for name in SignalName::ALL {
            defaulted.set(name, name.neutral());
        }
        assert_eq!(lead_priority(10.0, &defaulted, &config), LeadPriority::Low);
    }
}
