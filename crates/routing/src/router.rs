//! Agent router

use lead_intel_config::RoutingConfig;
use lead_intel_core::{
    AgentProfile, BackupAgent, LeadPriority, LeadRecord, Outcome, RoutingError,
    RoutingRecommendation, RoutingStrategy, ScoreResult, SignalVector, Stage,
};
use std::cmp::Ordering;

use crate::criteria::{capacity_score, performance_score, specialization_score};
use crate::priority::{lead_priority, sla_minutes};

/// Scored candidate
#[derive(Debug)]
struct Candidate<'a> {
    agent: &'a AgentProfile,
    performance: f64,
    specialization: f64,
    capacity: f64,
    composite: f64,
    reasons: Vec<String>,
}

fn check_stats(agent: &AgentProfile) -> Result<(), RoutingError> {
    let s = &agent.stats;
    for (name, value) in [
        ("conversion_rate", s.conversion_rate),
        ("avg_response_minutes", s.avg_response_minutes),
        ("satisfaction", s.satisfaction),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(RoutingError::InvalidAgent {
                agent_id: agent.id.clone(),
                message: format!("{} is {}", name, value),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct AgentRouter {
    config: RoutingConfig,
}

impl AgentRouter {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Recommendation for a scored lead; falls back to the sentinel
    pub fn recommend(
        &self,
        lead: &LeadRecord,
        score: &ScoreResult,
        signals: &SignalVector,
        agents: &[AgentProfile],
        strategy: Option<RoutingStrategy>,
    ) -> RoutingRecommendation {
        self.recommend_detailed(lead, score, signals, agents, strategy)
            .into_value()
    }

    pub fn recommend_detailed(
        &self,
        lead: &LeadRecord,
        score: &ScoreResult,
        signals: &SignalVector,
        agents: &[AgentProfile],
        strategy: Option<RoutingStrategy>,
    ) -> Outcome<RoutingRecommendation> {
        let strategy = strategy.unwrap_or(self.config.default_strategy);
        let priority = lead_priority(score.score, signals, &self.config);

        match self.select(lead, score, priority, agents, strategy) {
            Ok(recommendation) => Outcome::Complete(recommendation),
            Err(e) => {
                tracing::warn!(
                    lead_id = %lead.id,
                    strategy = %strategy,
                    error = %e,
                    "Routing fell back to unassigned queue"
                );
                Outcome::degraded(
                    self.sentinel(priority, strategy, e.to_string()),
                    Stage::Routing,
                    e.to_string(),
                )
            },
        }
    }

    /// The `unassigned-queue` recommendation for a lead of this priority
    pub fn sentinel(
        &self,
        priority: LeadPriority,
        strategy: RoutingStrategy,
        reason: impl Into<String>,
    ) -> RoutingRecommendation {
        let mut fallback = RoutingRecommendation::fallback(
            priority,
            strategy,
            sla_minutes(priority, &self.config),
            reason,
        );
        fallback.confidence = self.config.confidence.fallback;
        fallback
    }

    /// Rank eligible agents and build the recommendation
    pub fn select(
        &self,
        lead: &LeadRecord,
        score: &ScoreResult,
        priority: LeadPriority,
        agents: &[AgentProfile],
        strategy: RoutingStrategy,
    ) -> Result<RoutingRecommendation, RoutingError> {
        let mut candidates: Vec<Candidate<'_>> = agents
            .iter()
            .filter(|a| a.is_eligible())
            .filter(|a| match check_stats(a) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(agent_id = %a.id, error = %e, "Skipping agent with invalid stats");
                    false
                },
            })
            .map(|agent| self.evaluate(agent, lead, score, priority, strategy))
            .collect();

        if candidates.is_empty() {
            return Err(RoutingError::NoEligibleAgents {
                total: agents.len(),
            });
        }

        match strategy {
            RoutingStrategy::RoundRobin => candidates.sort_by(|a, b| {
                a.agent
                    .load_ratio()
                    .partial_cmp(&b.agent.load_ratio())
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.agent.id.cmp(&b.agent.id))
            }),
            _ => candidates.sort_by(|a, b| {
                b.composite
                    .partial_cmp(&a.composite)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.agent.id.cmp(&b.agent.id))
            }),
        }

        let confidence = self.confidence(&candidates);
        let mut ranked = candidates.into_iter();
        let Some(best) = ranked.next() else {
            return Err(RoutingError::NoEligibleAgents {
                total: agents.len(),
            });
        };
        let backups = ranked
            .take(self.config.max_backups)
            .map(|c| BackupAgent {
                agent_id: c.agent.id.clone(),
                match_score: c.composite,
            })
            .collect();

        let mut reasons = best.reasons;
        reasons.push(format!(
            "performance {:.1}, specialization {:.1}, capacity {:.1}",
            best.performance, best.specialization, best.capacity
        ));

        tracing::debug!(
            lead_id = %lead.id,
            agent_id = %best.agent.id,
            strategy = %strategy,
            priority = %priority,
            match_score = best.composite,
            "Agent selected"
        );

        Ok(RoutingRecommendation {
            agent_id: best.agent.id.clone(),
            match_score: best.composite,
            confidence,
            backups,
            sla_minutes: sla_minutes(priority, &self.config),
            priority,
            strategy,
            predicted_response_minutes: best.agent.stats.avg_response_minutes
                * (1.0 + best.agent.load_ratio()),
            is_fallback: false,
            reasons,
        })
    }

    fn evaluate<'a>(
        &self,
        agent: &'a AgentProfile,
        lead: &LeadRecord,
        score: &ScoreResult,
        priority: LeadPriority,
        strategy: RoutingStrategy,
    ) -> Candidate<'a> {
        let performance = performance_score(agent, &self.config.performance);
        let fit = specialization_score(agent, lead, score.segment, &self.config.specialization);
        let capacity = capacity_score(agent);

        let composite = match strategy {
            RoutingStrategy::RoundRobin => capacity,
            RoutingStrategy::PerformanceBased => performance,
            RoutingStrategy::SpecializationMatch => fit.score,
            RoutingStrategy::Hybrid => {
                let w = self.config.hybrid_weights.for_priority(priority);
                w.performance * performance + w.specialization * fit.score + w.capacity * capacity
            },
        };

        Candidate {
            agent,
            performance,
            specialization: fit.score,
            capacity,
            composite: composite.clamp(0.0, 100.0),
            reasons: fit.reasons,
        }
    }

    /// Wider gaps between the top two candidates mean a clearer choice
    fn confidence(&self, ranked: &[Candidate<'_>]) -> f64 {
        let c = &self.config.confidence;
        match ranked {
            [] => c.fallback,
            [_] => c.single_candidate,
            [first, second, ..] => {
                let gap = (first.composite - second.composite).abs();
                c.base + c.span * (gap / c.gap_window).min(1.0)
            },
        }
    }
}
