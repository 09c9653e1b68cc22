//! End-to-end tests of the inference pipeline through the orchestrator

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use lead_intel_config::{ScoringConfig, Settings};
use lead_intel_core::{
    AgentProfile, AgentStats, ConversationTurn, EngagementCounters, FixedClock, LeadRecord,
    Segment, Tier, FALLBACK_AGENT_ID,
};
use lead_intel_engine::{
    InMemoryAgentDirectory, InferenceMode, InferenceOrchestrator, ScoreRequest,
};
use std::sync::Arc;
use std::time::Duration;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 15, 0, 0).unwrap()
}

fn agents() -> Vec<AgentProfile> {
    vec![
        AgentProfile::new("agent-tech", 20)
            .with_load(4)
            .with_specializations(&["tech_hub", "luxury"])
            .with_price_range(500_000.0, 1_500_000.0)
            .with_regions(&["austin"])
            .with_channels(&["email"])
            .with_stats(AgentStats {
                conversion_rate: 0.3,
                avg_response_minutes: 8.0,
                satisfaction: 4.8,
                closed_deals_90d: 12,
            }),
        AgentProfile::new("agent-general", 20).with_load(10),
    ]
}

fn orchestrator_with(settings: Settings, agents: Vec<AgentProfile>) -> InferenceOrchestrator {
    InferenceOrchestrator::builder(settings, ScoringConfig::default())
        .agent_directory(Arc::new(InMemoryAgentDirectory::new(agents)))
        .clock(Arc::new(FixedClock(now())))
        .build()
        .unwrap()
}

fn orchestrator() -> InferenceOrchestrator {
    orchestrator_with(Settings::default(), agents())
}

fn tech_professional() -> (LeadRecord, Vec<ConversationTurn>) {
    let lead = LeadRecord::new("lead-tech-001")
        .with_budget(750_000.0)
        .with_source("referral")
        .with_timeline("immediate")
        .with_financing("pre_approved")
        .with_location("Austin, TX")
        .with_occupation("Software Engineer")
        .with_employer("large tech company")
        .with_preferred_channel("email")
        .with_engagement(EngagementCounters {
            emails_sent: 10,
            emails_opened: 8,
            emails_clicked: 6,
            page_views: 25,
            sessions: 12,
            last_activity_at: Some(now() - ChronoDuration::hours(20)),
            ..Default::default()
        })
        .with_extra("app_sessions", 10)
        .with_extra("documents_downloaded", 5);

    let asked = now() - ChronoDuration::hours(3);
    let conversation = vec![
        ConversationTurn::agent("Thanks for reaching out! What's your timeline?", asked),
        ConversationTurn::lead(
            "We're pre-approved, cash buyer for the down payment and want to close ASAP. \
             My RSUs vest next month.",
            asked + ChronoDuration::minutes(10),
        ),
    ];
    (lead, conversation)
}

fn plain_lead(i: usize) -> ScoreRequest {
    let lead = LeadRecord::new(format!("lead-{:03}", i))
        .with_budget(120_000.0 + 40_000.0 * i as f64)
        .with_source(if i % 2 == 0 { "referral" } else { "zillow" })
        .with_timeline(if i % 3 == 0 { "immediate" } else { "6_months" })
        .with_engagement(EngagementCounters {
            emails_sent: 5,
            emails_opened: (i % 6) as u32,
            page_views: i as u32,
            ..Default::default()
        });
    let conversation = if i % 4 == 0 {
        vec![ConversationTurn::lead("Is this still available? We'd love a tour", now())]
    } else {
        Vec::new()
    };
    ScoreRequest::new(lead, conversation)
}

#[tokio::test]
async fn test_tech_professional_is_hot() {
    let o = orchestrator();
    let (lead, conversation) = tech_professional();
    let result = o.score("lead-tech-001", lead, conversation).await;

    assert_eq!(result.segment, Segment::TechHub);
    assert_eq!(result.tier, Tier::Hot);
    assert!(result.confidence >= 0.7, "confidence {}", result.confidence);
    assert_eq!(result.model_version, "tech_hub-v1.0");
    assert!(result.boost > 1.0);
}

#[tokio::test]
async fn test_tech_professional_routed_to_specialist() {
    let o = orchestrator();
    let (lead, conversation) = tech_professional();
    let outcome = o
        .infer(ScoreRequest::new(lead, conversation), InferenceMode::RealTime)
        .await;

    assert_eq!(outcome.routing.agent_id, "agent-tech");
    assert!(!outcome.routing.is_fallback);
    assert!(outcome.routing.backups.len() <= 3);
    assert!(outcome.degradations.is_empty());
}

#[tokio::test]
async fn test_repeat_request_is_idempotent() {
    let o = orchestrator();
    let (lead, conversation) = tech_professional();
    let request = ScoreRequest::new(lead, conversation);

    let first = o.infer(request.clone(), InferenceMode::RealTime).await;
    let second = o.infer(request, InferenceMode::RealTime).await;

    assert_eq!(first.fingerprint, second.fingerprint);
    assert!(first.score.same_decision(&second.score));
    assert_eq!(first.routing, second.routing);
    assert!(!first.score.cache_hit);
    assert!(second.score.cache_hit);
}

#[tokio::test]
async fn test_conversation_changes_cache_key() {
    let o = orchestrator();
    let (lead, conversation) = tech_professional();

    let with_history = o
        .infer(ScoreRequest::new(lead.clone(), conversation), InferenceMode::RealTime)
        .await;
    let without = o
        .infer(ScoreRequest::new(lead, Vec::new()), InferenceMode::RealTime)
        .await;

    assert_ne!(with_history.fingerprint, without.fingerprint);
    assert!(!without.score.cache_hit);
}

#[tokio::test]
async fn test_result_cache_expires() {
    let mut settings = Settings::default();
    settings.pipeline.result_ttl_secs = 1;
    let o = orchestrator_with(settings, agents());
    let request = plain_lead(7);

    o.infer(request.clone(), InferenceMode::RealTime).await;
    assert!(o.infer(request.clone(), InferenceMode::RealTime).await.score.cache_hit);

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert!(!o.infer(request, InferenceMode::RealTime).await.score.cache_hit);
}

#[tokio::test]
async fn test_batch_matches_single_lead_path() {
    let o = orchestrator();
    let requests: Vec<ScoreRequest> = (0..25).map(plain_lead).collect();

    let batch = o.score_batch(requests.clone(), InferenceMode::BatchFast).await;
    assert_eq!(batch.results.len(), requests.len());
    assert_eq!(batch.failed, 0);

    for (request, batched) in requests.into_iter().zip(&batch.results) {
        let single = o.infer(request, InferenceMode::Background).await.score;
        assert!(
            (single.score - batched.score).abs() < 1e-6,
            "{} vs {}",
            single.score,
            batched.score
        );
        assert_eq!(single.tier, batched.tier);
        assert_eq!(single.segment, batched.segment);
        assert_eq!(single.fingerprint, batched.fingerprint);
    }
}

#[tokio::test]
async fn test_oversize_batch_is_chunked_in_order() {
    let o = orchestrator();
    let requests: Vec<ScoreRequest> = (0..150).map(plain_lead).collect();
    let expected: Vec<String> = requests.iter().map(|r| r.fingerprint()).collect();

    let batch = o.score_batch(requests, InferenceMode::BatchBulk).await;
    assert_eq!(batch.succeeded, 150);
    let got: Vec<String> = batch.results.iter().map(|r| r.fingerprint.clone()).collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_no_agents_routes_to_sentinel() {
    let o = orchestrator_with(Settings::default(), Vec::new());
    let (lead, conversation) = tech_professional();
    let outcome = o
        .infer(ScoreRequest::new(lead, conversation), InferenceMode::RealTime)
        .await;

    assert_eq!(outcome.routing.agent_id, FALLBACK_AGENT_ID);
    assert!(outcome.routing.is_fallback);
    assert!(outcome.routing.confidence <= 0.3);
    assert!(outcome.routing.backups.is_empty());
    // the score itself is unaffected
    assert_eq!(outcome.score.tier, Tier::Hot);
}

#[tokio::test]
async fn test_outputs_stay_in_range() {
    let o = orchestrator();
    for i in 0..40 {
        let outcome = o.infer(plain_lead(i), InferenceMode::RealTime).await;
        assert!((0.0..=100.0).contains(&outcome.score.score));
        assert!((0.3..=0.95).contains(&outcome.score.confidence));
        assert!(outcome
            .signals
            .iter()
            .all(|(_, v)| (0.0..=1.0).contains(&v)));
    }
}

#[tokio::test]
async fn test_performance_report_tracks_requests() {
    let o = orchestrator();
    let request = plain_lead(3);
    o.infer(request.clone(), InferenceMode::RealTime).await;
    o.infer(request, InferenceMode::RealTime).await;

    let report = o.performance_metrics();
    assert_eq!(report.total_requests, 2);
    assert_eq!(report.sample_count, 2);
    assert_eq!(report.cache_hit_rate, 0.5);
    assert_eq!(report.per_model_counts.values().sum::<u64>(), 2);
}
