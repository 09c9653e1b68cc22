//! Batch engine throughput against the scalar scoring path

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lead_intel_config::ScoringConfig;
use lead_intel_core::{ConversationTurn, EngagementCounters, LeadRecord};
use lead_intel_engine::{BatchEngine, FeatureCache, ScoreRequest};
use lead_intel_scoring::LeadScorer;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn make_requests(count: usize) -> Vec<ScoreRequest> {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let lead = LeadRecord::new(format!("bench-{i}"))
                .with_budget(200_000.0 + 10_000.0 * i as f64)
                .with_source("referral")
                .with_timeline("3_months")
                .with_occupation(if i % 3 == 0 { "software engineer" } else { "nurse" })
                .with_engagement(EngagementCounters {
                    emails_sent: 10,
                    emails_opened: (i % 10) as u32,
                    page_views: (i % 25) as u32,
                    ..Default::default()
                });
            let conversation = vec![
                ConversationTurn::agent("When are you looking to move?", now),
                ConversationTurn::lead(
                    format!("Probably within {} months, we're pre-approved", i % 6 + 1),
                    now,
                ),
            ];
            ScoreRequest::new(lead, conversation)
        })
        .collect()
}

fn bench_batch_vs_scalar(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let scorer = Arc::new(LeadScorer::new(&ScoringConfig::default()).expect("default config"));
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

    let mut group = c.benchmark_group("lead_scoring");
    group.sample_size(20);

    for count in [10usize, 100] {
        let requests = make_requests(count);

        group.bench_with_input(BenchmarkId::new("scalar", count), &requests, |b, requests| {
            b.iter(|| {
                for r in requests {
                    black_box(scorer.score(&r.lead, &r.conversation, now));
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("batch", count), &requests, |b, requests| {
            b.to_async(&rt).iter(|| async {
                // fresh feature cache so every iteration extracts
                let features = Arc::new(FeatureCache::new(count, Duration::from_secs(900)));
                let engine = BatchEngine::new(scorer.clone(), features, Duration::from_secs(2));
                black_box(engine.score_batch(requests.clone(), 10, now).await)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_batch_vs_scalar);
criterion_main!(benches);
