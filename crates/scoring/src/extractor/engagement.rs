//! Engagement signals: email, web and responsiveness behaviour

use chrono::{DateTime, Utc};
use lead_intel_config::ExtractionConfig;
use lead_intel_core::{linear_decay, ExtractionError, SignalName};

use super::util::{finite, ratio, saturate, table_key};
use super::{CategoryResult, ExtractionContext};

pub(super) fn extract(ctx: &ExtractionContext<'_>, config: &ExtractionConfig) -> CategoryResult {
    let e = &ctx.lead.engagement;
    let sat = &config.saturation;

    let open_rate = ratio(e.emails_opened, e.emails_sent);
    let click_rate = ratio(e.emails_clicked, e.emails_opened);
    let session_depth = saturate(e.sessions as f64, sat.sessions);
    let engagement = 0.4 * open_rate + 0.3 * click_rate + 0.3 * session_depth;

    Ok(vec![
        (SignalName::EngagementScore, engagement),
        (SignalName::EmailOpenRate, open_rate),
        (SignalName::PageViews, saturate(e.page_views as f64, sat.page_views)),
        (SignalName::ResponseTime, response_time(ctx, config)?),
        (SignalName::SourceQuality, source_quality(ctx, config)),
        (SignalName::ActivityRecency, activity_recency(ctx, config)),
    ])
}

/// Average agent-to-lead reply gap, falling back to the upstream average
fn response_time(ctx: &ExtractionContext<'_>, config: &ExtractionConfig) -> Result<f64, ExtractionError> {
    let mut gaps = Vec::new();
    let mut pending: Option<DateTime<Utc>> = None;
    for (index, turn) in ctx.conversation.iter().enumerate() {
        if turn.is_lead() {
            if let Some(asked_at) = pending.take() {
                let seconds = (turn.timestamp - asked_at).num_seconds();
                if seconds < 0 {
                    return Err(ExtractionError::UnorderedTimestamps { index });
                }
                gaps.push(seconds as f64 / 3600.0);
            }
        } else {
            pending = Some(turn.timestamp);
        }
    }

    if !gaps.is_empty() {
        let avg = gaps.iter().sum::<f64>() / gaps.len() as f64;
        let window = &config.response_time;
        return Ok(linear_decay(avg, window.fast, window.slow));
    }
    match ctx.lead.engagement.avg_response_hours {
        Some(hours) => Ok(linear_decay(
            finite("avg_response_hours", hours)?.max(0.0),
            config.response_time.fast,
            config.response_time.slow,
        )),
        None => Ok(SignalName::ResponseTime.fallback()),
    }
}

fn source_quality(ctx: &ExtractionContext<'_>, config: &ExtractionConfig) -> f64 {
    let score = match ctx.lead.source.as_deref() {
        None => config.missing_source_score,
        Some(raw) => config
            .source_scores
            .get(&table_key(raw))
            .copied()
            .unwrap_or(config.unknown_source_score),
    };
    score / 100.0
}

fn activity_recency(ctx: &ExtractionContext<'_>, config: &ExtractionConfig) -> f64 {
    match ctx.lead.engagement.last_activity_at {
        Some(at) => {
            let days = (ctx.now - at).num_seconds().max(0) as f64 / 86_400.0;
            linear_decay(days, config.recency.fast, config.recency.slow)
        },
        None => SignalName::ActivityRecency.fallback(),
    }
}

#[cfg(test)]
mod tests {
    use crate::SignalExtractor;
    use chrono::{Duration, TimeZone, Utc};
    use lead_intel_config::ExtractionConfig;
    use lead_intel_core::{EngagementCounters, LeadRecord, SignalName};

    fn extractor() -> SignalExtractor {
        SignalExtractor::new(ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_engagement_composite() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let lead = LeadRecord::new("a").with_engagement(EngagementCounters {
            emails_sent: 10,
            emails_opened: 5,
            emails_clicked: 5,
            sessions: 20,
            ..Default::default()
        });
        let v = extractor().extract(&lead, &[], now);
        // 0.4 * 0.5 + 0.3 * 1.0 + 0.3 * 1.0
        assert!((v.get(SignalName::EngagementScore) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_source_lookup() {
        let now = Utc::now();
        let x = extractor();
        let known = x.extract(&LeadRecord::new("a").with_source("Google Organic"), &[], now);
        assert_eq!(known.get(SignalName::SourceQuality), 0.75);
        let unknown = x.extract(&LeadRecord::new("a").with_source("billboard"), &[], now);
        assert_eq!(unknown.get(SignalName::SourceQuality), 0.4);
    }

    #[test]
    fn test_upstream_response_average() {
        let now = Utc::now();
        let lead = LeadRecord::new("a").with_engagement(EngagementCounters {
            avg_response_hours: Some(48.0),
            ..Default::default()
        });
        let v = extractor().extract(&lead, &[], now);
        assert_eq!(v.get(SignalName::ResponseTime), 0.0);
    }

    #[test]
    fn test_recency_decay() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let lead = LeadRecord::new("a").with_engagement(EngagementCounters {
            last_activity_at: Some(now - Duration::days(60)),
            ..Default::default()
        });
        let v = extractor().extract(&lead, &[], now);
        assert_eq!(v.get(SignalName::ActivityRecency), 0.0);
    }
}
