//! Buying stage and property interest

use lead_intel_config::ExtractionConfig;
use lead_intel_core::SignalName;

use super::util::saturate;
use super::{CategoryResult, ExtractionContext};
use crate::lexicon::PhraseSet;

pub(super) fn extract(
    ctx: &ExtractionContext<'_>,
    config: &ExtractionConfig,
    stages: &[(f64, PhraseSet)],
) -> CategoryResult {
    // most matched stage wins; later stages win ties
    let mut best: Option<(usize, f64)> = None;
    for (value, phrases) in stages {
        let hits = phrases.count(&ctx.combined_text);
        if hits == 0 {
            continue;
        }
        match best {
            Some((top, _)) if hits < top => {},
            _ => best = Some((hits, *value)),
        }
    }
    let stage = best.map(|(_, v)| v).unwrap_or(0.0);

    let e = &ctx.lead.engagement;
    let properties = (e.saved_properties + e.property_inquiries) as f64;

    Ok(vec![
        (SignalName::DecisionStage, stage),
        (
            SignalName::PropertyMatchCount,
            saturate(properties, config.saturation.properties),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use crate::SignalExtractor;
    use chrono::Utc;
    use lead_intel_config::ExtractionConfig;
    use lead_intel_core::{ConversationTurn, EngagementCounters, LeadRecord, SignalName};

    fn extractor() -> SignalExtractor {
        SignalExtractor::new(ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_stage_selection() {
        let now = Utc::now();
        let x = extractor();

        let browsing = vec![ConversationTurn::lead("Just looking, curious about the area", now)];
        let v = x.extract(&LeadRecord::new("a"), &browsing, now);
        assert_eq!(v.get(SignalName::DecisionStage), 0.25);

        // one exploration hit, one commitment hit: the later stage wins
        let mixed = vec![ConversationTurn::lead("I was browsing but now I'm ready to buy", now)];
        let v = x.extract(&LeadRecord::new("a"), &mixed, now);
        assert_eq!(v.get(SignalName::DecisionStage), 1.0);

        let v = x.extract(&LeadRecord::new("a"), &[], now);
        assert_eq!(v.get(SignalName::DecisionStage), 0.0);
    }

    #[test]
    fn test_property_interest() {
        let lead = LeadRecord::new("a").with_engagement(EngagementCounters {
            saved_properties: 3,
            property_inquiries: 2,
            ..Default::default()
        });
        let v = extractor().extract(&lead, &[], Utc::now());
        assert_eq!(v.get(SignalName::PropertyMatchCount), 0.5);
    }
}
