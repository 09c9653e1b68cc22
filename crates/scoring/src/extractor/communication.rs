//! Communication style of lead-authored messages

use lead_intel_config::ExtractionConfig;
use lead_intel_core::SignalName;

use super::util::{least_squares_slope, saturate};
use super::{CategoryResult, ExtractionContext};
use crate::lexicon::PhraseSet;

pub(super) fn extract(
    ctx: &ExtractionContext<'_>,
    config: &ExtractionConfig,
    formal: &PhraseSet,
    casual: &PhraseSet,
) -> CategoryResult {
    let lengths: Vec<f64> = ctx
        .lead_turns()
        .map(|t| t.text.chars().count() as f64)
        .collect();

    if lengths.is_empty() {
        return Ok(vec![
            (SignalName::CommunicationQuality, SignalName::CommunicationQuality.fallback()),
            (SignalName::Formality, SignalName::Formality.fallback()),
            (SignalName::MessageLengthTrend, SignalName::MessageLengthTrend.fallback()),
        ]);
    }

    let sat = &config.saturation;
    let avg_len = lengths.iter().sum::<f64>() / lengths.len() as f64;
    let questions = ctx.lead_text.matches('?').count() as f64;
    let quality = (saturate(avg_len, sat.message_length) + saturate(questions, sat.questions)) / 2.0;

    let formal_hits = formal.count(&ctx.lead_text) as f64;
    let casual_hits = casual.count(&ctx.lead_text) as f64;
    let formality = if formal_hits + casual_hits > 0.0 {
        formal_hits / (formal_hits + casual_hits)
    } else {
        0.5
    };

    let trend = match least_squares_slope(&lengths) {
        Some(slope) if sat.message_trend > 0.0 => 0.5 + slope / (2.0 * sat.message_trend),
        _ => 0.5,
    };

    Ok(vec![
        (SignalName::CommunicationQuality, quality),
        (SignalName::Formality, formality),
        (SignalName::MessageLengthTrend, trend),
    ])
}

#[cfg(test)]
mod tests {
    use crate::SignalExtractor;
    use chrono::{Duration, Utc};
    use lead_intel_config::ExtractionConfig;
    use lead_intel_core::{ConversationTurn, LeadRecord, SignalName};

    fn extractor() -> SignalExtractor {
        SignalExtractor::new(ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_growing_messages_raise_trend() {
        let now = Utc::now();
        let turns: Vec<_> = (0..4)
            .map(|i| ConversationTurn::lead("x".repeat(10 + i * 20), now + Duration::minutes(i as i64)))
            .collect();
        let v = extractor().extract(&LeadRecord::new("a"), &turns, now);
        // slope of 20 chars per message saturates the trend
        assert_eq!(v.get(SignalName::MessageLengthTrend), 1.0);
    }

    #[test]
    fn test_formality_ratio() {
        let now = Utc::now();
        let turns = vec![
            ConversationTurn::lead("Could you please send the listing? Thank you", now),
            ConversationTurn::lead("yeah cool", now),
        ];
        let v = extractor().extract(&LeadRecord::new("a"), &turns, now);
        // could you, please, thank you vs yeah, cool
        assert!((v.get(SignalName::Formality) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_quality_counts_questions() {
        let now = Utc::now();
        let text = format!("{}?", "a".repeat(99));
        let turns = vec![ConversationTurn::lead(text, now)];
        let v = extractor().extract(&LeadRecord::new("a"), &turns, now);
        // full length credit, one question out of five
        assert!((v.get(SignalName::CommunicationQuality) - 0.6).abs() < 1e-9);
    }
}
