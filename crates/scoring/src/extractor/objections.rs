//! Objections raised by the lead

use lead_intel_core::SignalName;

use super::{CategoryResult, ExtractionContext};

pub(super) fn extract(ctx: &ExtractionContext<'_>) -> CategoryResult {
    Ok(vec![
        (SignalName::ObjectionIntensity, ctx.lexicon.get(SignalName::ObjectionIntensity)),
        (SignalName::PriceObjection, ctx.lexicon.get(SignalName::PriceObjection)),
    ])
}

#[cfg(test)]
mod tests {
    use crate::SignalExtractor;
    use chrono::Utc;
    use lead_intel_config::ExtractionConfig;
    use lead_intel_core::{ConversationTurn, LeadRecord, SignalName};

    #[test]
    fn test_objections() {
        let x = SignalExtractor::new(ExtractionConfig::default()).unwrap();
        let now = Utc::now();
        let turns = vec![
            ConversationTurn::lead("Honestly it's too expensive, I'm not sure", now),
            ConversationTurn::lead("Maybe later", now),
        ];
        let v = x.extract(&LeadRecord::new("a"), &turns, now);
        // two strong (2) and one mild (1) over saturation 6
        assert!((v.get(SignalName::ObjectionIntensity) - 5.0 / 6.0).abs() < 1e-9);
        assert_eq!(v.get(SignalName::PriceObjection), 1.0);
    }
}
