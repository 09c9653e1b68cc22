//! Household and relocation indicators

use lead_intel_config::ExtractionConfig;
use lead_intel_core::SignalName;

use super::{CategoryResult, ExtractionContext};

pub(super) fn extract(ctx: &ExtractionContext<'_>, config: &ExtractionConfig) -> CategoryResult {
    let large_household = ctx
        .extra("household_size")
        .is_some_and(|size| size >= config.saturation.household_size);
    let family = ctx
        .lexicon
        .get(SignalName::FamilyOrientation)
        .max(if large_household { 1.0 } else { 0.0 });

    Ok(vec![
        (SignalName::FamilyOrientation, family),
        (SignalName::RelocationIntent, ctx.lexicon.get(SignalName::RelocationIntent)),
    ])
}

#[cfg(test)]
mod tests {
    use crate::SignalExtractor;
    use chrono::Utc;
    use lead_intel_config::ExtractionConfig;
    use lead_intel_core::{ConversationTurn, LeadRecord, SignalName};

    #[test]
    fn test_household_and_relocation() {
        let x = SignalExtractor::new(ExtractionConfig::default()).unwrap();
        let now = Utc::now();
        let lead = LeadRecord::new("a").with_extra("household_size", 4);
        let turns = vec![ConversationTurn::lead("We're relocating for a new job", now)];
        let v = x.extract(&lead, &turns, now);
        assert_eq!(v.get(SignalName::FamilyOrientation), 1.0);
        assert_eq!(v.get(SignalName::RelocationIntent), 1.0);

        let small = x.extract(&LeadRecord::new("a").with_extra("household_size", 1), &[], now);
        assert_eq!(small.get(SignalName::FamilyOrientation), 0.0);
    }
}
