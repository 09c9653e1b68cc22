//! Urgency: stated timeline and urgent phrasing

use lead_intel_config::ExtractionConfig;
use lead_intel_core::SignalName;

use super::util::table_key;
use super::{CategoryResult, ExtractionContext};
use crate::lexicon::PhraseSet;

pub(super) fn extract(
    ctx: &ExtractionContext<'_>,
    config: &ExtractionConfig,
    timeline_phrases: &[(f64, PhraseSet)],
) -> CategoryResult {
    let from_field = ctx
        .lead
        .timeline
        .as_deref()
        .and_then(|raw| config.timeline_urgency.get(&table_key(raw)).copied());
    let from_text = timeline_phrases
        .iter()
        .filter(|(_, phrases)| phrases.is_match(&ctx.combined_text))
        .map(|(value, _)| *value)
        .reduce(f64::max);

    let timeline = match (from_field, from_text) {
        (Some(a), Some(b)) => a.max(b),
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => config.unknown_timeline,
    };

    Ok(vec![
        (SignalName::TimelineUrgency, timeline),
        (SignalName::UrgencyLanguage, ctx.lexicon.get(SignalName::UrgencyLanguage)),
    ])
}
