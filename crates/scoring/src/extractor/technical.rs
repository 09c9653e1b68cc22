//! Digital tooling usage

use lead_intel_config::ExtractionConfig;
use lead_intel_core::SignalName;

use super::util::saturate;
use super::{CategoryResult, ExtractionContext};

pub(super) fn extract(ctx: &ExtractionContext<'_>, config: &ExtractionConfig) -> CategoryResult {
    let sat = &config.saturation;
    let tours = saturate(ctx.extra("virtual_tours").unwrap_or(0.0), sat.virtual_tours);
    let app = saturate(ctx.extra("app_sessions").unwrap_or(0.0), sat.app_sessions);
    let documents = saturate(ctx.extra("documents_downloaded").unwrap_or(0.0), sat.documents);

    Ok(vec![
        (SignalName::VirtualTourEngagement, tours),
        (SignalName::DigitalEngagement, (app + documents) / 2.0),
    ])
}

#[cfg(test)]
mod tests {
    use crate::SignalExtractor;
    use chrono::Utc;
    use lead_intel_config::ExtractionConfig;
    use lead_intel_core::{LeadRecord, SignalName};

    #[test]
    fn test_tool_usage() {
        let x = SignalExtractor::new(ExtractionConfig::default()).unwrap();
        let lead = LeadRecord::new("a")
            .with_extra("virtual_tours", 10)
            .with_extra("app_sessions", "5")
            .with_extra("documents_downloaded", 5);
        let v = x.extract(&lead, &[], Utc::now());
        assert_eq!(v.get(SignalName::VirtualTourEngagement), 1.0);
        assert_eq!(v.get(SignalName::DigitalEngagement), 0.75);
    }
}
