//! Financial readiness: budget fit and financing status

use lead_intel_config::ExtractionConfig;
use lead_intel_core::{ExtractionError, SignalName};

use super::util::{finite, table_key};
use super::{CategoryResult, ExtractionContext};

pub(super) fn extract(ctx: &ExtractionContext<'_>, config: &ExtractionConfig) -> CategoryResult {
    let budget_match = budget_match(ctx, config)?;

    let financing = ctx.lead.financing.as_deref().map(table_key);
    let field_is = |status: &str| financing.as_deref() == Some(status);

    let pre_approval = ctx
        .lexicon
        .get(SignalName::PreApproval)
        .max(if field_is("pre_approved") { 1.0 } else { 0.0 });
    let cash_buyer = ctx
        .lexicon
        .get(SignalName::CashBuyer)
        .max(if field_is("cash") { 1.0 } else { 0.0 });

    let table_readiness = financing
        .as_deref()
        .and_then(|key| config.financing_readiness.get(key).copied())
        .unwrap_or(config.unknown_financing);
    let mut readiness = table_readiness;
    if pre_approval >= 1.0 {
        readiness = readiness.max(config.financing_readiness.get("pre_approved").copied().unwrap_or(0.9));
    }
    if cash_buyer >= 1.0 {
        readiness = readiness.max(config.financing_readiness.get("cash").copied().unwrap_or(1.0));
    }

    Ok(vec![
        (SignalName::BudgetMatch, budget_match),
        (SignalName::PreApproval, pre_approval),
        (SignalName::CashBuyer, cash_buyer),
        (SignalName::FinancingReadiness, readiness),
    ])
}

/// Budget fit against viewed prices when known, otherwise the market band
fn budget_match(ctx: &ExtractionContext<'_>, config: &ExtractionConfig) -> Result<f64, ExtractionError> {
    let budget = match ctx.lead.budget {
        Some(b) => finite("budget", b)?,
        None => return Ok(0.0),
    };
    if budget <= 0.0 {
        return Ok(0.0);
    }

    if let Some(viewed) = ctx.extra("avg_viewed_price") {
        let viewed = finite("avg_viewed_price", viewed)?;
        if viewed > 0.0 {
            return Ok(budget.min(viewed) / budget.max(viewed));
        }
    }

    let market = &config.market;
    if budget < market.min_budget {
        Ok(budget / market.min_budget)
    } else {
        Ok(1.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::SignalExtractor;
    use chrono::Utc;
    use lead_intel_config::ExtractionConfig;
    use lead_intel_core::{ConversationTurn, LeadRecord, SignalName};

    fn extractor() -> SignalExtractor {
        SignalExtractor::new(ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_budget_against_market() {
        let x = extractor();
        let now = Utc::now();
        let low = x.extract(&LeadRecord::new("a").with_budget(75_000.0), &[], now);
        assert_eq!(low.get(SignalName::BudgetMatch), 0.5);
        let mid = x.extract(&LeadRecord::new("a").with_budget(500_000.0), &[], now);
        assert_eq!(mid.get(SignalName::BudgetMatch), 1.0);
        let negative = x.extract(&LeadRecord::new("a").with_budget(-5.0), &[], now);
        assert_eq!(negative.get(SignalName::BudgetMatch), 0.0);
    }

    #[test]
    fn test_budget_against_viewed_prices() {
        let lead = LeadRecord::new("a")
            .with_budget(400_000.0)
            .with_extra("avg_viewed_price", 500_000);
        let v = extractor().extract(&lead, &[], Utc::now());
        assert!((v.get(SignalName::BudgetMatch) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_financing_from_field_and_text() {
        let x = extractor();
        let now = Utc::now();
        let field = x.extract(&LeadRecord::new("a").with_financing("cash"), &[], now);
        assert_eq!(field.get(SignalName::CashBuyer), 1.0);
        assert_eq!(field.get(SignalName::FinancingReadiness), 1.0);

        let turns = vec![ConversationTurn::lead("We're pre-approved already", now)];
        let text = x.extract(&LeadRecord::new("a").with_financing("fha"), &turns, now);
        assert_eq!(text.get(SignalName::PreApproval), 1.0);
        assert_eq!(text.get(SignalName::FinancingReadiness), 0.9);

        let unknown = x.extract(&LeadRecord::new("a"), &[], now);
        assert_eq!(unknown.get(SignalName::FinancingReadiness), 0.2);
    }
}
