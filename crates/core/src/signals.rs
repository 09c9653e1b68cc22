//! Normalized behavioural signals
//!
//! The signal set is fixed at compile time. A `SignalVector` always holds a
//! value for every `SignalName`, each clamped to [0, 1], which is what lets
//! the batch engine stack vectors into a dense matrix.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Extractor category that owns a group of signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Engagement,
    FinancialReadiness,
    Urgency,
    Objections,
    CommunicationStyle,
    DecisionStage,
    Lifestyle,
    TechnicalEngagement,
}

impl SignalCategory {
    pub const ALL: [SignalCategory; 8] = [
        SignalCategory::Engagement,
        SignalCategory::FinancialReadiness,
        SignalCategory::Urgency,
        SignalCategory::Objections,
        SignalCategory::CommunicationStyle,
        SignalCategory::DecisionStage,
        SignalCategory::Lifestyle,
        SignalCategory::TechnicalEngagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::Engagement => "engagement",
            SignalCategory::FinancialReadiness => "financial_readiness",
            SignalCategory::Urgency => "urgency",
            SignalCategory::Objections => "objections",
            SignalCategory::CommunicationStyle => "communication_style",
            SignalCategory::DecisionStage => "decision_stage",
            SignalCategory::Lifestyle => "lifestyle",
            SignalCategory::TechnicalEngagement => "technical_engagement",
        }
    }

    /// Signals produced by this category
    pub fn signals(&self) -> impl Iterator<Item = SignalName> + '_ {
        SignalName::ALL
            .iter()
            .copied()
            .filter(move |s| s.category() == *self)
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every signal the extractor produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalName {
    // engagement
    EngagementScore,
    EmailOpenRate,
    PageViews,
    ResponseTime,
    SourceQuality,
    ActivityRecency,
    // financial readiness
    BudgetMatch,
    PreApproval,
    CashBuyer,
    FinancingReadiness,
    // urgency
    TimelineUrgency,
    UrgencyLanguage,
    // objections
    ObjectionIntensity,
    PriceObjection,
    // communication style
    CommunicationQuality,
    Formality,
    MessageLengthTrend,
    // decision stage
    DecisionStage,
    PropertyMatchCount,
    // lifestyle
    FamilyOrientation,
    RelocationIntent,
    // technical engagement
    VirtualTourEngagement,
    DigitalEngagement,
}

/// Number of signals in a `SignalVector`
pub const SIGNAL_COUNT: usize = 23;

impl SignalName {
    pub const ALL: [SignalName; SIGNAL_COUNT] = [
        SignalName::EngagementScore,
        SignalName::EmailOpenRate,
        SignalName::PageViews,
        SignalName::ResponseTime,
        SignalName::SourceQuality,
        SignalName::ActivityRecency,
        SignalName::BudgetMatch,
        SignalName::PreApproval,
        SignalName::CashBuyer,
        SignalName::FinancingReadiness,
        SignalName::TimelineUrgency,
        SignalName::UrgencyLanguage,
        SignalName::ObjectionIntensity,
        SignalName::PriceObjection,
        SignalName::CommunicationQuality,
        SignalName::Formality,
        SignalName::MessageLengthTrend,
        SignalName::DecisionStage,
        SignalName::PropertyMatchCount,
        SignalName::FamilyOrientation,
        SignalName::RelocationIntent,
        SignalName::VirtualTourEngagement,
        SignalName::DigitalEngagement,
    ];

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn category(&self) -> SignalCategory {
        use SignalName::*;
        match self {
            EngagementScore | EmailOpenRate | PageViews | ResponseTime | SourceQuality
            | ActivityRecency => SignalCategory::Engagement,
            BudgetMatch | PreApproval | CashBuyer | FinancingReadiness => {
                SignalCategory::FinancialReadiness
            },
            TimelineUrgency | UrgencyLanguage => SignalCategory::Urgency,
            ObjectionIntensity | PriceObjection => SignalCategory::Objections,
            CommunicationQuality | Formality | MessageLengthTrend => {
                SignalCategory::CommunicationStyle
            },
            DecisionStage | PropertyMatchCount => SignalCategory::DecisionStage,
            FamilyOrientation | RelocationIntent => SignalCategory::Lifestyle,
            VirtualTourEngagement | DigitalEngagement => SignalCategory::TechnicalEngagement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use SignalName::*;
        match self {
            EngagementScore => "engagement_score",
            EmailOpenRate => "email_open_rate",
            PageViews => "page_views",
            ResponseTime => "response_time",
            SourceQuality => "source_quality",
            ActivityRecency => "activity_recency",
            BudgetMatch => "budget_match",
            PreApproval => "pre_approval",
            CashBuyer => "cash_buyer",
            FinancingReadiness => "financing_readiness",
            TimelineUrgency => "timeline_urgency",
            UrgencyLanguage => "urgency_language",
            ObjectionIntensity => "objection_intensity",
            PriceObjection => "price_objection",
            CommunicationQuality => "communication_quality",
            Formality => "formality",
            MessageLengthTrend => "message_length_trend",
            DecisionStage => "decision_stage",
            PropertyMatchCount => "property_match_count",
            FamilyOrientation => "family_orientation",
            RelocationIntent => "relocation_intent",
            VirtualTourEngagement => "virtual_tour_engagement",
            DigitalEngagement => "digital_engagement",
        }
    }

    /// Value used when the owning category fails.
    ///
    /// Presence flags and lexicon counts read as "no evidence" so a failed
    /// category can never clear a bonus or escalation threshold.
    pub fn neutral(&self) -> f64 {
        use SignalName::*;
        match self {
            PreApproval | CashBuyer | UrgencyLanguage | PriceObjection | FamilyOrientation
            | RelocationIntent => 0.0,
            _ => 0.5,
        }
    }

    /// Value used when every category fails.
    ///
    /// Conservative: presence signals are off, rates sit at typical
    /// industry baselines, time signals are mid-range.
    pub fn fallback(&self) -> f64 {
        use SignalName::*;
        match self {
            EngagementScore => 0.3,
            EmailOpenRate => 0.25,
            PageViews => 0.2,
            ResponseTime => 0.5,
            SourceQuality => 0.4,
            ActivityRecency => 0.5,
            BudgetMatch => 0.5,
            PreApproval | CashBuyer => 0.0,
            FinancingReadiness => 0.2,
            TimelineUrgency => 0.3,
            UrgencyLanguage | ObjectionIntensity | PriceObjection => 0.0,
            CommunicationQuality => 0.3,
            Formality | MessageLengthTrend => 0.5,
            DecisionStage => 0.25,
            PropertyMatchCount => 0.1,
            FamilyOrientation | RelocationIntent | VirtualTourEngagement => 0.0,
            DigitalEngagement => 0.1,
        }
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignalName::ALL
            .iter()
            .copied()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| format!("unknown signal '{}'", s))
    }
}

/// Clamp into [0, 1], mapping NaN to 0
#[inline]
pub fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// 1.0 at or below `fast`, 0.0 at or above `slow`, linear between.
/// An empty or inverted window is a step at `fast`; NaN maps to 0.
pub fn linear_decay(value: f64, fast: f64, slow: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value <= fast {
        1.0
    } else if value >= slow || slow <= fast {
        0.0
    } else {
        1.0 - (value - fast) / (slow - fast)
    }
}

/// Fixed-schema feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct SignalVector {
    values: [f64; SIGNAL_COUNT],
}

impl SignalVector {
    /// Every signal at 0.5
    pub fn neutral() -> Self {
        Self {
            values: [0.5; SIGNAL_COUNT],
        }
    }

    /// Documented default used when extraction fails completely
    pub fn fallback() -> Self {
        let mut values = [0.0; SIGNAL_COUNT];
        for name in SignalName::ALL {
            values[name.index()] = name.fallback();
        }
        Self { values }
    }

    pub fn zeros() -> Self {
        Self {
            values: [0.0; SIGNAL_COUNT],
        }
    }

    #[inline]
    pub fn get(&self, name: SignalName) -> f64 {
        self.values[name.index()]
    }

    /// Set a signal, clamping into [0, 1]
    #[inline]
    pub fn set(&mut self, name: SignalName, value: f64) {
        self.values[name.index()] = unit(value);
    }

    pub fn with(mut self, name: SignalName, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalName, f64)> + '_ {
        SignalName::ALL.iter().map(move |n| (*n, self.values[n.index()]))
    }
}

impl Default for SignalVector {
    fn default() -> Self {
        Self::neutral()
    }
}

impl TryFrom<BTreeMap<String, f64>> for SignalVector {
    type Error = String;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut vector = Self::zeros();
        for (key, value) in map {
            let name: SignalName = key.parse()?;
            vector.set(name, value);
        }
        Ok(vector)
    }
}

impl From<SignalVector> for BTreeMap<String, f64> {
    fn from(vector: SignalVector) -> Self {
        vector
            .iter()
            .map(|(n, v)| (n.as_str().to_string(), v))
            .collect()
    }
}

/// Segment-specific signals used by the specialised scoring models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentSignal {
    EmployerAffiliation,
    VaLoanEligibility,
    RelocationTimeline,
    LuxuryIndicators,
    FirstTimeReadiness,
    InvestmentIntent,
    EquityCompensation,
    IndustryStability,
}

pub const SEGMENT_SIGNAL_COUNT: usize = 8;

impl SegmentSignal {
    pub const ALL: [SegmentSignal; SEGMENT_SIGNAL_COUNT] = [
        SegmentSignal::EmployerAffiliation,
        SegmentSignal::VaLoanEligibility,
        SegmentSignal::RelocationTimeline,
        SegmentSignal::LuxuryIndicators,
        SegmentSignal::FirstTimeReadiness,
        SegmentSignal::InvestmentIntent,
        SegmentSignal::EquityCompensation,
        SegmentSignal::IndustryStability,
    ];

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentSignal::EmployerAffiliation => "employer_affiliation",
            SegmentSignal::VaLoanEligibility => "va_loan_eligibility",
            SegmentSignal::RelocationTimeline => "relocation_timeline",
            SegmentSignal::LuxuryIndicators => "luxury_indicators",
            SegmentSignal::FirstTimeReadiness => "first_time_readiness",
            SegmentSignal::InvestmentIntent => "investment_intent",
            SegmentSignal::EquityCompensation => "equity_compensation",
            SegmentSignal::IndustryStability => "industry_stability",
        }
    }
}

impl FromStr for SegmentSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SegmentSignal::ALL
            .iter()
            .copied()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| format!("unknown segment signal '{}'", s))
    }
}

impl fmt::Display for SegmentSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values of every `SegmentSignal`, each in [0, 1]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentSignals {
    values: [f64; SEGMENT_SIGNAL_COUNT],
}

impl SegmentSignals {
    #[inline]
    pub fn get(&self, signal: SegmentSignal) -> f64 {
        self.values[signal.index()]
    }

    #[inline]
    pub fn set(&mut self, signal: SegmentSignal, value: f64) {
        self.values[signal.index()] = unit(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentSignal, f64)> + '_ {
        SegmentSignal::ALL
            .iter()
            .map(move |s| (*s, self.values[s.index()]))
    }
}

/// A model input: either a base signal or a segment-specific signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Feature {
    Base(SignalName),
    Segment(SegmentSignal),
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Base(s) => s.as_str(),
            Feature::Segment(s) => s.as_str(),
        }
    }

    /// Read this feature from the two vectors
    #[inline]
    pub fn read(&self, signals: &SignalVector, segment: &SegmentSignals) -> f64 {
        match self {
            Feature::Base(s) => signals.get(*s),
            Feature::Segment(s) => segment.get(*s),
        }
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // base engagement is commonly written as "engagement"
        let s = if s == "engagement" { "engagement_score" } else { s };
        if let Ok(base) = s.parse::<SignalName>() {
            return Ok(Feature::Base(base));
        }
        s.parse::<SegmentSignal>()
            .map(Feature::Segment)
            .map_err(|_| format!("unknown feature '{}'", s))
    }
}

impl TryFrom<String> for Feature {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Feature> for String {
    fn from(f: Feature) -> Self {
        f.as_str().to_string()
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_decay() {
        assert_eq!(linear_decay(0.5, 1.0, 48.0), 1.0);
        assert_eq!(linear_decay(1.0, 1.0, 48.0), 1.0);
        assert_eq!(linear_decay(48.0, 1.0, 48.0), 0.0);
        assert_eq!(linear_decay(100.0, 1.0, 48.0), 0.0);
        assert!((linear_decay(24.5, 1.0, 48.0) - 0.5).abs() < 1e-9);
        assert_eq!(linear_decay(5.0, 10.0, 10.0), 1.0);
        assert_eq!(linear_decay(12.0, 10.0, 10.0), 0.0);
        assert_eq!(linear_decay(f64::NAN, 1.0, 48.0), 0.0);
    }

    #[test]
    fn test_signal_indices_are_dense() {
        for (i, name) in SignalName::ALL.iter().enumerate() {
            assert_eq!(name.index(), i);
        }
        for (i, s) in SegmentSignal::ALL.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
    }

    #[test]
    fn test_every_category_has_signals() {
        for category in SignalCategory::ALL {
            assert!(category.signals().count() > 0, "{} is empty", category);
        }
    }

    #[test]
    fn test_set_clamps() {
        let mut v = SignalVector::zeros();
        v.set(SignalName::PageViews, 3.0);
        v.set(SignalName::BudgetMatch, -1.0);
        v.set(SignalName::CashBuyer, f64::NAN);
        assert_eq!(v.get(SignalName::PageViews), 1.0);
        assert_eq!(v.get(SignalName::BudgetMatch), 0.0);
        assert_eq!(v.get(SignalName::CashBuyer), 0.0);
    }

    #[test]
    fn test_fallback_in_range() {
        let v = SignalVector::fallback();
        assert!(v.iter().all(|(_, x)| (0.0..=1.0).contains(&x)));
        assert_eq!(v.get(SignalName::SourceQuality), 0.4);
    }

    #[test]
    fn test_serde_as_map() {
        let v = SignalVector::neutral().with(SignalName::CashBuyer, 1.0);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["cash_buyer"], 1.0);
        let back: SignalVector = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);

        let bad = serde_json::json!({"not_a_signal": 1.0});
        assert!(serde_json::from_value::<SignalVector>(bad).is_err());
    }

    #[test]
    fn test_feature_parse() {
        assert_eq!(
            "engagement".parse::<Feature>().unwrap(),
            Feature::Base(SignalName::EngagementScore)
        );
        assert_eq!(
            "va_loan_eligibility".parse::<Feature>().unwrap(),
            Feature::Segment(SegmentSignal::VaLoanEligibility)
        );
        assert!("unknown".parse::<Feature>().is_err());
    }
}
