//! Lead profile types
//!
//! A `LeadRecord` is immutable for the duration of a request. Unknown or
//! missing attributes never fail a request: structured fields are optional
//! and everything else lives in a bounded `extras` side-map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Maximum number of extras read from a lead. Keys beyond this (in key
/// order) are ignored by every consumer.
pub const MAX_EXTRAS: usize = 64;

/// Engagement counters tracked by the marketing stack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementCounters {
    pub emails_sent: u32,
    pub emails_opened: u32,
    pub emails_clicked: u32,
    pub page_views: u32,
    pub sessions: u32,
    pub saved_properties: u32,
    pub property_inquiries: u32,
    /// Average hours the lead takes to answer, when measured upstream
    pub avg_response_hours: Option<f64>,
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// Prospect profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    /// Acquisition channel, e.g. "referral", "zillow"
    #[serde(default)]
    pub source: Option<String>,
    /// Purchase timeline, e.g. "immediate", "3_months"
    #[serde(default)]
    pub timeline: Option<String>,
    /// Financing status, e.g. "cash", "pre_approved", "fha"
    #[serde(default)]
    pub financing: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employer: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub preferred_channel: Option<String>,
    /// Free-text notes captured by intake forms or agents
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub engagement: EngagementCounters,
    #[serde(default)]
    pub extras: BTreeMap<String, Value>,
}

/// Numeric view of one extra attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoercedValue {
    pub value: f64,
    /// True when the raw value had a type that cannot be read as a number
    pub anomaly: bool,
}

/// Coerce a free-form JSON value into a number.
///
/// Numbers pass through, booleans map to 0/1, null maps to 0. Strings that
/// parse as numbers are accepted; anything else maps to 0 and is flagged.
pub fn coerce_value(value: &Value) -> CoercedValue {
    match value {
        Value::Number(n) => CoercedValue {
            value: n.as_f64().unwrap_or(0.0),
            anomaly: false,
        },
        Value::Bool(b) => CoercedValue {
            value: if *b { 1.0 } else { 0.0 },
            anomaly: false,
        },
        Value::Null => CoercedValue {
            value: 0.0,
            anomaly: false,
        },
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => CoercedValue {
                value: v,
                anomaly: false,
            },
            _ => CoercedValue {
                value: 0.0,
                anomaly: true,
            },
        },
        Value::Array(_) | Value::Object(_) => CoercedValue {
            value: 0.0,
            anomaly: true,
        },
    }
}

impl LeadRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_timeline(mut self, timeline: impl Into<String>) -> Self {
        self.timeline = Some(timeline.into());
        self
    }

    pub fn with_financing(mut self, financing: impl Into<String>) -> Self {
        self.financing = Some(financing.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_employer(mut self, employer: impl Into<String>) -> Self {
        self.employer = Some(employer.into());
        self
    }

    pub fn with_occupation(mut self, occupation: impl Into<String>) -> Self {
        self.occupation = Some(occupation.into());
        self
    }

    pub fn with_preferred_channel(mut self, channel: impl Into<String>) -> Self {
        self.preferred_channel = Some(channel.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_engagement(mut self, engagement: EngagementCounters) -> Self {
        self.engagement = engagement;
        self
    }

    /// Add an extra attribute. Ignored once `MAX_EXTRAS` keys are present.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if self.extras.len() >= MAX_EXTRAS && !self.extras.contains_key(&key) {
            tracing::warn!(lead_id = %self.id, key = %key, "Extras limit reached, dropping attribute");
            return self;
        }
        self.extras.insert(key, value.into());
        self
    }

    /// Bounded iteration over extras in key order
    pub fn extras(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.extras.iter().take(MAX_EXTRAS)
    }

    /// Numeric view of an extra attribute, if present within the bound
    pub fn extra(&self, key: &str) -> Option<CoercedValue> {
        self.extras()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| coerce_value(v))
    }

    /// Lowercased concatenation of the free-text profile fields
    pub fn profile_text(&self) -> String {
        [
            &self.occupation,
            &self.employer,
            &self.property_type,
            &self.financing,
            &self.notes,
        ]
        .iter()
        .filter_map(|f| f.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coercion() {
        assert_eq!(coerce_value(&json!(3.5)).value, 3.5);
        assert_eq!(coerce_value(&json!(true)).value, 1.0);
        assert_eq!(coerce_value(&json!(false)).value, 0.0);
        assert_eq!(coerce_value(&Value::Null).value, 0.0);
        assert_eq!(coerce_value(&json!("7")).value, 7.0);

        let odd = coerce_value(&json!({"nested": 1}));
        assert_eq!(odd.value, 0.0);
        assert!(odd.anomaly);
        assert!(coerce_value(&json!("seven")).anomaly);
    }

    #[test]
    fn test_extras_bounded() {
        let mut lead = LeadRecord::new("lead-1");
        for i in 0..(MAX_EXTRAS + 10) {
            lead = lead.with_extra(format!("k{:03}", i), i as f64);
        }
        assert_eq!(lead.extras.len(), MAX_EXTRAS);
        assert!(lead.extra("k000").is_some());
        assert!(lead.extra(&format!("k{:03}", MAX_EXTRAS + 5)).is_none());
    }

    #[test]
    fn test_profile_text() {
        let lead = LeadRecord::new("lead-1")
            .with_occupation("Software Engineer")
            .with_employer("Acme Tech");
        assert_eq!(lead.profile_text(), "software engineer acme tech");
    }

    #[test]
    fn test_deserialize_minimal() {
        let lead: LeadRecord = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(lead.id, "abc");
        assert!(lead.budget.is_none());
        assert_eq!(lead.engagement.emails_sent, 0);
    }
}
