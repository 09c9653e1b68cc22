//! Deterministic content fingerprints
//!
//! Fingerprints hash a canonical JSON rendering (object keys sorted at every
//! level), so two leads that differ only in map key order share a key.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write;

use crate::conversation::ConversationTurn;
use crate::lead::{LeadRecord, MAX_EXTRAS};

/// Render a JSON value with sorted object keys and no whitespace
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                if let Some(v) = map.get(*key) {
                    write_canonical(v, out);
                }
            }
            out.push('}');
        },
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        },
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{:02x}", b);
    }
    s
}

/// SHA-256 of the canonical rendering of any serializable value
pub fn content_hash<T: Serialize>(value: &T) -> String {
    hex(&Sha256::digest(canonical_json(&to_value(value)).as_bytes()))
}

/// Lead attributes as JSON, without the listed top-level keys and with
/// extras bounded the same way every consumer bounds them
fn lead_attributes(lead: &LeadRecord, skip: &[&str]) -> Value {
    let mut value = to_value(lead);
    if let Value::Object(map) = &mut value {
        for key in skip {
            map.remove(*key);
        }
        let bounded: serde_json::Map<String, Value> = lead
            .extras()
            .take(MAX_EXTRAS)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        map.insert("extras".to_string(), Value::Object(bounded));
    }
    value
}

/// Prefix shared by every result-cache key of one lead
///
/// The id is length-prefixed so that one id can never be a prefix of
/// another lead's keys.
pub fn lead_key_prefix(lead_id: &str) -> String {
    format!("{}:{}:", lead_id.len(), lead_id)
}

/// Result-cache fingerprint over lead id, lead attributes and conversation
pub fn request_fingerprint(lead: &LeadRecord, conversation: &[ConversationTurn]) -> String {
    let attrs = content_hash(&lead_attributes(lead, &["id"]));
    let convo = content_hash(&conversation);

    let mut hasher = Sha256::new();
    hasher.update(lead.id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(attrs.as_bytes());
    hasher.update([0x1f]);
    hasher.update(convo.as_bytes());
    format!("{}{}", lead_key_prefix(&lead.id), hex(&hasher.finalize()))
}

/// Feature-cache key over extraction-relevant content only.
///
/// Identity fields (id, display name) are excluded so that identical
/// profiles share extracted features across leads.
pub fn feature_fingerprint(lead: &LeadRecord, conversation: &[ConversationTurn]) -> String {
    let attrs = lead_attributes(lead, &["id", "name"]);
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(&attrs).as_bytes());
    hasher.update([0x1f]);
    hasher.update(canonical_json(&to_value(&conversation)).as_bytes());
    hex(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn ts() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let a = json!({"b": 1, "a": {"z": true, "y": [1, 2]}});
        let b = json!({"a": {"y": [1, 2], "z": true}, "b": 1});
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(canonical_json(&a), r#"{"a":{"y":[1,2],"z":true},"b":1}"#);
    }

    #[test]
    fn test_fingerprint_stable_across_key_order() {
        let a = LeadRecord::new("lead-1")
            .with_extra("beta", 2)
            .with_extra("alpha", 1);
        let b = LeadRecord::new("lead-1")
            .with_extra("alpha", 1)
            .with_extra("beta", 2);
        assert_eq!(request_fingerprint(&a, &[]), request_fingerprint(&b, &[]));
    }

    #[test]
    fn test_fingerprint_differs_by_conversation() {
        let lead = LeadRecord::new("lead-1").with_budget(500_000.0);
        let c1 = vec![ConversationTurn::lead("hello", ts())];
        let c2 = vec![ConversationTurn::lead("hello there", ts())];
        assert_ne!(
            request_fingerprint(&lead, &c1),
            request_fingerprint(&lead, &c2)
        );
    }

    #[test]
    fn test_fingerprint_prefix() {
        let lead = LeadRecord::new("lead-1");
        let fp = request_fingerprint(&lead, &[]);
        assert!(fp.starts_with(&lead_key_prefix("lead-1")));
        assert!(!fp.starts_with(&lead_key_prefix("lead-")));
    }

    #[test]
    fn test_feature_fingerprint_ignores_identity() {
        let mut a = LeadRecord::new("a").with_budget(400_000.0);
        a.name = Some("Alex".to_string());
        let b = LeadRecord::new("b").with_budget(400_000.0);
        assert_eq!(feature_fingerprint(&a, &[]), feature_fingerprint(&b, &[]));

        let c = LeadRecord::new("c").with_budget(410_000.0);
        assert_ne!(feature_fingerprint(&a, &[]), feature_fingerprint(&c, &[]));
    }
}
