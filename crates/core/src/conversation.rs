//! Conversation history types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Lead,
    Agent,
    System,
}

/// One message in an ordered dialogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(speaker: Speaker, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp,
        }
    }

    pub fn lead(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(Speaker::Lead, text, timestamp)
    }

    pub fn agent(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(Speaker::Agent, text, timestamp)
    }

    pub fn is_lead(&self) -> bool {
        self.speaker == Speaker::Lead
    }
}

/// Lowercased text of every lead-authored turn, space-joined
pub fn lead_text(conversation: &[ConversationTurn]) -> String {
    conversation
        .iter()
        .filter(|t| t.is_lead())
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_text_skips_agent_turns() {
        let now = Utc::now();
        let turns = vec![
            ConversationTurn::agent("Hello, how can I help?", now),
            ConversationTurn::lead("Looking for a HOUSE", now),
            ConversationTurn::lead("ASAP", now),
        ];
        assert_eq!(lead_text(&turns), "looking for a house asap");
    }

    #[test]
    fn test_speaker_serde() {
        let json = serde_json::to_string(&Speaker::Lead).unwrap();
        assert_eq!(json, "\"lead\"");
    }
}
