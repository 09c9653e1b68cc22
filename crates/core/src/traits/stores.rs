//! Lead, conversation and agent data sources

use async_trait::async_trait;

use crate::conversation::ConversationTurn;
use crate::error::{RoutingError, StoreError};
use crate::lead::LeadRecord;
use crate::routing::AgentProfile;

/// Read access to lead profiles
#[async_trait]
pub trait LeadStore: Send + Sync + 'static {
    async fn get_lead(&self, lead_id: &str) -> Result<LeadRecord, StoreError>;
}

/// Read access to conversation history
#[async_trait]
pub trait ConversationStore: Send + Sync + 'static {
    /// Turns in chronological order; empty when the lead never spoke
    async fn get_history(&self, lead_id: &str) -> Result<Vec<ConversationTurn>, StoreError>;
}

/// Agent capability and load data, refreshed outside the core
#[async_trait]
pub trait AgentDirectory: Send + Sync + 'static {
    /// Read-only snapshot used for one routing decision
    async fn snapshot(&self) -> Result<Vec<AgentProfile>, RoutingError>;

    /// Called once a lead has actually been assigned, so the directory can
    /// increment the agent's load counter
    async fn record_assignment(&self, agent_id: &str, lead_id: &str) -> Result<(), RoutingError>;
}
