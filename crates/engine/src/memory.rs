//! In-memory collaborators for tests and single-process deployments

use async_trait::async_trait;
use dashmap::DashMap;
use lead_intel_core::{
    AgentDirectory, AgentProfile, ConversationStore, ConversationTurn, LeadRecord, LeadStore,
    RoutingError, StoreError,
};
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryLeadStore {
    leads: DashMap<String, LeadRecord>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, lead: LeadRecord) {
        self.leads.insert(lead.id.clone(), lead);
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn get_lead(&self, lead_id: &str) -> Result<LeadRecord, StoreError> {
        self.leads
            .get(lead_id)
            .map(|l| l.clone())
            .ok_or_else(|| StoreError::NotFound(lead_id.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    histories: DashMap<String, Vec<ConversationTurn>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, lead_id: &str, turn: ConversationTurn) {
        self.histories
            .entry(lead_id.to_string())
            .or_default()
            .push(turn);
    }

    pub fn replace(&self, lead_id: &str, turns: Vec<ConversationTurn>) {
        self.histories.insert(lead_id.to_string(), turns);
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get_history(&self, lead_id: &str) -> Result<Vec<ConversationTurn>, StoreError> {
        Ok(self
            .histories
            .get(lead_id)
            .map(|h| h.clone())
            .unwrap_or_default())
    }
}

/// Agent roster held in process; assignments bump the agent's load
#[derive(Debug, Default)]
pub struct InMemoryAgentDirectory {
    agents: RwLock<Vec<AgentProfile>>,
    assignments: RwLock<Vec<(String, String)>>,
}

impl InMemoryAgentDirectory {
    pub fn new(agents: Vec<AgentProfile>) -> Self {
        Self {
            agents: RwLock::new(agents),
            assignments: RwLock::new(Vec::new()),
        }
    }

    /// Replace the roster, e.g. after an external refresh
    pub fn refresh(&self, agents: Vec<AgentProfile>) {
        *self.agents.write() = agents;
    }

    /// `(agent_id, lead_id)` pairs in assignment order
    pub fn assignments(&self) -> Vec<(String, String)> {
        self.assignments.read().clone()
    }

    pub fn agent(&self, agent_id: &str) -> Option<AgentProfile> {
        self.agents.read().iter().find(|a| a.id == agent_id).cloned()
    }
}

#[async_trait]
impl AgentDirectory for InMemoryAgentDirectory {
    async fn snapshot(&self) -> Result<Vec<AgentProfile>, RoutingError> {
        Ok(self.agents.read().clone())
    }

    async fn record_assignment(&self, agent_id: &str, lead_id: &str) -> Result<(), RoutingError> {
        {
            let mut agents = self.agents.write();
            let agent = agents
                .iter_mut()
                .find(|a| a.id == agent_id)
                .ok_or_else(|| RoutingError::Directory(format!("unknown agent '{}'", agent_id)))?;
            agent.current_load = agent.current_load.saturating_add(1);
        }
        self.assignments
            .write()
            .push((agent_id.to_string(), lead_id.to_string()));
        tracing::debug!(agent_id = %agent_id, lead_id = %lead_id, "Assignment recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_lead_store() {
        let store = InMemoryLeadStore::new();
        store.insert(LeadRecord::new("a").with_budget(1.0));
        assert_eq!(store.get_lead("a").await.unwrap().budget, Some(1.0));
        assert_eq!(
            store.get_lead("b").await,
            Err(StoreError::NotFound("b".to_string()))
        );
    }

    #[tokio::test]
    async fn test_conversation_store_defaults_empty() {
        let store = InMemoryConversationStore::new();
        assert!(store.get_history("a").await.unwrap().is_empty());
        store.append("a", ConversationTurn::lead("hi", Utc::now()));
        assert_eq!(store.get_history("a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assignment_increments_load() {
        let directory = InMemoryAgentDirectory::new(vec![AgentProfile::new("agent-1", 5)]);
        directory.record_assignment("agent-1", "lead-1").await.unwrap();
        assert_eq!(directory.agent("agent-1").unwrap().current_load, 1);
        assert_eq!(directory.assignments().len(), 1);
        assert!(directory.record_assignment("nobody", "lead-1").await.is_err());
    }
}
