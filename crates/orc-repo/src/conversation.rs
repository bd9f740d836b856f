// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orc_types::{AgentEvent, ConversationEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RepoError;

/// Header record for one agent's conversation: everything but the event
/// log itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub agent_id: Uuid,
    pub user_id: String,
    pub title: String,
    pub flow_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationHistory {
    pub fn new(agent_id: Uuid, user_id: impl Into<String>, title: impl Into<String>, flow_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self { agent_id, user_id: user_id.into(), title: title.into(), flow_type: flow_type.into(), created_at: now, updated_at: now }
    }
}

/// Durable append-only log keyed by (agent_id, sequence). The in-memory
/// backend below serializes every append under its own lock, so the
/// unique-constraint-retry concern a tabular backend would have (two
/// concurrent appenders racing for the same next sequence) can't arise
/// here; a `sqlx`-backed implementation should retry `append_event` with
/// backoff on that collision instead.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn save_history(&self, history: ConversationHistory) -> Result<(), RepoError>;
    async fn get_history(&self, agent_id: Uuid) -> Result<Option<ConversationHistory>, RepoError>;
    async fn append_event(&self, agent_id: Uuid, event: AgentEvent) -> Result<ConversationEvent, RepoError>;
    async fn events_from(&self, agent_id: Uuid, from_sequence: u64) -> Result<Vec<ConversationEvent>, RepoError>;
    async fn delete_history(&self, agent_id: Uuid) -> Result<bool, RepoError>;
    async fn list_histories(&self, user_id: &str, limit: usize, offset: usize) -> Result<Vec<ConversationHistory>, RepoError>;
}

#[derive(Default)]
struct Store {
    histories: HashMap<Uuid, ConversationHistory>,
    events: HashMap<Uuid, Vec<ConversationEvent>>,
    by_user: HashMap<String, Vec<Uuid>>,
}

pub struct InMemoryConversationRepository {
    inner: Mutex<Store>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Store::default()) }
    }
}

impl Default for InMemoryConversationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn save_history(&self, history: ConversationHistory) -> Result<(), RepoError> {
        let mut guard = self.inner.lock().unwrap();
        let agents = guard.by_user.entry(history.user_id.clone()).or_default();
        if !agents.contains(&history.agent_id) {
            agents.push(history.agent_id);
        }
        guard.histories.insert(history.agent_id, history);
        Ok(())
    }

    async fn get_history(&self, agent_id: Uuid) -> Result<Option<ConversationHistory>, RepoError> {
        Ok(self.inner.lock().unwrap().histories.get(&agent_id).cloned())
    }

    async fn append_event(&self, agent_id: Uuid, event: AgentEvent) -> Result<ConversationEvent, RepoError> {
        let mut guard = self.inner.lock().unwrap();
        if !guard.histories.contains_key(&agent_id) {
            return Err(RepoError::NotFound(agent_id));
        }
        let log = guard.events.entry(agent_id).or_default();
        let next_sequence = log.last().map(|e| e.sequence + 1).unwrap_or(1);
        let stamped = ConversationEvent::new(agent_id, next_sequence, event);
        log.push(stamped.clone());
        if let Some(history) = guard.histories.get_mut(&agent_id) {
            history.updated_at = Utc::now();
        }
        Ok(stamped)
    }

    async fn events_from(&self, agent_id: Uuid, from_sequence: u64) -> Result<Vec<ConversationEvent>, RepoError> {
        let guard = self.inner.lock().unwrap();
        Ok(guard
            .events
            .get(&agent_id)
            .map(|log| log.iter().filter(|e| e.sequence >= from_sequence).cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_history(&self, agent_id: Uuid) -> Result<bool, RepoError> {
        let mut guard = self.inner.lock().unwrap();
        let Some(history) = guard.histories.remove(&agent_id) else {
            return Ok(false);
        };
        guard.events.remove(&agent_id);
        if let Some(agents) = guard.by_user.get_mut(&history.user_id) {
            agents.retain(|id| *id != agent_id);
        }
        Ok(true)
    }

    async fn list_histories(&self, user_id: &str, limit: usize, offset: usize) -> Result<Vec<ConversationHistory>, RepoError> {
        let guard = self.inner.lock().unwrap();
        let ids = guard.by_user.get(user_id).cloned().unwrap_or_default();
        let mut result: Vec<ConversationHistory> = ids.into_iter().filter_map(|id| guard.histories.get(&id).cloned()).collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(result.into_iter().skip(offset).take(limit).collect())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
