// SPDX-License-Identifier: MIT
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle status of an [`AgentContext`] (§3). Status transitions are
/// monotonic only in the sense that `Deleted` is terminal; the other states
/// may cycle as the flow controller (§4.6) runs multiple turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Created,
    Running,
    Paused,
    Completed,
    Failed,
    Deleted,
}

/// Snapshot of an agent's identity, status, and sandbox binding (§4.10).
/// Indexed by user id and status by whichever [`crate`]-external repository
/// stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContext {
    pub agent_id: Uuid,
    pub user_id: String,
    pub flow_type: String,
    pub status: AgentStatus,
    pub sandbox_id: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl AgentContext {
    pub fn new(agent_id: Uuid, user_id: impl Into<String>, flow_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            agent_id,
            user_id: user_id.into(),
            flow_type: flow_type.into(),
            status: AgentStatus::Created,
            sandbox_id: None,
            last_message: None,
            last_message_at: None,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    pub fn set_status(&mut self, status: AgentStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn set_sandbox_id(&mut self, sandbox_id: impl Into<String>) {
        self.sandbox_id = Some(sandbox_id.into());
        self.updated_at = Utc::now();
    }

    pub fn set_last_message(&mut self, message: impl Into<String>) {
        self.last_message = Some(message.into());
        self.last_message_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }
}
