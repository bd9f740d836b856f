// SPDX-License-Identifier: MIT
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::plan::Plan;
use crate::plan::Step;

/// Tagged sum of everything an agent run can emit (§3). Value-typed and
/// serializable — the only thing a client ever observes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    PlanCreated {
        plan: Plan,
    },
    PlanUpdated {
        plan: Plan,
    },
    StepStarted {
        step: Step,
        plan: Plan,
    },
    StepCompleted {
        step: Step,
        plan: Plan,
    },
    StepFailed {
        step: Step,
        plan: Plan,
    },
    PlanCompleted {
        plan: Plan,
    },
    ToolCalling {
        tool_name: String,
        function_name: String,
        function_args: Value,
    },
    ToolCalled {
        tool_name: String,
        function_name: String,
        function_args: Value,
        function_result: Value,
    },
    Message {
        message: String,
    },
    Report {
        message: String,
    },
    Error {
        error: String,
    },
    Pause,
    UserInput {
        message: String,
        file_ids: Vec<String>,
    },
    Done,
}

impl AgentEvent {
    /// The serde tag for this variant, used as the SSE `event:` field and
    /// the persisted event type column.
    pub fn type_tag(&self) -> &'static str {
        match self {
            AgentEvent::PlanCreated { .. } => "plan_created",
            AgentEvent::PlanUpdated { .. } => "plan_updated",
            AgentEvent::StepStarted { .. } => "step_started",
            AgentEvent::StepCompleted { .. } => "step_completed",
            AgentEvent::StepFailed { .. } => "step_failed",
            AgentEvent::PlanCompleted { .. } => "plan_completed",
            AgentEvent::ToolCalling { .. } => "tool_calling",
            AgentEvent::ToolCalled { .. } => "tool_called",
            AgentEvent::Message { .. } => "message",
            AgentEvent::Report { .. } => "report",
            AgentEvent::Error { .. } => "error",
            AgentEvent::Pause => "pause",
            AgentEvent::UserInput { .. } => "user_input",
            AgentEvent::Done => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, AgentEvent::Done)
    }
}

/// The persisted form of an [`AgentEvent`] (§3). Invariant (I8): for a given
/// agent, `sequence` values form a contiguous `1..=N` range with no gaps or
/// duplicates — enforced by whoever assigns `sequence` (the broadcaster),
/// never by this type itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEvent {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub sequence: u64,
    pub event: AgentEvent,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEvent {
    pub fn new(agent_id: Uuid, sequence: u64, event: AgentEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id,
            sequence,
            event,
            timestamp: Utc::now(),
        }
    }
}
