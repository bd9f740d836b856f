// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// Status shared by [`Plan`] and [`Step`] (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
}

impl StepStatus {
    /// Completed/Failed steps are not mutated again by the planner (I7).
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub description: String,
    pub status: StepStatus,
    pub result: Option<String>,
    pub error: Option<String>,
    pub sub_flow_type: Option<String>,
    pub sub_flow_step: Option<usize>,
}

impl Step {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: StepStatus::Pending,
            result: None,
            error: None,
            sub_flow_type: None,
            sub_flow_step: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub title: String,
    pub goal: String,
    pub steps: Vec<Step>,
    pub status: StepStatus,
}

impl Plan {
    pub fn new(id: impl Into<String>, title: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            goal: goal.into(),
            steps: Vec::new(),
            status: StepStatus::Pending,
        }
    }

    /// Index of the first step whose status is not terminal (I6): the
    /// "next" step. `None` when every step is completed/failed.
    pub fn next_step_index(&self) -> Option<usize> {
        self.steps.iter().position(|s| !s.status.is_terminal())
    }

    pub fn next_step(&self) -> Option<&Step> {
        self.next_step_index().map(|i| &self.steps[i])
    }

    pub fn next_step_mut(&mut self) -> Option<&mut Step> {
        let idx = self.next_step_index()?;
        Some(&mut self.steps[idx])
    }

    /// Apply the Plan Update Rule (§4.4): keep every step strictly before
    /// the first non-terminal step unchanged; replace everything from that
    /// index onward with `new_steps`. Ids must stay unique within the plan
    /// (I5) — callers are responsible for generating fresh ids for the tail.
    pub fn apply_update(&mut self, new_steps: Vec<Step>) {
        let cut = self.next_step_index().unwrap_or(self.steps.len());
        self.steps.truncate(cut);
        self.steps.extend(new_steps);
    }

    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_terminal())
    }
}
