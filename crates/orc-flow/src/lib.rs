// SPDX-License-Identifier: MIT
//! The per-agent lifecycle state machine driven by Planner/Executor events.
//! Transitions are deterministic and single-threaded per agent — this type
//! holds no I/O, it only tracks what state an agent run is in and what the
//! next legal state is for a given trigger.

use serde::{Deserialize, Serialize};
use tracing::debug;

use orc_types::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    Planning,
    Executing,
    Updating,
    Reporting,
    Completed,
}

/// Inputs the controller reacts to. Each one corresponds to a row of the
/// transition table driving Planner/Executor/flow events into state
/// changes.
#[derive(Debug, Clone)]
pub enum FlowTrigger<'a> {
    /// A new user message arrived — including mid-run, as an interrupt.
    UserMessage,
    /// The planner produced a fresh plan.
    PlanCreated,
    /// A step finished (either way); carries the plan as it stands after
    /// the step settled so the controller can tell whether a next step
    /// remains.
    StepSettled(&'a Plan),
    /// The planner updated the plan after an UPDATING round; carries the
    /// plan as it stands after the update.
    PlanUpdated(&'a Plan),
    /// The planner paused (interpreted as "plan exhausted").
    PlannerPaused,
    /// The executor emitted its final report.
    Reported,
    /// The caller has finished handling a COMPLETED state (emitted
    /// `plan_completed` and `done`) and is ready to go back to idle.
    Acknowledged,
}

/// The six-state machine of §4.6, held per agent.
#[derive(Debug, Clone, Copy)]
pub struct FlowController {
    state: FlowState,
}

impl FlowController {
    pub fn new() -> Self {
        Self { state: FlowState::Idle }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Applies one trigger, returning the resulting state. A trigger that
    /// doesn't apply to the current state (e.g. `Reported` while `Idle`) is
    /// a no-op — the controller stays put.
    pub fn apply(&mut self, trigger: FlowTrigger<'_>) -> FlowState {
        let next = match (self.state, &trigger) {
            (_, FlowTrigger::UserMessage) => FlowState::Planning,
            (FlowState::Planning, FlowTrigger::PlanCreated) => FlowState::Executing,
            (FlowState::Executing, FlowTrigger::StepSettled(plan)) => {
                if plan.next_step_index().is_none() {
                    FlowState::Reporting
                } else {
                    FlowState::Updating
                }
            }
            (FlowState::Updating, FlowTrigger::PlanUpdated(plan)) => {
                if plan.next_step_index().is_some() {
                    FlowState::Executing
                } else {
                    FlowState::Completed
                }
            }
            // A pause can surface from either an UPDATING round (the planner
            // itself asks for clarification) or mid-EXECUTING (a step's tool
            // call is the sentinel that requests clarification) — both mean
            // the same thing: stop and wait for the next user message.
            (FlowState::Updating, FlowTrigger::PlannerPaused) | (FlowState::Executing, FlowTrigger::PlannerPaused) => {
                FlowState::Completed
            }
            (FlowState::Reporting, FlowTrigger::Reported) => FlowState::Completed,
            (FlowState::Completed, FlowTrigger::Acknowledged) => FlowState::Idle,
            (state, _) => state,
        };
        if next != self.state {
            debug!(from = ?self.state, to = ?next, "flow transition");
        }
        self.state = next;
        next
    }
}

impl Default for FlowController {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
