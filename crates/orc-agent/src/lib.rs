// SPDX-License-Identifier: MIT
//! The agent core: the generic Base Agent Loop and its two specializations,
//! the Planner and the Executor.

mod base_loop;
mod error;
mod executor;
mod planner;
mod repair;

pub use base_loop::{BaseLoop, LoopOutcome, SENTINEL_DONE, SENTINEL_REQUEST_CLARIFICATION};
pub use error::AgentError;
pub use executor::{build_system_prompt, ExecutorAgent, StepOutcome};
pub use planner::{PlanOutcome, PlannerAgent};
pub use repair::{attempt_json_repair, parse_plan_envelope, PlanEnvelope, PlanStepEnvelope};
