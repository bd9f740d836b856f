// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("llm request failed: {0}")]
    Llm(#[from] orc_llm::LlmError),
    #[error("iteration limit reached")]
    IterationLimit,
    #[error("planner could not recover a plan after {0} attempts")]
    PlanParseFailed(u32),
}
