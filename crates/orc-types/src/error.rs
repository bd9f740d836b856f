// SPDX-License-Identifier: MIT
use thiserror::Error;

/// The error taxonomy of §7, shared across crate boundaries so a caller that
/// only depends on `orc-types` can still match on failure category without
/// depending on every producer crate's own error enum.
#[derive(Debug, Error)]
pub enum OrcError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("persistence conflict: {0}")]
    PersistenceConflict(String),

    #[error("iteration limit reached")]
    IterationLimit,
}
