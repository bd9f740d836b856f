// SPDX-License-Identifier: MIT
use async_trait::async_trait;

use crate::{AskRequest, AssistantMessage, LlmError};

/// The LLM gateway consumed by the agent core (§6): a single primitive,
/// `ask(messages, tools?, response_format?) -> AssistantMessage`. Provider
/// implementations (API drivers) live outside this crate; only the
/// abstraction and a deterministic [`crate::MockModel`] for tests live here.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Human-readable provider name for logging.
    fn name(&self) -> &str;

    /// Send one request and return the model's normalized reply.
    async fn ask(&self, req: AskRequest) -> Result<AssistantMessage, LlmError>;
}
