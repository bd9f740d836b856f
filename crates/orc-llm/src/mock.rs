// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{AskRequest, AssistantMessage, LlmError, ModelProvider};
use orc_types::Role;

/// Deterministic mock provider for tests. Echoes the last user message back
/// as the assistant response.
#[derive(Default)]
pub struct EchoModel;

#[async_trait]
impl ModelProvider for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    async fn ask(&self, req: AskRequest) -> Result<AssistantMessage, LlmError> {
        let reply = req
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "[no input]".into());
        Ok(AssistantMessage::text(reply))
    }
}

/// A pre-scripted mock provider. Each call to [`ask`](ModelProvider::ask)
/// pops the next reply from the front of the queue, looping back to the
/// last one once exhausted. Lets tests drive the Base Agent Loop (§4.3)
/// and Planner Agent (§4.4) through an exact sequence of replies, including
/// tool calls, without network access.
pub struct MockModel {
    replies: Arc<Mutex<Vec<AssistantMessage>>>,
    name: String,
    /// The most recent request this mock observed, for assertions.
    pub last_request: Arc<Mutex<Option<AskRequest>>>,
}

impl MockModel {
    pub fn new(replies: Vec<AssistantMessage>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies)),
            name: "mock".into(),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Convenience: a mock that always returns the same text reply.
    pub fn always_text(reply: impl Into<String>) -> Self {
        Self::new(vec![AssistantMessage::text(reply)])
    }
}

#[async_trait]
impl ModelProvider for MockModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ask(&self, req: AskRequest) -> Result<AssistantMessage, LlmError> {
        *self.last_request.lock().unwrap() = Some(req);
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(AssistantMessage::text("[no more scripted replies]"));
        }
        if replies.len() == 1 {
            Ok(replies[0].clone())
        } else {
            Ok(replies.remove(0))
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
