// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

use orc_types::{Message, ToolCallDescriptor};

/// A tool schema offered to the model alongside the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema of the parameters object.
    pub parameters: serde_json::Value,
}

/// Hint asking the model to constrain its reply to a JSON shape. The
/// Planner Agent (§4.4) sets this when it wants structured plan output;
/// the Base Agent Loop leaves it `None` for free-form replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFormat {
    /// JSON Schema the reply's content should conform to, when parsed as JSON.
    pub schema: serde_json::Value,
}

/// The single primitive every provider implements (§6): `ask(messages,
/// tools?, response_format?) -> AssistantMessage`.
#[derive(Debug, Clone, Default)]
pub struct AskRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSchema>,
    pub response_format: Option<ResponseFormat>,
}

/// The model's reply to an [`AskRequest`].
///
/// Invariant (I1/I2 per §4.3): `content` is never absent (empty string
/// stands in for null), and at most one tool call is carried — callers
/// that receive several from a raw provider response keep the first and
/// discard the rest before constructing this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub content: String,
    pub tool_call: Option<ToolCallDescriptor>,
}

impl AssistantMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_call: None,
        }
    }

    pub fn tool_call(content: impl Into<String>, call: ToolCallDescriptor) -> Self {
        Self {
            content: content.into(),
            tool_call: Some(call),
        }
    }

    pub fn has_tool_call(&self) -> bool {
        self.tool_call.is_some()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
