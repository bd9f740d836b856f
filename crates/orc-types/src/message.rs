// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// Who produced a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call the assistant asked to run, carried on an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDescriptor {
    /// Opaque id returned by the model; forwarded verbatim on the matching
    /// tool message's `tool_call_id`.
    pub id: String,
    pub function_name: String,
    /// Raw JSON-string arguments, as returned by the model.
    pub arguments: String,
}

/// One entry in an agent's [`crate::Memory`] log.
///
/// Invariant (I1): `content` is never absent. Construct via [`Message::new`]
/// or [`Message::from_raw`] — both normalize `None`/non-string content to
/// `""`, so every `Message` reachable outside this module already satisfies
/// the invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallDescriptor>,
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Build a message from a possibly-absent content value, normalizing
    /// `None` to an empty string (I1).
    pub fn from_raw(role: Role, content: Option<String>) -> Self {
        Self::new(role, content.unwrap_or_default())
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    pub fn with_tool_call(mut self, call: ToolCallDescriptor) -> Self {
        self.tool_calls = vec![call];
        self
    }

    /// Rough token estimate: Chinese-range characters cost ~1/1.5 token,
    /// everything else ~1/4 token (§4.1.1).
    pub fn approx_tokens(&self) -> usize {
        approx_tokens(&self.content)
    }
}

/// Character-aware token estimate used throughout Memory and compaction.
pub fn approx_tokens(text: &str) -> usize {
    let mut cjk = 0usize;
    let mut other = 0usize;
    for ch in text.chars() {
        if is_cjk(ch) {
            cjk += 1;
        } else {
            other += 1;
        }
    }
    // ceil division so short strings never round down to zero tokens.
    let cjk_tokens = (cjk * 2 + 2) / 3; // ~1 token per 1.5 chars
    let other_tokens = (other + 3) / 4; // ~1 token per 4 chars
    cjk_tokens + other_tokens
}

fn is_cjk(ch: char) -> bool {
    matches!(ch as u32,
        0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF | 0x3000..=0x303F)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Construction ──

    #[test]
    fn from_raw_normalizes_none_to_empty_string() {
        let m = Message::from_raw(Role::Assistant, None);
        assert_eq!(m.content, "");
    }

    #[test]
    fn user_helper_sets_role_and_content() {
        let m = Message::user("hi");
        assert_eq!(m.role, Role::User);
        assert_eq!(m.content, "hi");
    }

    #[test]
    fn tool_helper_sets_tool_call_id() {
        let m = Message::tool("call_1", "result");
        assert_eq!(m.role, Role::Tool);
        assert_eq!(m.tool_call_id.as_deref(), Some("call_1"));
    }

    // ── Token estimation ──

    #[test]
    fn approx_tokens_ascii_quarter_char_count() {
        // 40 ascii chars ≈ 10 tokens
        let s = "a".repeat(40);
        assert_eq!(approx_tokens(&s), 10);
    }

    #[test]
    fn approx_tokens_cjk_counts_higher_per_char() {
        let cjk = "中".repeat(30);
        let ascii = "a".repeat(30);
        assert!(approx_tokens(&cjk) > approx_tokens(&ascii));
    }

    #[test]
    fn approx_tokens_empty_is_zero() {
        assert_eq!(approx_tokens(""), 0);
    }

    // ── Serde ──

    #[test]
    fn role_serializes_snake_case() {
        let s = serde_json::to_string(&Role::Tool).unwrap();
        assert_eq!(s, "\"tool\"");
    }
}
