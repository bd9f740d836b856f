// SPDX-License-Identifier: MIT
use orc_types::{Message, Role};

/// Deterministic, local compression — no LLM call. Builds a single
/// synthetic system message `"[historical summary: N messages, ~T tokens]"`
/// in place of everything older than the preserved tail.
///
/// Idempotent: running this again on memory it already produced finds no
/// messages old enough to fold (the synthetic summary itself counts as the
/// "latest system" message and is preserved verbatim), so it is a no-op.
pub fn compress_structured(
    messages: &[Message],
    preserve_recent: usize,
    tool_result_cap_tokens: usize,
) -> Vec<Message> {
    let system = latest_system(messages).cloned();
    let non_system: Vec<Message> = messages.iter().filter(|m| m.role != Role::System).cloned().collect();

    if non_system.len() <= preserve_recent {
        // Nothing old enough to fold; idempotent no-op.
        return messages.to_vec();
    }

    let split = non_system.len() - preserve_recent;
    let mut older = non_system[..split].to_vec();
    let recent = non_system[split..].to_vec();

    for m in older.iter_mut() {
        if m.role == Role::Tool {
            cap_tool_result(m, tool_result_cap_tokens);
        }
    }

    let folded_tokens: usize = older.iter().map(|m| m.approx_tokens()).sum();
    let most_recent_older = older.last().cloned();

    let mut summary = format!("[historical summary: {} messages, ~{} tokens]", older.len(), folded_tokens);
    if let Some(tail) = most_recent_older {
        summary.push_str("\n\n");
        summary.push_str(&tail.content);
    }

    let mut out = Vec::with_capacity(2 + recent.len());
    if let Some(sys) = system {
        out.push(sys);
    }
    out.push(Message::system(summary));
    out.extend(recent);
    out
}

/// Builds a request for an LLM to narratively summarize the conversation,
/// mirroring the teacher's `compact_session`: the caller sends this to the
/// model and replaces memory with the reply. Selected via
/// `CompactionStrategy::Narrative` instead of the default deterministic path.
pub fn narrative_compaction_request(messages: &[Message]) -> Message {
    const PROMPT: &str = "Summarize the following conversation history in a concise, \
        information-dense way. Preserve technical details, decisions, file names, and \
        tool outputs that may be relevant to future work. The summary will replace the \
        original history to free up context space.";
    let history = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| format!("{:?}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    Message::user(format!("{PROMPT}\n\n---\n\n{history}"))
}

fn latest_system(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.role == Role::System)
}

fn cap_tool_result(message: &mut Message, cap_tokens: usize) {
    if cap_tokens == 0 {
        return;
    }
    let cap_chars = cap_tokens * 4;
    if message.content.len() <= cap_chars {
        return;
    }
    let mut cut = cap_chars.min(message.content.len());
    while cut > 0 && !message.content.is_char_boundary(cut) {
        cut -= 1;
    }
    message.content.truncate(cut);
    message.content.push_str(" ...");
}

pub fn estimate_tokens(messages: &[Message]) -> usize {
    messages.iter().map(Message::approx_tokens).sum::<usize>()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<Message> {
        vec![
            Message::system("sys"),
            Message::user("one"),
            Message::assistant("two"),
            Message::user("three"),
            Message::assistant("four"),
            Message::user("five"),
        ]
    }

    #[test]
    fn preserves_system_and_recent_tail() {
        let msgs = history();
        let out = compress_structured(&msgs, 2, 4000);
        assert_eq!(out[0].role, Role::System);
        assert_eq!(out[0].content, "sys");
        assert!(out[1].content.starts_with("[historical summary:"));
        assert_eq!(out[out.len() - 2].content, "four");
        assert_eq!(out[out.len() - 1].content, "five");
    }

    #[test]
    fn nothing_to_fold_is_a_no_op() {
        let msgs = history();
        let out = compress_structured(&msgs, 10, 4000);
        assert_eq!(out.len(), msgs.len());
    }

    #[test]
    fn idempotent_on_already_compressed_memory() {
        let msgs = history();
        let first = compress_structured(&msgs, 2, 4000);
        let second = compress_structured(&first, 2, 4000);
        assert_eq!(first.len(), second.len());
        assert_eq!(second[1].content, first[1].content);
    }

    #[test]
    fn folds_older_messages_into_single_summary() {
        let msgs = history();
        let out = compress_structured(&msgs, 2, 4000);
        // sys + summary + 2 recent = 4
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn caps_oversized_tool_results_before_folding() {
        let msgs = vec![
            Message::system("sys"),
            Message::tool("call-1", "x".repeat(100_000)),
            Message::user("recent"),
        ];
        let out = compress_structured(&msgs, 1, 10);
        assert!(out[1].content.len() < 100_000);
        assert!(out[1].content.contains("..."));
    }

    #[test]
    fn narrative_request_embeds_history_without_system() {
        let msgs = history();
        let req = narrative_compaction_request(&msgs);
        assert!(req.content.contains("one"));
        assert!(!req.content.contains("sys"));
    }
}
