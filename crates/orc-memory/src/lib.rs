// SPDX-License-Identifier: MIT
//! The working-memory log an agent's Base Loop reads and appends to: an
//! ordered message history plus the token-budget bookkeeping and compaction
//! that keep it within a model's context window.

mod compaction;

use orc_config::{CompactionStrategy, MemoryConfig};
use orc_types::{Message, Role};

/// A value-based copy of a [`Memory`]'s state, suitable for persisting
/// alongside an `AgentContext` and restoring later unchanged.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MemorySnapshot {
    pub messages: Vec<Message>,
}

/// The message log for one agent, with token-budgeted compaction.
#[derive(Debug, Clone)]
pub struct Memory {
    messages: Vec<Message>,
    max_total_tokens: usize,
    preserve_recent_messages: usize,
    per_message_token_cap: usize,
    strategy: CompactionStrategy,
}

impl Memory {
    pub fn new(max_total_tokens: usize, preserve_recent_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_total_tokens,
            preserve_recent_messages,
            per_message_token_cap: 0,
            strategy: CompactionStrategy::Structured,
        }
    }

    /// Derives the token budget and compaction knobs from a loaded
    /// configuration section and a model's context window.
    pub fn from_config(cfg: &MemoryConfig, context_window: usize) -> Self {
        let usable = context_window as f32 * (1.0 - cfg.compaction_overhead_reserve);
        let max_total_tokens = (usable * cfg.compaction_threshold) as usize;
        Self {
            messages: Vec::new(),
            max_total_tokens,
            preserve_recent_messages: cfg.compaction_keep_recent,
            per_message_token_cap: cfg.tool_result_token_cap,
            strategy: cfg.compaction_strategy,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn estimated_tokens(&self) -> usize {
        compaction::estimate_tokens(&self.messages)
    }

    /// Appends one message, compacting afterward if the budget is exceeded.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.maybe_compact();
    }

    /// Appends every message or none: if the batch is empty this is a no-op,
    /// otherwise all messages land before compaction runs once.
    pub fn append_many(&mut self, messages: impl IntoIterator<Item = Message>) {
        let batch: Vec<Message> = messages.into_iter().collect();
        if batch.is_empty() {
            return;
        }
        self.messages.extend(batch);
        self.maybe_compact();
    }

    /// The most recent system message, if any — the one a prompt should use.
    pub fn latest_system(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::System)
    }

    /// Every message that isn't a system message, oldest first.
    pub fn non_system(&self) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.role != Role::System).collect()
    }

    /// The latest system message followed by every non-system message, in
    /// the order a request to a model should see them.
    pub fn with_latest_system(&self) -> Vec<&Message> {
        let mut out = Vec::with_capacity(self.messages.len());
        if let Some(sys) = self.latest_system() {
            out.push(sys);
        }
        out.extend(self.non_system());
        out
    }

    /// Removes at most one trailing message: a dangling tool result with no
    /// following assistant turn, or a user turn that never got a response.
    /// A no-op on any other trailing state (e.g. the log already ends on a
    /// completed assistant turn).
    pub fn rollback(&mut self) {
        match self.messages.last().map(|m| m.role) {
            Some(Role::Tool) | Some(Role::User) => {
                self.messages.pop();
            }
            _ => {}
        }
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot { messages: self.messages.clone() }
    }

    pub fn restore(&mut self, snapshot: MemorySnapshot) {
        self.messages = snapshot.messages;
    }

    /// Forces the Structured compaction procedure regardless of budget,
    /// for callers (e.g. a manual "/compact" request) that want it applied
    /// immediately rather than waiting for the next append to cross the
    /// threshold.
    pub fn compact_now(&mut self) {
        self.messages = compaction::compress_structured(
            &self.messages,
            self.preserve_recent_messages,
            self.per_message_token_cap,
        );
    }

    /// Builds the request to hand a model when `strategy` is `Narrative`:
    /// the caller sends it, gets back a summary, and replaces memory with
    /// a single system message holding that summary plus the preserved tail.
    pub fn narrative_compaction_request(&self) -> Message {
        compaction::narrative_compaction_request(&self.messages)
    }

    /// Completes a narrative compaction once the caller has the model's
    /// summary in hand.
    pub fn apply_narrative_summary(&mut self, summary: impl Into<String>) {
        let system = self.latest_system().cloned();
        let non_system: Vec<Message> = self.non_system().into_iter().cloned().collect();
        let split = non_system.len().saturating_sub(self.preserve_recent_messages);
        let recent = non_system[split..].to_vec();

        let mut out = Vec::with_capacity(2 + recent.len());
        if let Some(sys) = system {
            out.push(sys);
        }
        out.push(Message::system(summary.into()));
        out.extend(recent);
        self.messages = out;
    }

    fn maybe_compact(&mut self) {
        if self.max_total_tokens == 0 || self.estimated_tokens() <= self.max_total_tokens {
            return;
        }
        match self.strategy {
            CompactionStrategy::Structured => self.compact_now(),
            // Narrative compaction needs a model round trip the caller must
            // drive; signal nothing here beyond leaving memory as-is so the
            // caller can notice the budget is exceeded and call
            // `narrative_compaction_request` / `apply_narrative_summary`.
            CompactionStrategy::Narrative => {}
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
