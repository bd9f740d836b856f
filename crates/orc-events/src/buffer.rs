// SPDX-License-Identifier: MIT
use std::collections::VecDeque;

use orc_types::{AgentEvent, ConversationEvent};
use uuid::Uuid;

/// Fixed-capacity replay log for one agent: evicts the oldest event once
/// `capacity` is exceeded, but sequence numbers keep counting up regardless
/// of eviction (I8: sequences stay contiguous even after old events fall
/// out of the window).
pub struct EventBuffer {
    agent_id: Uuid,
    capacity: usize,
    events: VecDeque<ConversationEvent>,
    current_sequence: u64,
}

impl EventBuffer {
    pub fn new(agent_id: Uuid, capacity: usize) -> Self {
        Self { agent_id, capacity, events: VecDeque::with_capacity(capacity.min(1024)), current_sequence: 0 }
    }

    pub fn current_sequence(&self) -> u64 {
        self.current_sequence
    }

    /// Assigns the next sequence number, stores the event, and returns the
    /// stamped [`ConversationEvent`].
    pub fn push(&mut self, event: AgentEvent) -> ConversationEvent {
        self.current_sequence += 1;
        let stamped = ConversationEvent::new(self.agent_id, self.current_sequence, event);
        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(stamped.clone());
        stamped
    }

    /// Every retained event with `sequence >= from_sequence`, oldest first.
    /// Events evicted by capacity are simply absent — callers past the
    /// retained window get whatever survives, never a gap within it.
    pub fn events_from(&self, from_sequence: u64) -> Vec<ConversationEvent> {
        self.events.iter().filter(|e| e.sequence >= from_sequence).cloned().collect()
    }

    pub fn has_done_as_last(&self) -> bool {
        self.events.back().map(|e| e.event.is_done()).unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_start_at_one_and_increase() {
        let mut buf = EventBuffer::new(Uuid::new_v4(), 10);
        let a = buf.push(AgentEvent::Pause);
        let b = buf.push(AgentEvent::Done);
        assert_eq!(a.sequence, 1);
        assert_eq!(b.sequence, 2);
    }

    #[test]
    fn eviction_keeps_sequence_counting_past_capacity() {
        let mut buf = EventBuffer::new(Uuid::new_v4(), 2);
        buf.push(AgentEvent::Pause);
        buf.push(AgentEvent::Pause);
        let third = buf.push(AgentEvent::Pause);
        assert_eq!(third.sequence, 3);
        assert_eq!(buf.events_from(0).len(), 2);
    }

    #[test]
    fn events_from_zero_returns_everything_retained() {
        let mut buf = EventBuffer::new(Uuid::new_v4(), 10);
        buf.push(AgentEvent::Pause);
        buf.push(AgentEvent::Done);
        assert_eq!(buf.events_from(0).len(), 2);
    }

    #[test]
    fn events_from_sequence_includes_the_boundary_event() {
        let mut buf = EventBuffer::new(Uuid::new_v4(), 10);
        buf.push(AgentEvent::Pause);
        buf.push(AgentEvent::Done);
        let rest = buf.events_from(2);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].sequence, 2);
    }

    #[test]
    fn has_done_as_last_detects_terminal_event() {
        let mut buf = EventBuffer::new(Uuid::new_v4(), 10);
        buf.push(AgentEvent::Pause);
        assert!(!buf.has_done_as_last());
        buf.push(AgentEvent::Done);
        assert!(buf.has_done_as_last());
    }

    #[test]
    fn clear_empties_the_buffer_but_not_the_counter() {
        let mut buf = EventBuffer::new(Uuid::new_v4(), 10);
        buf.push(AgentEvent::Pause);
        buf.clear();
        assert_eq!(buf.events_from(0).len(), 0);
        assert_eq!(buf.current_sequence(), 1);
    }
}
