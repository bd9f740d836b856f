// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::time::Duration;

use orc_types::AgentEvent;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::buffer::EventBuffer;
use crate::subscriber::Subscriber;

/// Fans one agent's events out to every live subscriber, backed by a replay
/// buffer new subscribers can catch up from. Mirrors the broadcast/cleanup
/// shape of a pub-sub dispatcher: non-blocking sends, a subscriber that
/// can't keep up gets dropped rather than stalling everyone else.
pub struct Broadcaster {
    agent_id: Uuid,
    buffer: EventBuffer,
    subscribers: HashMap<Uuid, Subscriber>,
    subscriber_queue_capacity: usize,
}

impl Broadcaster {
    pub fn new(agent_id: Uuid, buffer_capacity: usize, subscriber_queue_capacity: usize) -> Self {
        Self {
            agent_id,
            buffer: EventBuffer::new(agent_id, buffer_capacity),
            subscribers: HashMap::new(),
            subscriber_queue_capacity,
        }
    }

    pub fn agent_id(&self) -> Uuid {
        self.agent_id
    }

    /// Registers a new subscriber and returns its id plus the receiving end
    /// of its mailbox. Callers wanting history should follow up with
    /// [`Broadcaster::events_from`] before draining the live channel.
    pub fn subscribe(&mut self) -> (Uuid, mpsc::Receiver<orc_types::ConversationEvent>) {
        let (tx, rx) = mpsc::channel(self.subscriber_queue_capacity);
        let id = Uuid::new_v4();
        self.subscribers.insert(id, Subscriber::new(id, tx));
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: Uuid) {
        self.subscribers.remove(&id);
    }

    pub fn active_subscriber_count(&self) -> usize {
        self.subscribers.values().filter(|s| s.is_active()).count()
    }

    pub fn events_from(&self, from_sequence: u64) -> Vec<orc_types::ConversationEvent> {
        self.buffer.events_from(from_sequence)
    }

    pub fn has_done_as_last(&self) -> bool {
        self.buffer.has_done_as_last()
    }

    /// Stamps and stores the event, then tries to hand it to every active
    /// subscriber. A subscriber whose mailbox is full is deactivated and
    /// removed after the sweep completes — never mid-iteration, so one
    /// slow subscriber can't skew delivery to the others in this pass.
    pub fn broadcast(&mut self, event: AgentEvent) -> orc_types::ConversationEvent {
        let stamped = self.buffer.push(event);

        let mut dead = Vec::new();
        for sub in self.subscribers.values_mut() {
            if !sub.is_active() {
                continue;
            }
            match sub.try_send(stamped.clone()) {
                Ok(()) => sub.touch(),
                Err(_) => {
                    sub.deactivate();
                    dead.push(sub.id());
                }
            }
        }
        for id in dead {
            debug!(agent_id = %self.agent_id, subscriber = %id, "dropping subscriber with full mailbox");
            self.subscribers.remove(&id);
        }
        stamped
    }

    /// Removes subscribers that haven't had an event delivered in
    /// `idle_timeout`, returning how many were swept.
    pub fn cleanup_idle(&mut self, idle_timeout: Duration) -> usize {
        let stale: Vec<Uuid> =
            self.subscribers.values().filter(|s| s.idle_for() >= idle_timeout).map(|s| s.id()).collect();
        for id in &stale {
            self.subscribers.remove(id);
        }
        stale.len()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
