// SPDX-License-Identifier: MIT
use std::time::{Duration, Instant};

use orc_types::ConversationEvent;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One listener's bounded mailbox. A full queue means the listener has
/// stopped draining it (crashed connection, abandoned poll); the
/// broadcaster deactivates rather than blocking the whole fan-out on one
/// slow subscriber.
pub struct Subscriber {
    pub(crate) id: Uuid,
    sender: mpsc::Sender<ConversationEvent>,
    last_activity: Instant,
    active: bool,
}

impl Subscriber {
    pub(crate) fn new(id: Uuid, sender: mpsc::Sender<ConversationEvent>) -> Self {
        Self { id, sender, last_activity: Instant::now(), active: true }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    /// Non-blocking send; `Err` means the mailbox is full or the receiver
    /// dropped. Either way the caller should deactivate this subscriber.
    pub(crate) fn try_send(&self, event: ConversationEvent) -> Result<(), mpsc::error::TrySendError<ConversationEvent>> {
        self.sender.try_send(event)
    }
}
