// SPDX-License-Identifier: MIT
//! Replay-then-live iteration over one agent's event history: a subscriber
//! joining at sequence `s` first drains everything already buffered at or
//! after `s`, then gets new events as they're broadcast.
//!
//! Delivery is at-least-once: an event published in the gap between the
//! replay read and subscriber registration can show up twice (once from
//! replay, once live). Consumers are expected to dedupe by
//! [`orc_types::ConversationEvent::sequence`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use orc_events::Broadcaster;
use orc_types::ConversationEvent;
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

/// Default live-phase poll timeout: how long `next()` blocks before emitting
/// a keep-alive tick and looping, per the 30-second subscriber wait.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// One consumer's progress through an agent's event log. Produced by
/// [`EventStream::open`], driven by repeated calls to [`EventStream::next`].
pub struct EventStream {
    broadcaster: Arc<Mutex<Broadcaster>>,
    subscriber_id: Option<Uuid>,
    receiver: Option<mpsc::Receiver<ConversationEvent>>,
    replay: VecDeque<ConversationEvent>,
    poll_timeout: Duration,
    finished: bool,
}

impl EventStream {
    /// Opens a stream starting at `from_sequence`. If the broadcaster's last
    /// known event is already `done`, the stream replays and terminates
    /// without ever registering a live subscriber.
    pub async fn open(broadcaster: Arc<Mutex<Broadcaster>>, from_sequence: u64, poll_timeout: Duration) -> Self {
        let mut guard = broadcaster.lock().await;
        let replay: VecDeque<ConversationEvent> = guard.events_from(from_sequence).into();

        // Registration happens in the same critical section as the replay
        // read, before anything else can be broadcast — that's what keeps
        // the replay/live handoff from silently dropping an event.
        let (subscriber_id, receiver, finished) = if guard.has_done_as_last() {
            (None, None, true)
        } else {
            let (id, rx) = guard.subscribe();
            (Some(id), Some(rx), false)
        };
        drop(guard);

        Self { broadcaster, subscriber_id, receiver, replay, poll_timeout, finished }
    }

    pub async fn with_default_timeout(broadcaster: Arc<Mutex<Broadcaster>>, from_sequence: u64) -> Self {
        Self::open(broadcaster, from_sequence, DEFAULT_POLL_TIMEOUT).await
    }

    /// Pulls the next event: replay first, then the live queue. Returns
    /// `None` once the stream has yielded a `done` event or its subscriber
    /// has been torn down. Timeouts on the live queue are swallowed and the
    /// wait restarts — callers should treat a slow `next()` as a keep-alive,
    /// not a failure.
    pub async fn next(&mut self) -> Option<ConversationEvent> {
        if let Some(event) = self.replay.pop_front() {
            if event.event.is_done() {
                self.finished = true;
                self.unregister().await;
            }
            return Some(event);
        }
        if self.finished {
            return None;
        }
        let receiver = self.receiver.as_mut()?;
        loop {
            match timeout(self.poll_timeout, receiver.recv()).await {
                Ok(Some(event)) => {
                    if event.event.is_done() {
                        self.finished = true;
                        self.unregister().await;
                    }
                    return Some(event);
                }
                Ok(None) => {
                    self.finished = true;
                    return None;
                }
                Err(_) => continue,
            }
        }
    }

    /// Deregisters this stream's subscriber, if still registered. Idempotent.
    pub async fn unregister(&mut self) {
        if let Some(id) = self.subscriber_id.take() {
            self.broadcaster.lock().await.unsubscribe(id);
            debug!(subscriber = %id, "event stream consumer disconnected");
        }
        self.receiver = None;
    }
}

impl Drop for EventStream {
    /// Best-effort cleanup for consumers that get cancelled without calling
    /// `unregister` explicitly (e.g. an SSE connection dropped mid-stream).
    fn drop(&mut self) {
        if let Some(id) = self.subscriber_id.take() {
            if let Ok(mut guard) = self.broadcaster.try_lock() {
                guard.unsubscribe(id);
            }
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
