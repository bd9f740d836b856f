// SPDX-License-Identifier: MIT
//! Per-agent event replay buffer and live subscriber fan-out.

mod broadcaster;
mod buffer;
mod subscriber;

pub use broadcaster::Broadcaster;
pub use buffer::EventBuffer;
pub use subscriber::Subscriber;

use orc_config::EventsConfig;
use uuid::Uuid;

impl Broadcaster {
    pub fn from_config(agent_id: Uuid, cfg: &EventsConfig) -> Self {
        Self::new(agent_id, cfg.ring_buffer_capacity, cfg.subscriber_queue_capacity)
    }
}
