// SPDX-License-Identifier: MIT
//! Storage traits for conversation history and agent context snapshots,
//! each with an in-memory backend. A durable backend plugs in behind the
//! same trait; choosing and wiring one is left to the binary.

mod agent_context;
mod conversation;
mod error;

pub use agent_context::{AgentContextRepository, InMemoryAgentContextRepository};
pub use conversation::{ConversationHistory, ConversationRepository, InMemoryConversationRepository};
pub use error::RepoError;
