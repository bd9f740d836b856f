// SPDX-License-Identifier: MIT
//! The LLM gateway abstraction consumed by the agent core (§6): a single
//! `ask` primitive plus a deterministic mock for tests. Real provider
//! drivers are deliberately out of scope (spec.md §1's Non-goals).

mod error;
mod mock;
mod provider;
mod types;

pub use error::LlmError;
pub use mock::{EchoModel, MockModel};
pub use provider::ModelProvider;
pub use types::{AskRequest, AssistantMessage, ResponseFormat, ToolSchema};
