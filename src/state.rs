// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use orc_config::Config;
use orc_events::Broadcaster;
use orc_llm::ModelProvider;
use orc_repo::{AgentContextRepository, ConversationRepository};
use orc_tools::ToolRegistry;

use crate::runtime::AgentHandle;

/// Everything shared across HTTP handlers. One `AppState` per process;
/// per-agent state lives behind the `runtimes` map instead.
pub struct AppState {
    pub config: Config,
    pub model: Arc<dyn ModelProvider>,
    pub tools: Arc<ToolRegistry>,
    pub context_repo: Arc<dyn AgentContextRepository>,
    pub conversation_repo: Arc<dyn ConversationRepository>,
    pub runtimes: Mutex<HashMap<Uuid, AgentHandle>>,
}

impl AppState {
    pub fn new(
        config: Config,
        model: Arc<dyn ModelProvider>,
        tools: Arc<ToolRegistry>,
        context_repo: Arc<dyn AgentContextRepository>,
        conversation_repo: Arc<dyn ConversationRepository>,
    ) -> Self {
        Self { config, model, tools, context_repo, conversation_repo, runtimes: Mutex::new(HashMap::new()) }
    }

    pub async fn broadcaster_for(&self, agent_id: Uuid) -> Option<Arc<Mutex<Broadcaster>>> {
        self.runtimes.lock().await.get(&agent_id).map(|h| h.broadcaster.clone())
    }
}
