// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP/SSE surface binds to.
    #[serde(default = "ServerConfig::default_bind_addr")]
    pub bind_addr: String,
}

impl ServerConfig {
    fn default_bind_addr() -> String {
        "127.0.0.1:8080".into()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: Self::default_bind_addr(),
        }
    }
}

fn default_max_iterations() -> u32 {
    30
}
fn default_planner_max_iterations() -> u32 {
    3
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_interval_secs() -> f64 {
    1.0
}
fn default_step_timeout_secs() -> u64 {
    0
}
fn default_run_timeout_secs() -> u64 {
    0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum ask-LLM/dispatch-tool rounds for the Base Agent Loop (§4.3)
    /// before it stops and emits `error("iteration limit")`.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Iteration bound for the Planner Agent (§4.4), which never calls tools.
    #[serde(default = "default_planner_max_iterations")]
    pub planner_max_iterations: u32,
    /// Per-step wall-clock timeout in seconds (0 = no limit).
    #[serde(default = "default_step_timeout_secs")]
    pub max_step_timeout_secs: u64,
    /// Total run wall-clock timeout in seconds (0 = no limit).
    #[serde(default = "default_run_timeout_secs")]
    pub max_run_timeout_secs: u64,
    /// System prompt override; `None` uses the built-in prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            planner_max_iterations: default_planner_max_iterations(),
            max_step_timeout_secs: default_step_timeout_secs(),
            max_run_timeout_secs: default_run_timeout_secs(),
            system_prompt: None,
        }
    }
}

fn default_compaction_threshold() -> f32 {
    0.85
}
fn default_compaction_keep_recent() -> usize {
    6
}
fn default_compaction_overhead_reserve() -> f32 {
    0.10
}
fn default_tool_result_token_cap() -> usize {
    4000
}

/// Strategy used when compacting the session's message log (§4.1.1).
///
/// `Structured` (default) produces a typed checkpoint with fixed sections.
/// `Narrative` asks the LLM for a free-form summary instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompactionStrategy {
    #[default]
    Structured,
    Narrative,
}

impl std::fmt::Display for CompactionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompactionStrategy::Structured => write!(f, "structured"),
            CompactionStrategy::Narrative => write!(f, "narrative"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Token fraction of the usable budget at which compaction triggers.
    #[serde(default = "default_compaction_threshold")]
    pub compaction_threshold: f32,
    /// Number of most-recent non-system messages kept verbatim; older
    /// messages are folded into the compaction checkpoint.
    #[serde(default = "default_compaction_keep_recent")]
    pub compaction_keep_recent: usize,
    /// Compaction checkpoint format.
    #[serde(default)]
    pub compaction_strategy: CompactionStrategy,
    /// Fraction of the budget reserved for tool schemas and measurement
    /// error in the token approximation.
    #[serde(default = "default_compaction_overhead_reserve")]
    pub compaction_overhead_reserve: f32,
    /// Maximum tokens allowed for a single tool result before deterministic
    /// truncation (0 disables truncation).
    #[serde(default = "default_tool_result_token_cap")]
    pub tool_result_token_cap: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            compaction_threshold: default_compaction_threshold(),
            compaction_keep_recent: default_compaction_keep_recent(),
            compaction_strategy: CompactionStrategy::Structured,
            compaction_overhead_reserve: default_compaction_overhead_reserve(),
            tool_result_token_cap: default_tool_result_token_cap(),
        }
    }
}

fn default_tool_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Maximum retry attempts for a raised-exception tool failure (§4.2).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Linear backoff base in seconds: sleep = `retry_interval_secs * attempt`.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: f64,
    /// Timeout in seconds for a single tool call.
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
    /// Automatically approve shell commands matching these glob patterns.
    #[serde(default)]
    pub auto_approve_patterns: Vec<String>,
    /// Block shell commands matching these glob patterns regardless of
    /// auto-approve (deny always wins, §4.2).
    #[serde(default)]
    pub deny_patterns: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_interval_secs: default_retry_interval_secs(),
            timeout_secs: default_tool_timeout_secs(),
            auto_approve_patterns: vec!["cat *".into(), "ls *".into(), "grep *".into()],
            deny_patterns: vec!["rm -rf /*".into(), "dd if=*".into()],
        }
    }
}

fn default_ring_buffer_capacity() -> usize {
    1000
}
fn default_subscriber_queue_capacity() -> usize {
    100
}
fn default_subscriber_idle_timeout_secs() -> u64 {
    30 * 60
}
fn default_live_poll_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Number of most-recent events retained per agent in the replay ring
    /// buffer (§4.7); earliest is evicted once exceeded.
    #[serde(default = "default_ring_buffer_capacity")]
    pub ring_buffer_capacity: usize,
    /// Bounded per-subscriber queue capacity; overflow disconnects the
    /// subscriber rather than blocking the producer (§5).
    #[serde(default = "default_subscriber_queue_capacity")]
    pub subscriber_queue_capacity: usize,
    /// Idle duration after which a subscriber with no live activity is
    /// evicted.
    #[serde(default = "default_subscriber_idle_timeout_secs")]
    pub subscriber_idle_timeout_secs: u64,
    /// Long-poll timeout while the stream waits on the live queue (§4.8);
    /// each tick refreshes the subscriber's last-activity timestamp.
    #[serde(default = "default_live_poll_timeout_secs")]
    pub live_poll_timeout_secs: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            ring_buffer_capacity: default_ring_buffer_capacity(),
            subscriber_queue_capacity: default_subscriber_queue_capacity(),
            subscriber_idle_timeout_secs: default_subscriber_idle_timeout_secs(),
            live_poll_timeout_secs: default_live_poll_timeout_secs(),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
