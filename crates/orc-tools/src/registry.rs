// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::truncate::smart_truncate;
use crate::{Tool, ToolCall, ToolExecutionError, ToolOutput};

/// A tool schema offered to the model alongside the conversation.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Invocation policy shared by every call the registry makes.
#[derive(Debug, Clone, Copy)]
pub struct InvokerConfig {
    /// Attempts made, including the first, before giving up.
    pub max_retries: u32,
    /// Linear backoff unit: the Nth retry sleeps `retry_interval * N`.
    pub retry_interval: Duration,
    /// Byte budget a tool's text output is truncated to before it reaches
    /// the conversation.
    pub result_byte_cap: usize,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_interval: Duration::from_secs(1),
            result_byte_cap: 4000,
        }
    }
}

/// Central registry holding all available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    invoker: InvokerConfig,
}

// SAFETY: ToolRegistry is Sync because:
// - HashMap<String, Arc<dyn Tool>> is Sync (String is Sync, Arc<T: Send + Sync> is Sync)
// - Tools implement Send + Sync (required by the Tool trait)
// - No interior mutability exists after construction (all methods take &self)
unsafe impl Sync for ToolRegistry {}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new(), invoker: InvokerConfig::default() }
    }

    pub fn with_invoker(invoker: InvokerConfig) -> Self {
        Self { tools: HashMap::new(), invoker }
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Executes a tool call, retrying transport-level failures with linear
    /// backoff (`retry_interval * attempt`) up to `max_retries` attempts,
    /// then truncates the result to `result_byte_cap` using the tool's
    /// declared [`crate::OutputCategory`]. A logically-failed-but-produced
    /// result is returned immediately without retrying.
    pub async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(tool) = self.tools.get(&call.name) else {
            return ToolOutput::err(&call.id, format!("unknown tool: {}", call.name));
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match tool.execute(call).await {
                Ok(mut output) => {
                    output.content = smart_truncate(&output.content, tool.output_category(), self.invoker.result_byte_cap);
                    return output;
                }
                Err(ToolExecutionError::Transport(msg)) => {
                    if attempt >= self.invoker.max_retries {
                        return ToolOutput::err(
                            &call.id,
                            format!("{} failed after {} attempts: {}", call.name, attempt, msg),
                        );
                    }
                    warn!(tool = call.name.as_str(), attempt, %msg, "retrying tool call");
                    tokio::time::sleep(self.invoker.retry_interval * attempt).await;
                }
            }
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::policy::ApprovalPolicy;
    use crate::tool::{Tool, ToolCall, ToolOutput};

    struct EchoTool {
        name: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn parameters_schema(&self) -> Value {
            json!({ "type": "object" })
        }
        fn default_policy(&self) -> ApprovalPolicy {
            ApprovalPolicy::Auto
        }
        async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolExecutionError> {
            Ok(ToolOutput::ok(&call.id, format!("echo:{}", call.args)))
        }
    }

    struct FlakyTool {
        fails_remaining: AtomicU32,
    }

    #[async_trait]
    impl Tool for FlakyTool {
        fn name(&self) -> &str {
            "flaky"
        }
        fn description(&self) -> &str {
            "fails transiently"
        }
        fn parameters_schema(&self) -> Value {
            json!({ "type": "object" })
        }
        fn default_policy(&self) -> ApprovalPolicy {
            ApprovalPolicy::Auto
        }
        async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolExecutionError> {
            if self.fails_remaining.fetch_sub(1, Ordering::SeqCst) > 0 {
                Err(ToolExecutionError::Transport("connection reset".into()))
            } else {
                Ok(ToolOutput::ok(&call.id, "recovered"))
            }
        }
    }

    struct AlwaysFailsTool;

    #[async_trait]
    impl Tool for AlwaysFailsTool {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "always transport-fails"
        }
        fn parameters_schema(&self) -> Value {
            json!({ "type": "object" })
        }
        fn default_policy(&self) -> ApprovalPolicy {
            ApprovalPolicy::Auto
        }
        async fn execute(&self, _call: &ToolCall) -> Result<ToolOutput, ToolExecutionError> {
            Err(ToolExecutionError::Transport("down".into()))
        }
    }

    struct LogicallyFailingTool;

    #[async_trait]
    impl Tool for LogicallyFailingTool {
        fn name(&self) -> &str {
            "rejects"
        }
        fn description(&self) -> &str {
            "always logically fails"
        }
        fn parameters_schema(&self) -> Value {
            json!({ "type": "object" })
        }
        fn default_policy(&self) -> ApprovalPolicy {
            ApprovalPolicy::Auto
        }
        async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolExecutionError> {
            Ok(ToolOutput::err(&call.id, "bad args"))
        }
    }

    fn fast_invoker() -> InvokerConfig {
        InvokerConfig {
            max_retries: 3,
            retry_interval: Duration::from_millis(1),
            result_byte_cap: 4000,
        }
    }

    #[test]
    fn register_and_get() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool { name: "echo" });
        assert!(reg.get("echo").is_some());
    }

    #[test]
    fn get_unknown_returns_none() {
        let reg = ToolRegistry::new();
        assert!(reg.get("nope").is_none());
    }

    #[test]
    fn names_returns_all_registered() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool { name: "a" });
        reg.register(EchoTool { name: "b" });
        let mut names = reg.names();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn schemas_contains_registered_tool() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool { name: "my_tool" });
        let schemas = reg.schemas();
        assert!(schemas.iter().any(|s| s.name == "my_tool"));
    }

    #[tokio::test]
    async fn execute_known_tool_succeeds() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool { name: "echo" });
        let call = ToolCall { id: "1".into(), name: "echo".into(), args: json!({"x":1}) };
        let out = reg.execute(&call).await;
        assert!(!out.is_error);
        assert!(out.content.starts_with("echo:"));
    }

    #[tokio::test]
    async fn execute_unknown_tool_returns_error() {
        let reg = ToolRegistry::new();
        let call = ToolCall { id: "x".into(), name: "missing".into(), args: json!({}) };
        let out = reg.execute(&call).await;
        assert!(out.is_error);
        assert!(out.content.contains("unknown tool"));
    }

    #[test]
    fn registering_same_name_twice_overwrites() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool { name: "t" });
        reg.register(EchoTool { name: "t" });
        assert_eq!(reg.names().len(), 1);
    }

    #[tokio::test]
    async fn transient_failure_recovers_within_retry_budget() {
        let mut reg = ToolRegistry::with_invoker(fast_invoker());
        reg.register(FlakyTool { fails_remaining: AtomicU32::new(2) });
        let call = ToolCall { id: "1".into(), name: "flaky".into(), args: json!({}) };
        let out = reg.execute(&call).await;
        assert!(!out.is_error);
        assert_eq!(out.content, "recovered");
    }

    #[tokio::test]
    async fn exhausting_retries_returns_error() {
        let mut reg = ToolRegistry::with_invoker(fast_invoker());
        reg.register(AlwaysFailsTool);
        let call = ToolCall { id: "1".into(), name: "broken".into(), args: json!({}) };
        let out = reg.execute(&call).await;
        assert!(out.is_error);
        assert!(out.content.contains("failed after 3 attempts"));
    }

    #[tokio::test]
    async fn logical_failure_is_not_retried() {
        let mut reg = ToolRegistry::with_invoker(fast_invoker());
        reg.register(LogicallyFailingTool);
        let call = ToolCall { id: "1".into(), name: "rejects".into(), args: json!({}) };
        let out = reg.execute(&call).await;
        assert!(out.is_error);
        assert_eq!(out.content, "bad args");
    }

    #[tokio::test]
    async fn result_is_truncated_to_configured_cap() {
        let mut reg = ToolRegistry::with_invoker(InvokerConfig {
            max_retries: 1,
            retry_interval: Duration::from_millis(1),
            result_byte_cap: 10,
        });
        reg.register(EchoTool { name: "echo" });
        let call = ToolCall { id: "1".into(), name: "echo".into(), args: json!({"x": "a very long value indeed"}) };
        let out = reg.execute(&call).await;
        assert!(out.content.len() < 200);
        assert!(out.content.contains("[content truncated]"));
    }
}
