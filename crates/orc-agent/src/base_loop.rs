// SPDX-License-Identifier: MIT
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use orc_llm::{AskRequest, ModelProvider};
use orc_memory::Memory;
use orc_tools::{ToolCall, ToolRegistry};
use orc_types::{AgentEvent, Message, ToolCallDescriptor};

use crate::repair::attempt_json_repair;
use crate::AgentError;

/// Calling either sentinel function pauses the loop after the tool result
/// is recorded: the caller has asked a clarifying question, or declared the
/// conversation done, and the next move belongs to the user.
pub const SENTINEL_REQUEST_CLARIFICATION: &str = "message_request_user_clarification";
pub const SENTINEL_DONE: &str = "message_done";

fn is_sentinel(function_name: &str) -> bool {
    function_name == SENTINEL_REQUEST_CLARIFICATION || function_name == SENTINEL_DONE
}

/// What one `run`/`continue_loop` invocation settled on. Every event along
/// the way is also sent on the caller's channel; this is just the final
/// state for callers (Planner, Executor) that need to act on it directly.
#[derive(Debug, Clone)]
pub enum LoopOutcome {
    /// The assistant replied with no tool call; this is its text.
    Message(String),
    /// A sentinel tool was called; the run stopped to wait for the user.
    Paused,
}

/// One ask-LLM → dispatch-tool → record-result cycle, repeated until the
/// assistant stops calling tools, a sentinel tool pauses it, or the
/// iteration cap is hit.
pub struct BaseLoop {
    model: Arc<dyn ModelProvider>,
    tools: Arc<ToolRegistry>,
    max_iterations: u32,
}

impl BaseLoop {
    pub fn new(model: Arc<dyn ModelProvider>, tools: Arc<ToolRegistry>, max_iterations: u32) -> Self {
        Self { model, tools, max_iterations }
    }

    pub fn model(&self) -> &Arc<dyn ModelProvider> {
        &self.model
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Appends `request` as a user turn and runs the loop.
    pub async fn run(
        &self,
        memory: &mut Memory,
        request: &str,
        events: &mpsc::Sender<AgentEvent>,
    ) -> Result<LoopOutcome, AgentError> {
        memory.append(Message::user(request));
        self.continue_loop(memory, events).await
    }

    /// Runs the loop without adding a new user turn — used when the input
    /// is already in memory (a tool result, a re-invocation with raw text).
    pub async fn continue_loop(
        &self,
        memory: &mut Memory,
        events: &mpsc::Sender<AgentEvent>,
    ) -> Result<LoopOutcome, AgentError> {
        for _ in 0..self.max_iterations {
            let req = AskRequest {
                messages: memory.with_latest_system().into_iter().cloned().collect(),
                tools: self.tools.schemas().into_iter().map(to_llm_schema).collect(),
                response_format: None,
            };
            let reply = self.model.ask(req).await?;

            let Some(call) = &reply.tool_call else {
                memory.append(Message::assistant(reply.content.clone()));
                let _ = events.send(AgentEvent::Message { message: reply.content.clone() }).await;
                return Ok(LoopOutcome::Message(reply.content));
            };

            let args = attempt_json_repair(&call.arguments).unwrap_or_else(|| {
                warn!(tool_call_id = %call.id, function = %call.function_name, "could not repair tool call arguments; substituting {{}}");
                serde_json::Value::Object(Default::default())
            });

            memory.append(
                Message::assistant(reply.content.clone())
                    .with_tool_call(ToolCallDescriptor {
                        id: call.id.clone(),
                        function_name: call.function_name.clone(),
                        arguments: call.arguments.clone(),
                    }),
            );

            let _ = events
                .send(AgentEvent::ToolCalling {
                    tool_name: call.function_name.clone(),
                    function_name: call.function_name.clone(),
                    function_args: args.clone(),
                })
                .await;

            let tool_call = ToolCall { id: call.id.clone(), name: call.function_name.clone(), args: args.clone() };
            let output = self.tools.execute(&tool_call).await;

            let function_result = serde_json::json!({
                "content": output.content,
                "is_error": output.is_error,
            });
            let _ = events
                .send(AgentEvent::ToolCalled {
                    tool_name: call.function_name.clone(),
                    function_name: call.function_name.clone(),
                    function_args: args,
                    function_result,
                })
                .await;

            memory.append(Message::tool(call.id.clone(), output.content.clone()));

            if is_sentinel(&call.function_name) {
                if !output.content.is_empty() {
                    let _ = events.send(AgentEvent::Message { message: output.content }).await;
                }
                let _ = events.send(AgentEvent::Pause).await;
                return Ok(LoopOutcome::Paused);
            }
        }

        let _ = events.send(AgentEvent::Error { error: "iteration limit".into() }).await;
        Err(AgentError::IterationLimit)
    }
}

fn to_llm_schema(s: orc_tools::ToolSchema) -> orc_llm::ToolSchema {
    orc_llm::ToolSchema { name: s.name, description: s.description, parameters: s.parameters }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orc_llm::{AssistantMessage, LlmError};
    use orc_tools::{ApprovalPolicy, OutputCategory, Tool, ToolExecutionError, ToolOutput};
    use orc_types::Role;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<Vec<AssistantMessage>>,
    }

    #[async_trait]
    impl ModelProvider for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn ask(&self, _req: AskRequest) -> Result<AssistantMessage, LlmError> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(LlmError::Transport("scripted model exhausted".into()));
            }
            Ok(replies.remove(0))
        }
    }

    struct EchoTool {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes back"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        fn default_policy(&self) -> ApprovalPolicy {
            ApprovalPolicy::Auto
        }
        fn output_category(&self) -> OutputCategory {
            OutputCategory::Generic
        }
        async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::ok(&call.id, "echoed"))
        }
    }

    fn registry_with_echo() -> Arc<ToolRegistry> {
        let mut r = ToolRegistry::new();
        r.register(EchoTool { calls: AtomicU32::new(0) });
        Arc::new(r)
    }

    fn mem() -> Memory {
        Memory::new(1_000_000, 10)
    }

    #[tokio::test]
    async fn text_only_reply_terminates_with_message() {
        let model = Arc::new(ScriptedModel { replies: Mutex::new(vec![AssistantMessage::text("hello there")]) });
        let loop_ = BaseLoop::new(model, registry_with_echo(), 30);
        let (tx, mut rx) = mpsc::channel(16);
        let mut memory = mem();
        let outcome = loop_.run(&mut memory, "hi", &tx).await.unwrap();
        assert!(matches!(outcome, LoopOutcome::Message(ref m) if m == "hello there"));
        assert!(matches!(rx.recv().await.unwrap(), AgentEvent::Message { .. }));
    }

    #[tokio::test]
    async fn tool_call_then_text_reply_dispatches_the_tool() {
        let model = Arc::new(ScriptedModel {
            replies: Mutex::new(vec![
                AssistantMessage::tool_call(
                    "",
                    ToolCallDescriptor { id: "c1".into(), function_name: "echo".into(), arguments: "{}".into() },
                ),
                AssistantMessage::text("done"),
            ]),
        });
        let loop_ = BaseLoop::new(model, registry_with_echo(), 30);
        let (tx, mut rx) = mpsc::channel(16);
        let mut memory = mem();
        let outcome = loop_.run(&mut memory, "do it", &tx).await.unwrap();
        assert!(matches!(outcome, LoopOutcome::Message(ref m) if m == "done"));
        let mut saw_calling = false;
        let mut saw_called = false;
        while let Ok(ev) = rx.try_recv() {
            match ev {
                AgentEvent::ToolCalling { .. } => saw_calling = true,
                AgentEvent::ToolCalled { .. } => saw_called = true,
                _ => {}
            }
        }
        assert!(saw_calling && saw_called);
        assert!(memory.messages().iter().any(|m| m.role == Role::Tool));
    }

    #[tokio::test]
    async fn sentinel_tool_call_pauses_the_loop() {
        let model = Arc::new(ScriptedModel {
            replies: Mutex::new(vec![AssistantMessage::tool_call(
                "",
                ToolCallDescriptor {
                    id: "c1".into(),
                    function_name: SENTINEL_DONE.into(),
                    arguments: "{}".into(),
                },
            )]),
        });
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool { calls: AtomicU32::new(0) });
        struct DoneTool;
        #[async_trait]
        impl Tool for DoneTool {
            fn name(&self) -> &str {
                SENTINEL_DONE
            }
            fn description(&self) -> &str {
                "sentinel"
            }
            fn parameters_schema(&self) -> serde_json::Value {
                serde_json::json!({"type": "object"})
            }
            fn default_policy(&self) -> ApprovalPolicy {
                ApprovalPolicy::Auto
            }
            fn output_category(&self) -> OutputCategory {
                OutputCategory::Generic
            }
            async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolExecutionError> {
                Ok(ToolOutput::ok(&call.id, "all set"))
            }
        }
        registry.register(DoneTool);
        let loop_ = BaseLoop::new(model, Arc::new(registry), 30);
        let (tx, mut rx) = mpsc::channel(16);
        let mut memory = mem();
        let outcome = loop_.run(&mut memory, "wrap up", &tx).await.unwrap();
        assert!(matches!(outcome, LoopOutcome::Paused));
        let mut saw_pause = false;
        while let Ok(ev) = rx.try_recv() {
            if matches!(ev, AgentEvent::Pause) {
                saw_pause = true;
            }
        }
        assert!(saw_pause);
    }

    #[tokio::test]
    async fn exhausting_iterations_surfaces_the_limit_error() {
        let replies: Vec<AssistantMessage> = (0..5)
            .map(|i| {
                AssistantMessage::tool_call(
                    "",
                    ToolCallDescriptor { id: format!("c{i}"), function_name: "echo".into(), arguments: "{}".into() },
                )
            })
            .collect();
        let model = Arc::new(ScriptedModel { replies: Mutex::new(replies) });
        let loop_ = BaseLoop::new(model, registry_with_echo(), 5);
        let (tx, _rx) = mpsc::channel(16);
        let mut memory = mem();
        let result = loop_.run(&mut memory, "loop forever", &tx).await;
        assert!(matches!(result, Err(AgentError::IterationLimit)));
    }

    #[tokio::test]
    async fn malformed_tool_arguments_are_repaired_not_dropped() {
        let model = Arc::new(ScriptedModel {
            replies: Mutex::new(vec![
                AssistantMessage::tool_call(
                    "",
                    ToolCallDescriptor {
                        id: "c1".into(),
                        function_name: "echo".into(),
                        arguments: r#"{"path": "C:\Users\x"}"#.into(),
                    },
                ),
                AssistantMessage::text("done"),
            ]),
        });
        let loop_ = BaseLoop::new(model, registry_with_echo(), 30);
        let (tx, _rx) = mpsc::channel(16);
        let mut memory = mem();
        let outcome = loop_.run(&mut memory, "go", &tx).await.unwrap();
        assert!(matches!(outcome, LoopOutcome::Message(_)));
    }
}
