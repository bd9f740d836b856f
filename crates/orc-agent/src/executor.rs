// SPDX-License-Identifier: MIT
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use orc_llm::{AskRequest, ModelProvider};
use orc_memory::Memory;
use orc_tools::ToolRegistry;
use orc_types::{AgentEvent, Message, Plan, Step, StepStatus};

use crate::base_loop::{BaseLoop, LoopOutcome};
use crate::AgentError;

/// What one `execute_step` call settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Failed,
    Paused,
}

/// Builds the Executor's system prompt from the tool catalogue and the
/// current time, materialized fresh for each run so a long-lived agent
/// never reasons from a stale timestamp.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    let catalogue = tools
        .schemas()
        .into_iter()
        .map(|s| format!("- {}: {}", s.name, s.description))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are an autonomous agent executing one step of a larger plan. The current time is {}.\n\
         Available tools:\n{}\n\
         Call exactly one tool per turn, or reply with plain text once the step is done.",
        Utc::now().to_rfc3339(),
        catalogue
    )
}

/// Wraps the Base Loop with a tool set (shell/file/browser/search and any
/// configured extras), per-step prompting, and memory-bounding between
/// steps.
pub struct ExecutorAgent {
    base: BaseLoop,
}

impl ExecutorAgent {
    pub fn new(model: Arc<dyn ModelProvider>, tools: Arc<ToolRegistry>, max_iterations: u32) -> Self {
        Self { base: BaseLoop::new(model, tools, max_iterations) }
    }

    /// Formats a step-scoped prompt, marks the step running, runs the loop,
    /// and reflects the outcome back onto `plan`.
    pub async fn execute_step(
        &self,
        memory: &mut Memory,
        plan: &mut Plan,
        step_index: usize,
        message: &str,
        events: &mpsc::Sender<AgentEvent>,
    ) -> Result<StepOutcome, AgentError> {
        plan.steps[step_index].status = StepStatus::Running;
        let _ = events
            .send(AgentEvent::StepStarted { step: plan.steps[step_index].clone(), plan: plan.clone() })
            .await;

        let prompt = format!(
            "You are executing step \"{}\" of goal \"{}\": {}\n\n{}",
            plan.steps[step_index].id, plan.goal, plan.steps[step_index].description, message
        );

        match self.base.run(memory, &prompt, events).await {
            Ok(LoopOutcome::Message(text)) => {
                plan.steps[step_index].result = Some(text);
                plan.steps[step_index].status = StepStatus::Completed;
                let _ = events
                    .send(AgentEvent::StepCompleted { step: plan.steps[step_index].clone(), plan: plan.clone() })
                    .await;
                Ok(StepOutcome::Completed)
            }
            Ok(LoopOutcome::Paused) => {
                plan.steps[step_index].status = StepStatus::Paused;
                Ok(StepOutcome::Paused)
            }
            Err(AgentError::IterationLimit) => {
                plan.steps[step_index].status = StepStatus::Failed;
                plan.steps[step_index].error = Some("iteration limit".into());
                let _ = events
                    .send(AgentEvent::StepFailed { step: plan.steps[step_index].clone(), plan: plan.clone() })
                    .await;
                Ok(StepOutcome::Failed)
            }
            Err(e) => Err(e),
        }
    }

    /// Asks the model (no tools) to summarize execution memory so far, then
    /// clears it down to the system prompt plus a synthetic "previous
    /// steps" notice. Bounds execution memory across many steps instead of
    /// letting every step's tool chatter accumulate forever.
    pub async fn summarize_steps(&self, memory: &mut Memory, system_prompt: &str) -> Result<(), AgentError> {
        let summary_request = AskRequest {
            messages: memory
                .non_system()
                .into_iter()
                .cloned()
                .chain(std::iter::once(Message::user(
                    "Summarize the work done so far in a few sentences, preserving any file paths, \
                     commands, or decisions a future step would need.",
                )))
                .collect(),
            tools: Vec::new(),
            response_format: None,
        };
        let reply = self.base.model().ask(summary_request).await?;

        memory.restore(orc_memory::MemorySnapshot { messages: Vec::new() });
        memory.append(Message::system(system_prompt));
        memory.append(Message::system(format!("previous steps: {}", reply.content)));
        Ok(())
    }

    pub async fn report_result(&self, message: impl Into<String>, events: &mpsc::Sender<AgentEvent>) {
        let _ = events.send(AgentEvent::Report { message: message.into() }).await;
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orc_llm::{AssistantMessage, LlmError};
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
                return Err(LlmError::Transport("exhausted".into()));
            }
            Ok(replies.remove(0))
        }
    }

    fn plan_with_one_step() -> Plan {
        let mut p = Plan::new("p1", "Release", "ship it");
        p.steps.push(Step::new("s1", "build"));
        p
    }

    #[tokio::test]
    async fn completed_step_records_result_and_status() {
        let model = Arc::new(ScriptedModel { replies: Mutex::new(vec![AssistantMessage::text("built ok")]) });
        let executor = ExecutorAgent::new(model, Arc::new(ToolRegistry::new()), 30);
        let (tx, mut rx) = mpsc::channel(16);
        let mut memory = Memory::new(1_000_000, 10);
        let mut plan = plan_with_one_step();
        let outcome = executor.execute_step(&mut memory, &mut plan, 0, "go", &tx).await.unwrap();
        assert_eq!(outcome, StepOutcome::Completed);
        assert_eq!(plan.steps[0].status, StepStatus::Completed);
        assert_eq!(plan.steps[0].result.as_deref(), Some("built ok"));
        assert!(matches!(rx.recv().await.unwrap(), AgentEvent::StepStarted { .. }));
        assert!(matches!(rx.recv().await.unwrap(), AgentEvent::StepCompleted { .. }));
    }

    #[tokio::test]
    async fn iteration_limit_marks_step_failed() {
        let replies = vec![AssistantMessage::tool_call(
            "",
            orc_types::ToolCallDescriptor { id: "c1".into(), function_name: "noop".into(), arguments: "{}".into() },
        )];
        let model = Arc::new(ScriptedModel { replies: Mutex::new(replies) });
        let mut registry = ToolRegistry::new();
        struct NoopTool;
        #[async_trait]
        impl orc_tools::Tool for NoopTool {
            fn name(&self) -> &str {
                "noop"
            }
            fn description(&self) -> &str {
                "does nothing"
            }
            fn parameters_schema(&self) -> serde_json::Value {
                serde_json::json!({"type": "object"})
            }
            fn default_policy(&self) -> orc_tools::ApprovalPolicy {
                orc_tools::ApprovalPolicy::Auto
            }
            async fn execute(&self, call: &orc_tools::ToolCall) -> Result<orc_tools::ToolOutput, orc_tools::ToolExecutionError> {
                Ok(orc_tools::ToolOutput::ok(&call.id, "again"))
            }
        }
        registry.register(NoopTool);
        let executor = ExecutorAgent::new(model, Arc::new(registry), 1);
        let (tx, _rx) = mpsc::channel(16);
        let mut memory = Memory::new(1_000_000, 10);
        let mut plan = plan_with_one_step();
        let outcome = executor.execute_step(&mut memory, &mut plan, 0, "go", &tx).await.unwrap();
        assert_eq!(outcome, StepOutcome::Failed);
        assert_eq!(plan.steps[0].status, StepStatus::Failed);
    }

    #[tokio::test]
    async fn summarize_steps_replaces_history_with_synthetic_notice() {
        let model = Arc::new(ScriptedModel { replies: Mutex::new(vec![AssistantMessage::text("did X then Y")]) });
        let executor = ExecutorAgent::new(model, Arc::new(ToolRegistry::new()), 30);
        let mut memory = Memory::new(1_000_000, 10);
        memory.append(Message::system("old system prompt"));
        memory.append(Message::user("do X"));
        memory.append(Message::assistant("did X"));
        executor.summarize_steps(&mut memory, "new system prompt").await.unwrap();
        assert_eq!(memory.messages()[0].content, "new system prompt");
        assert!(memory.messages()[1].content.contains("did X then Y"));
        assert_eq!(memory.len(), 2);
    }

    #[tokio::test]
    async fn report_result_emits_report_event() {
        let model = Arc::new(ScriptedModel { replies: Mutex::new(vec![]) });
        let executor = ExecutorAgent::new(model, Arc::new(ToolRegistry::new()), 30);
        let (tx, mut rx) = mpsc::channel(16);
        executor.report_result("all done", &tx).await;
        assert!(matches!(rx.recv().await.unwrap(), AgentEvent::Report { message } if message == "all done"));
    }

    #[test]
    fn system_prompt_lists_registered_tools() {
        let mut registry = ToolRegistry::new();
        struct NamedTool;
        #[async_trait]
        impl orc_tools::Tool for NamedTool {
            fn name(&self) -> &str {
                "shell"
            }
            fn description(&self) -> &str {
                "runs commands"
            }
            fn parameters_schema(&self) -> serde_json::Value {
                serde_json::json!({"type": "object"})
            }
            fn default_policy(&self) -> orc_tools::ApprovalPolicy {
                orc_tools::ApprovalPolicy::Ask
            }
            async fn execute(&self, call: &orc_tools::ToolCall) -> Result<orc_tools::ToolOutput, orc_tools::ToolExecutionError> {
                Ok(orc_tools::ToolOutput::ok(&call.id, ""))
            }
        }
        registry.register(NamedTool);
        let prompt = build_system_prompt(&registry);
        assert!(prompt.contains("shell"));
        assert!(prompt.contains("runs commands"));
    }
}
