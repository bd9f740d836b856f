// SPDX-License-Identifier: MIT
//! The per-agent run loop: one `tokio::spawn`ed task per agent processes
//! commands sequentially (the flow controller is not re-entrant), mirroring
//! `handle_send_input`'s per-session task in the teacher.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};
use uuid::Uuid;

use orc_agent::{AgentError, ExecutorAgent, PlanOutcome, PlannerAgent, StepOutcome};
use orc_config::Config;
use orc_events::Broadcaster;
use orc_flow::{FlowController, FlowState, FlowTrigger};
use orc_llm::ModelProvider;
use orc_memory::Memory;
use orc_repo::ConversationRepository;
use orc_tools::ToolRegistry;
use orc_types::{AgentEvent, Message, Plan, StepStatus};

/// Default model context window assumed in the absence of a concrete
/// provider driver (none ships with this service — see `orc-llm`).
const DEFAULT_CONTEXT_WINDOW: usize = 128_000;

#[derive(Debug)]
pub enum RuntimeCommand {
    UserMessage { message: String, #[allow(dead_code)] file_ids: Vec<String> },
}

/// Cheap-to-clone handle transport layers use to talk to a running agent.
#[derive(Clone)]
pub struct AgentHandle {
    cmd_tx: mpsc::Sender<RuntimeCommand>,
    pub broadcaster: Arc<Mutex<Broadcaster>>,
}

impl AgentHandle {
    pub async fn send_message(&self, message: String, file_ids: Vec<String>) -> Result<(), anyhow::Error> {
        self.cmd_tx
            .send(RuntimeCommand::UserMessage { message, file_ids })
            .await
            .map_err(|_| anyhow::anyhow!("agent run loop has shut down"))
    }
}

struct AgentRuntime {
    agent_id: Uuid,
    memory: Memory,
    plan: Option<Plan>,
    flow: FlowController,
    planner: PlannerAgent,
    executor: ExecutorAgent,
    event_tx: mpsc::Sender<AgentEvent>,
}

/// Spawns a new agent's run loop and its event-forwarding task, returning a
/// handle transports can enqueue messages through.
pub fn spawn_agent(
    agent_id: Uuid,
    config: &Config,
    model: Arc<dyn ModelProvider>,
    tools: Arc<ToolRegistry>,
    conversation_repo: Arc<dyn ConversationRepository>,
) -> AgentHandle {
    let broadcaster = Arc::new(Mutex::new(Broadcaster::from_config(agent_id, &config.events)));
    let (event_tx, mut event_rx) = mpsc::channel::<AgentEvent>(config.events.subscriber_queue_capacity);

    // Forwards every event this agent emits to both the live broadcaster
    // and the durable conversation log. Runs for the lifetime of the agent.
    {
        let broadcaster = broadcaster.clone();
        let conversation_repo = conversation_repo.clone();
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                broadcaster.lock().await.broadcast(event.clone());
                if let Err(e) = conversation_repo.append_event(agent_id, event).await {
                    warn!(%agent_id, error = %e, "failed to persist event");
                }
            }
        });
    }

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<RuntimeCommand>(16);

    let planner = PlannerAgent::new(model.clone(), config.agent.planner_max_iterations);
    let executor = ExecutorAgent::new(model, tools, config.agent.max_iterations);

    let mut runtime = AgentRuntime {
        agent_id,
        memory: Memory::from_config(&config.memory, DEFAULT_CONTEXT_WINDOW),
        plan: None,
        flow: FlowController::new(),
        planner,
        executor,
        event_tx: event_tx.clone(),
    };

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                RuntimeCommand::UserMessage { message, .. } => {
                    if let Err(e) = runtime.handle_user_message(message).await {
                        error!(agent_id = %runtime.agent_id, error = %e, "agent run failed");
                    }
                }
            }
        }
        debug!(%agent_id, "agent run loop exiting, all handles dropped");
    });

    AgentHandle { cmd_tx, broadcaster }
}

impl AgentRuntime {
    async fn handle_user_message(&mut self, message: String) -> Result<(), AgentError> {
        self.flow.apply(FlowTrigger::UserMessage);
        self.memory.append(Message::user(message.clone()));

        loop {
            match self.flow.state() {
                FlowState::Idle => break,

                FlowState::Planning | FlowState::Updating => {
                    let outcome =
                        self.planner.plan(&mut self.memory, &message, self.plan.as_ref(), &self.event_tx).await?;
                    match outcome {
                        PlanOutcome::Paused => {
                            self.flow.apply(FlowTrigger::PlannerPaused);
                        }
                        PlanOutcome::Plan(plan) => {
                            self.plan = Some(plan);
                            let plan_ref = self.plan.as_ref().expect("just assigned");
                            if self.flow.state() == FlowState::Planning {
                                self.flow.apply(FlowTrigger::PlanCreated);
                            } else {
                                self.flow.apply(FlowTrigger::PlanUpdated(plan_ref));
                            }
                        }
                    }
                }

                FlowState::Executing => {
                    let plan = self.plan.as_mut().expect("flow is Executing only with a plan in hand");
                    let Some(step_index) = plan.next_step_index() else {
                        // Nothing left to run; let the next loop tick notice
                        // via StepSettled with no plan mutation.
                        let snapshot = plan.clone();
                        self.flow.apply(FlowTrigger::StepSettled(&snapshot));
                        continue;
                    };
                    let outcome =
                        self.executor.execute_step(&mut self.memory, plan, step_index, &message, &self.event_tx).await?;
                    match outcome {
                        StepOutcome::Paused => {
                            self.flow.apply(FlowTrigger::PlannerPaused);
                        }
                        StepOutcome::Completed | StepOutcome::Failed => {
                            let snapshot = self.plan.as_ref().expect("plan still set").clone();
                            self.flow.apply(FlowTrigger::StepSettled(&snapshot));
                        }
                    }
                }

                FlowState::Reporting => {
                    let summary = self
                        .plan
                        .as_ref()
                        .and_then(|p| p.steps.iter().rev().find_map(|s| s.result.clone()))
                        .unwrap_or_else(|| "run complete".to_string());
                    self.executor.report_result(summary, &self.event_tx).await;
                    self.flow.apply(FlowTrigger::Reported);
                }

                FlowState::Completed => {
                    if let Some(plan) = self.plan.as_mut() {
                        plan.status = StepStatus::Completed;
                        let _ = self.event_tx.send(AgentEvent::PlanCompleted { plan: plan.clone() }).await;
                    }
                    let _ = self.event_tx.send(AgentEvent::Done).await;
                    self.flow.apply(FlowTrigger::Acknowledged);
                    break;
                }
            }
        }
        Ok(())
    }
}
