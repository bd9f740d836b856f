// SPDX-License-Identifier: MIT
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use orc_llm::ModelProvider;
use orc_memory::Memory;
use orc_tools::ToolRegistry;
use orc_types::{AgentEvent, Message, Plan, Step};

use crate::base_loop::{BaseLoop, LoopOutcome};
use crate::repair::parse_plan_envelope;
use crate::AgentError;

const PLANNER_SYSTEM_PROMPT: &str = r#"You are the planning stage of an autonomous agent. Given the \
user's request and the current plan (if any), reply with exactly one JSON object and nothing else: \
{"message": "<a short note to the user>", "goal": "<the overall objective>", "title": "<a short plan \
title>", "steps": [{"id": "<unique id>", "description": "<what this step does>"}]}. Leave "steps" \
empty only when every step of the current plan is already done."#;

/// What a single `plan` call settled on.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    /// A plan was created or updated; the flow controller was already told
    /// via `plan_created`/`plan_updated` on the event channel.
    Plan(Plan),
    /// The planner paused — either the model asked for clarification, or
    /// the newly-parsed step list came back empty (plan exhausted).
    Paused,
}

/// Drives the Base Loop with no tools and a fixed system prompt, repairing
/// the reply into a structured [`Plan`].
pub struct PlannerAgent {
    base: BaseLoop,
    max_attempts: u32,
}

impl PlannerAgent {
    /// `max_attempts` bounds how many times a non-JSON reply is re-fed to
    /// the model as raw text before giving up (spec's planner iteration
    /// bound, default 3). Each attempt is a single LLM call — the planner
    /// never calls tools, so the Base Loop underneath always terminates
    /// after exactly one ask.
    pub fn new(model: Arc<dyn ModelProvider>, max_attempts: u32) -> Self {
        Self { base: BaseLoop::new(model, Arc::new(ToolRegistry::new()), 1), max_attempts }
    }

    pub async fn plan(
        &self,
        memory: &mut Memory,
        input: &str,
        current_plan: Option<&Plan>,
        events: &mpsc::Sender<AgentEvent>,
    ) -> Result<PlanOutcome, AgentError> {
        if memory.latest_system().is_none() {
            memory.append(Message::system(PLANNER_SYSTEM_PROMPT));
        }

        let mut next_input = input.to_string();
        for attempt in 0..self.max_attempts.max(1) {
            let outcome = if attempt == 0 {
                self.base.run(memory, &next_input, events).await?
            } else {
                memory.append(Message::user(&next_input));
                self.base.continue_loop(memory, events).await?
            };

            let text = match outcome {
                LoopOutcome::Paused => return Ok(PlanOutcome::Paused),
                LoopOutcome::Message(text) => text,
            };

            let Some(envelope) = parse_plan_envelope(&text) else {
                next_input = text;
                continue;
            };

            let mut plan = current_plan
                .cloned()
                .unwrap_or_else(|| Plan::new(Uuid::new_v4().to_string(), envelope.title.clone(), envelope.goal.clone()));

            let new_steps: Vec<Step> = envelope
                .steps
                .into_iter()
                .map(|s| {
                    let mut step = Step::new(s.id, s.description);
                    step.sub_flow_step = s.sub_flow_step;
                    step.sub_flow_type = s.sub_flow_type;
                    step
                })
                .collect();

            if new_steps.is_empty() {
                let _ = events.send(AgentEvent::Pause).await;
                return Ok(PlanOutcome::Paused);
            }

            let is_update = current_plan.is_some();
            plan.apply_update(new_steps);

            let event = if is_update {
                AgentEvent::PlanUpdated { plan: plan.clone() }
            } else {
                AgentEvent::PlanCreated { plan: plan.clone() }
            };
            let _ = events.send(event).await;
            return Ok(PlanOutcome::Plan(plan));
        }

        Err(AgentError::PlanParseFailed(self.max_attempts))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
