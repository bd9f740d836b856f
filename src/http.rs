// SPDX-License-Identifier: MIT
//! The HTTP/SSE surface: one agent per `POST /agents`, messages enqueued
//! through `send-message`, and the event log read back live over SSE.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use orc_repo::ConversationHistory;
use orc_stream::EventStream;
use orc_types::{AgentContext, AgentStatus};

use crate::runtime;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/agents", post(create_agent))
        .route("/agents/flows", get(list_flows))
        .route("/agents/:id/send-message", post(send_message))
        .route("/agents/:id/events", get(stream_events))
        .route("/agents/:id/shell", post(sandbox_not_configured))
        .route("/agents/:id/file", post(sandbox_not_configured))
        .route("/agents/:id/list-files", get(sandbox_not_configured))
        .route("/agents/:id/file/download", get(sandbox_not_configured))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CreateAgentRequest {
    user_id: String,
    flow_type: String,
}

#[derive(Debug, Serialize)]
struct CreateAgentResponse {
    agent_id: Uuid,
    status: AgentStatus,
}

async fn create_agent(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAgentRequest>,
) -> Result<Json<CreateAgentResponse>, ApiError> {
    let agent_id = Uuid::new_v4();
    let context = AgentContext::new(agent_id, &req.user_id, &req.flow_type);
    state.context_repo.save(context).await.map_err(ApiError::from)?;
    state
        .conversation_repo
        .save_history(ConversationHistory::new(agent_id, &req.user_id, &req.flow_type, &req.flow_type))
        .await
        .map_err(ApiError::from)?;

    let handle = runtime::spawn_agent(
        agent_id,
        &state.config,
        state.model.clone(),
        state.tools.clone(),
        state.conversation_repo.clone(),
    );
    state.runtimes.lock().await.insert(agent_id, handle);

    Ok(Json(CreateAgentResponse { agent_id, status: AgentStatus::Created }))
}

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    message: String,
    #[serde(default)]
    file_ids: Vec<String>,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = {
        let runtimes = state.runtimes.lock().await;
        runtimes.get(&agent_id).cloned().ok_or(ApiError::NotFound)?
    };
    handle
        .send_message(req.message, req.file_ids)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(axum::http::StatusCode::ACCEPTED)
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    #[serde(default)]
    from_sequence: u64,
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<Uuid>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let broadcaster = state.broadcaster_for(agent_id).await.ok_or(ApiError::NotFound)?;
    let poll_timeout = Duration::from_secs(state.config.events.live_poll_timeout_secs.max(1));
    let stream = EventStream::open(broadcaster, query.from_sequence, poll_timeout).await;

    let sse_stream = futures::stream::unfold(stream, |mut stream| async move {
        let event = stream.next().await?;
        let payload = json!({
            "sequence": event.sequence,
            "type": event.event.type_tag(),
            "data": event.event,
            "timestamp": event.timestamp,
        });
        let sse_event = Event::default().id(event.sequence.to_string()).json_data(payload).unwrap_or_else(|e| {
            warn!(error = %e, "failed to encode event as SSE payload");
            Event::default().data("{}")
        });
        Some((Ok(sse_event), stream))
    });

    Ok(Sse::new(sse_stream).keep_alive(axum::response::sse::KeepAlive::default()))
}

async fn list_flows() -> Json<Vec<&'static str>> {
    Json(vec!["plan_act"])
}

async fn sandbox_not_configured() -> impl IntoResponse {
    (axum::http::StatusCode::NOT_IMPLEMENTED, Json(json!({"error": "no sandbox gateway configured"})))
}

enum ApiError {
    NotFound,
    Internal(String),
}

impl From<orc_repo::RepoError> for ApiError {
    fn from(e: orc_repo::RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::NotFound => (axum::http::StatusCode::NOT_FOUND, "agent not found".to_string()),
            ApiError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({"error": message}))).into_response()
    }
}
