//! # Agent API
//!
//! Start, stop, and inspect assistant runs.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use omnicart_core::catalog::ShoppingItem;
use omnicart_core::swarm::{AgentStatusBoard, LogEntry, SessionError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::SharedState;

// === API Types ===

/// Generic `{"status": ...}` reply
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            message: None,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RunRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    pub current_task: String,
    /// Agent key to `idle`, `initializing`, or `active`
    #[schema(value_type = Object)]
    pub agent_status: AgentStatusBoard,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentRunStatus {
    pub is_running: bool,
    pub current_task: String,
    #[schema(value_type = Object)]
    pub agent_status: AgentStatusBoard,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleCrewRequest {
    #[serde(rename = "useCrewAI", default = "default_use_crew")]
    pub use_crew: bool,
}

fn default_use_crew() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleCrewResponse {
    pub status: String,
    #[serde(rename = "useCrewAI")]
    pub use_crew: bool,
}

pub fn agent_routes() -> Router<SharedState> {
    Router::new()
        .route("/stop", post(stop_agent))
        .route("/status", get(agent_status))
        .route("/toggle-crew", post(toggle_crew))
}

// === API Handlers ===

/// Health check
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "assistant",
    responses(
        (status = 200, description = "Server is up", body = StatusResponse)
    )
)]
pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse::new("ok"))
}

/// Start a run for a query
#[utoipa::path(
    post,
    path = "/api/run",
    tag = "assistant",
    request_body = RunRequest,
    responses(
        (status = 200, description = "Run started", body = StatusResponse),
        (status = 409, description = "A run is already in progress", body = StatusResponse)
    )
)]
pub async fn run_agent(
    State(state): State<SharedState>,
    Json(req): Json<RunRequest>,
) -> impl IntoResponse {
    match state.session.start_run(req.query).await {
        Ok(_) => (StatusCode::OK, Json(StatusResponse::new("started"))),
        Err(SessionError::Busy) => (StatusCode::CONFLICT, Json(StatusResponse::new("busy"))),
        Err(e) => {
            tracing::warn!("Failed to start run: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse {
                    status: "error".to_string(),
                    message: Some(e.to_string()),
                }),
            )
        }
    }
}

/// Current task and per-agent status
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "assistant",
    responses(
        (status = 200, description = "Session status", body = SessionStatus)
    )
)]
pub async fn get_status(State(state): State<SharedState>) -> Json<SessionStatus> {
    let snapshot = state.session.status().await;
    Json(SessionStatus {
        current_task: snapshot.current_task,
        agent_status: snapshot.agent_status,
    })
}

/// Log lines of the current or last run
#[utoipa::path(
    get,
    path = "/api/logs",
    tag = "assistant",
    responses(
        (status = 200, description = "Log entries with `timestamp`, `type`, and `message`")
    )
)]
pub async fn get_logs(State(state): State<SharedState>) -> Json<Vec<LogEntry>> {
    Json(state.session.logs().await)
}

/// Shopping list produced by the last run
#[utoipa::path(
    get,
    path = "/api/shopping/list",
    tag = "assistant",
    responses(
        (status = 200, description = "Shopping items")
    )
)]
pub async fn get_shopping_list(State(state): State<SharedState>) -> Json<Vec<ShoppingItem>> {
    Json(state.session.shopping_list().await)
}

/// Stop the current run
#[utoipa::path(
    post,
    path = "/api/agent/stop",
    tag = "agent",
    responses(
        (status = 200, description = "Stop requested", body = StatusResponse)
    )
)]
pub async fn stop_agent(State(state): State<SharedState>) -> Json<StatusResponse> {
    state.session.stop().await;
    Json(StatusResponse::new("stopped"))
}

/// Whether a run is in progress
#[utoipa::path(
    get,
    path = "/api/agent/status",
    tag = "agent",
    responses(
        (status = 200, description = "Agent status", body = AgentRunStatus)
    )
)]
pub async fn agent_status(State(state): State<SharedState>) -> Json<AgentRunStatus> {
    let snapshot = state.session.agent_status().await;
    Json(AgentRunStatus {
        is_running: snapshot.is_running,
        current_task: snapshot.current_task,
        agent_status: snapshot.agent_status,
    })
}

/// Switch between crew mode and the scripted simulation
#[utoipa::path(
    post,
    path = "/api/agent/toggle-crew",
    tag = "agent",
    request_body = ToggleCrewRequest,
    responses(
        (status = 200, description = "Mode updated", body = ToggleCrewResponse)
    )
)]
pub async fn toggle_crew(
    State(state): State<SharedState>,
    Json(req): Json<ToggleCrewRequest>,
) -> Json<ToggleCrewResponse> {
    let use_crew = state.session.toggle_crew(req.use_crew);
    Json(ToggleCrewResponse {
        status: "success".to_string(),
        use_crew,
    })
}
