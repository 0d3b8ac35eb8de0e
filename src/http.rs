//! HTTP surface over the session manager and batch runner.
//!
//! Every handler is a thin mapping onto one [`SessionManager`] or
//! [`BatchRunner`] call. Failures, including requests the extractors
//! reject, become `{"ok": false, "detail": ...}`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::batch::BatchRunner;
use crate::config::{BridgeConfig, Side};
use crate::session::{SessionManager, SessionStatus};
use crate::Error;

/// Default `--perft` depth when the query omits one.
pub const DEFAULT_PERFT_DEPTH: u32 = 3;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub batch: Arc<BatchRunner>,
}

impl AppState {
    /// Build the session manager and batch runner from one configuration.
    pub fn from_config(config: BridgeConfig) -> Self {
        let config = Arc::new(config);
        Self {
            sessions: Arc::new(SessionManager::new(config.as_ref().clone())),
            batch: Arc::new(BatchRunner::new(config)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/new-game", post(new_game))
        .route("/api/move", post(submit_move))
        .route("/api/shutdown", post(shutdown))
        .route("/api/session", get(session_status))
        .route("/api/run-tests", post(run_tests))
        .route("/perft", get(perft))
        .with_state(state)
}

#[derive(Deserialize)]
pub struct NewGameParams {
    #[serde(default)]
    pub human_color: Side,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "move")]
    pub token: String,
}

#[derive(Deserialize)]
pub struct PerftParams {
    pub depth: Option<u32>,
}

#[derive(Serialize)]
pub struct RunTestsResponse {
    pub returncode: Option<i32>,
    pub output: String,
    pub success: bool,
}

#[derive(Serialize)]
pub struct PerftResponse {
    pub depth: u32,
    pub nodes: u64,
}

/// A failure rendered as a JSON failure body.
pub enum ApiError {
    /// The bridge or the engine failed.
    Engine(Error),
    /// The request itself could not be parsed.
    Rejected(StatusCode, String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Engine(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Engine(err) if err.is_caller_error() => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Engine(err) => {
                tracing::error!("request failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Rejected(status, detail) => {
                tracing::debug!(%status, "rejected request: {}", detail);
                (status, detail)
            }
        };
        (status, Json(json!({"ok": false, "detail": detail}))).into_response()
    }
}

async fn new_game(
    State(state): State<AppState>,
    params: Result<Query<NewGameParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params?;
    let reply = state.sessions.new_game(params.human_color).await?;
    Ok(Json(json!({"ok": true, "engine": reply.to_payload()})))
}

async fn submit_move(
    State(state): State<AppState>,
    request: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = request?;
    let reply = state.sessions.submit_move(&request.token).await?;
    Ok(Json(json!({"ok": true, "engine": reply.to_payload()})))
}

async fn shutdown(State(state): State<AppState>) -> Json<Value> {
    state.sessions.shutdown().await;
    Json(json!({"ok": true}))
}

async fn session_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.sessions.status().await)
}

async fn run_tests(State(state): State<AppState>) -> Result<Json<RunTestsResponse>, ApiError> {
    let report = state.batch.run_self_tests().await?;
    Ok(Json(RunTestsResponse {
        returncode: report.exit_code,
        success: report.success(),
        output: report.output,
    }))
}

async fn perft(
    State(state): State<AppState>,
    params: Result<Query<PerftParams>, QueryRejection>,
) -> Result<Json<PerftResponse>, ApiError> {
    let Query(params) = params?;
    let depth = params.depth.unwrap_or(DEFAULT_PERFT_DEPTH);
    let nodes = state.batch.run_node_count(depth).await?;
    Ok(Json(PerftResponse { depth, nodes }))
}
