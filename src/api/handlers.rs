//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::state::{AppState, SessionSnapshot};
use crate::stats::UserStats;
use crate::types::{ExerciseSpec, HistoryEntry, WorkoutTemplate};

use super::responses::{ApiResponse, HealthResponse, StatusResponse};

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub name: String,
    pub exercises: Vec<ExerciseSpec>,
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub template_id: i64,
}

/// Body for complete-set; both fields optional, invalid values fall back to
/// the exercise's planned numbers
#[derive(Debug, Default, Deserialize)]
pub struct CompleteSetRequest {
    #[serde(default)]
    pub reps: Option<i64>,
    #[serde(default)]
    pub weight: Option<f64>,
}

// ----- template authoring -----

/// Handle GET /users/:user_id/templates
pub async fn list_templates_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<WorkoutTemplate>>, AppError> {
    Ok(Json(state.list_templates(&user_id)?))
}

/// Handle POST /users/:user_id/templates
pub async fn create_template_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(request): Json<TemplateRequest>,
) -> Result<Json<WorkoutTemplate>, AppError> {
    let template = state.create_template(&user_id, &request.name, request.exercises)?;
    Ok(Json(template))
}

/// Handle PUT /users/:user_id/templates/:template_id
pub async fn update_template_handler(
    State(state): State<Arc<AppState>>,
    Path((user_id, template_id)): Path<(String, i64)>,
    Json(request): Json<TemplateRequest>,
) -> Result<Json<WorkoutTemplate>, AppError> {
    let template =
        state.update_template(&user_id, template_id, &request.name, request.exercises)?;
    Ok(Json(template))
}

/// Handle DELETE /users/:user_id/templates/:template_id
pub async fn delete_template_handler(
    State(state): State<Arc<AppState>>,
    Path((user_id, template_id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse>, AppError> {
    state.delete_template(&user_id, template_id)?;
    Ok(Json(ApiResponse::ok("Workout deleted".to_string())))
}

// ----- session control -----

/// Handle POST /users/:user_id/session/start
pub async fn start_session_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let snapshot = state.start_session(&user_id, request.template_id).await?;
    info!("Session started for user '{}'", user_id);
    Ok(Json(ApiResponse::session(
        format!("Session started: {}", snapshot.template_name),
        snapshot,
    )))
}

/// Handle POST /users/:user_id/session/complete-set
pub async fn complete_set_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    body: Option<Json<CompleteSetRequest>>,
) -> Result<Json<ApiResponse>, AppError> {
    let Json(request) = body.unwrap_or_default();
    if let Some(weight) = request.weight {
        if !weight.is_finite() {
            return Err(AppError::InvalidInput("weight must be a number".into()));
        }
    }
    let snapshot = state
        .complete_set(&user_id, request.reps, request.weight)
        .await?;
    let message = match snapshot.phase {
        crate::state::Phase::Complete => "Workout complete!".to_string(),
        crate::state::Phase::Resting => "Set logged, rest started".to_string(),
        crate::state::Phase::Active => "Set logged".to_string(),
    };
    Ok(Json(ApiResponse::session(message, snapshot)))
}

/// Handle POST /users/:user_id/session/skip-rest
pub async fn skip_rest_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse>, AppError> {
    let snapshot = state.skip_rest(&user_id).await?;
    Ok(Json(ApiResponse::session(
        "Rest skipped".to_string(),
        snapshot,
    )))
}

/// Handle POST /users/:user_id/session/pause-rest
pub async fn pause_rest_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse>, AppError> {
    let snapshot = state.pause_rest(&user_id).await?;
    Ok(Json(ApiResponse::session(
        "Rest paused".to_string(),
        snapshot,
    )))
}

/// Handle POST /users/:user_id/session/resume-rest
pub async fn resume_rest_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse>, AppError> {
    let snapshot = state.resume_rest(&user_id).await?;
    Ok(Json(ApiResponse::session(
        "Rest resumed".to_string(),
        snapshot,
    )))
}

/// Handle GET /users/:user_id/session
pub async fn session_status_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.session_status(&user_id).await?))
}

/// Handle DELETE /users/:user_id/session - abandon without recording
pub async fn abandon_session_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse>, AppError> {
    state.abandon_session(&user_id).await?;
    Ok(Json(ApiResponse::ok("Session abandoned".to_string())))
}

// ----- history and statistics -----

/// Handle GET /users/:user_id/history
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    Ok(Json(state.history(&user_id)?))
}

/// Handle GET /users/:user_id/stats
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStats>, AppError> {
    Ok(Json(state.stats(&user_id)?))
}

// ----- server plumbing -----

/// Handle GET /status - server status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, AppError> {
    let active_sessions = state.active_sessions().await?;
    let (last_action, last_action_time) = match state.get_last_action() {
        Some((action, time)) => (Some(action), Some(time)),
        None => (None, None),
    };
    Ok(Json(StatusResponse {
        uptime: state.get_uptime(),
        active_sessions,
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
