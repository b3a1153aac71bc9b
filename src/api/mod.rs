//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Template authoring
        .route("/users/:user_id/templates", get(list_templates_handler))
        .route("/users/:user_id/templates", post(create_template_handler))
        .route(
            "/users/:user_id/templates/:template_id",
            put(update_template_handler),
        )
        .route(
            "/users/:user_id/templates/:template_id",
            delete(delete_template_handler),
        )
        // Session control
        .route("/users/:user_id/session/start", post(start_session_handler))
        .route(
            "/users/:user_id/session/complete-set",
            post(complete_set_handler),
        )
        .route("/users/:user_id/session/skip-rest", post(skip_rest_handler))
        .route(
            "/users/:user_id/session/pause-rest",
            post(pause_rest_handler),
        )
        .route(
            "/users/:user_id/session/resume-rest",
            post(resume_rest_handler),
        )
        .route("/users/:user_id/session", get(session_status_handler))
        .route("/users/:user_id/session", delete(abandon_session_handler))
        // History and statistics
        .route("/users/:user_id/history", get(history_handler))
        .route("/users/:user_id/stats", get(stats_handler))
        // Server plumbing
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
