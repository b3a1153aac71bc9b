//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::SessionSnapshot;

/// Envelope for session-control and mutation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSnapshot>,
}

impl ApiResponse {
    pub fn new(status: String, message: String, session: Option<SessionSnapshot>) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            session,
        }
    }

    /// Success carrying the post-action session view
    pub fn session(message: String, session: SessionSnapshot) -> Self {
        Self::new("ok".to_string(), message, Some(session))
    }

    /// Success with no session payload
    pub fn ok(message: String) -> Self {
        Self::new("ok".to_string(), message, None)
    }

    /// Failure envelope; also produced by the `AppError` response mapping
    pub fn failure(message: String) -> Self {
        Self::new("error".to_string(), message, None)
    }
}

/// Server status with uptime and engine information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub uptime: String,
    pub active_sessions: usize,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
