//! Main application state shared with the HTTP handlers

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::info;

use crate::error::AppError;
use crate::stats::UserStats;
use crate::storage::{Repository, UserData};
use crate::tasks::{SessionCommand, SessionEvent, SessionEngine, COMMAND_QUEUE_SIZE};
use crate::types::{ExerciseSpec, HistoryEntry, WorkoutTemplate};

use super::session_state::SessionSnapshot;

/// Shared state: the repository for template/history reads and writes, the
/// command queue into the session engine, and server metadata.
pub struct AppState {
    repository: Arc<dyn Repository>,
    command_tx: mpsc::Sender<SessionCommand>,
    pub event_tx: broadcast::Sender<SessionEvent>,
    /// Keep one receiver alive so event publishing never errors
    _event_rx: broadcast::Receiver<SessionEvent>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking for the status endpoint
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    /// Wire up the state and spawn the session engine task.
    pub fn new(repository: Arc<dyn Repository>, port: u16, host: String) -> Arc<Self> {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_SIZE);
        let (event_tx, event_rx) = broadcast::channel(100);

        let engine = SessionEngine::new(
            Arc::clone(&repository),
            command_tx.clone(),
            event_tx.clone(),
        );
        tokio::spawn(engine.run(command_rx));

        Arc::new(Self {
            repository,
            command_tx,
            event_tx,
            _event_rx: event_rx,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        })
    }

    // ----- session engine commands -----

    pub async fn start_session(
        &self,
        user_id: &str,
        template_id: i64,
    ) -> Result<SessionSnapshot, AppError> {
        self.track_action("start-session");
        self.send(|reply| SessionCommand::Start {
            user_id: user_id.to_string(),
            template_id,
            reply,
        })
        .await
    }

    pub async fn complete_set(
        &self,
        user_id: &str,
        reps: Option<i64>,
        weight: Option<f64>,
    ) -> Result<SessionSnapshot, AppError> {
        self.track_action("complete-set");
        self.send(|reply| SessionCommand::CompleteSet {
            user_id: user_id.to_string(),
            reps,
            weight,
            reply,
        })
        .await
    }

    pub async fn skip_rest(&self, user_id: &str) -> Result<SessionSnapshot, AppError> {
        self.track_action("skip-rest");
        self.send(|reply| SessionCommand::SkipRest {
            user_id: user_id.to_string(),
            reply,
        })
        .await
    }

    pub async fn pause_rest(&self, user_id: &str) -> Result<SessionSnapshot, AppError> {
        self.track_action("pause-rest");
        self.send(|reply| SessionCommand::PauseRest {
            user_id: user_id.to_string(),
            reply,
        })
        .await
    }

    pub async fn resume_rest(&self, user_id: &str) -> Result<SessionSnapshot, AppError> {
        self.track_action("resume-rest");
        self.send(|reply| SessionCommand::ResumeRest {
            user_id: user_id.to_string(),
            reply,
        })
        .await
    }

    pub async fn abandon_session(&self, user_id: &str) -> Result<(), AppError> {
        self.track_action("abandon-session");
        self.send(|reply| SessionCommand::Abandon {
            user_id: user_id.to_string(),
            reply,
        })
        .await
    }

    pub async fn session_status(&self, user_id: &str) -> Result<SessionSnapshot, AppError> {
        self.send(|reply| SessionCommand::Status {
            user_id: user_id.to_string(),
            reply,
        })
        .await
    }

    pub async fn active_sessions(&self) -> Result<usize, AppError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(SessionCommand::ActiveSessions { reply: reply_tx })
            .await
            .map_err(|_| AppError::EngineUnavailable)?;
        reply_rx.await.map_err(|_| AppError::EngineUnavailable)
    }

    // ----- template authoring and reads (repository-backed) -----

    pub fn list_templates(&self, user_id: &str) -> Result<Vec<WorkoutTemplate>, AppError> {
        Ok(self.repository.load(user_id)?.templates)
    }

    pub fn create_template(
        &self,
        user_id: &str,
        name: &str,
        exercises: Vec<ExerciseSpec>,
    ) -> Result<WorkoutTemplate, AppError> {
        self.track_action("create-template");
        let template = WorkoutTemplate::create(name, exercises)?;
        let mut data = self.repository.load(user_id)?;
        data.templates.push(template.clone());
        self.repository.save(user_id, &data)?;
        info!("User '{}' created workout '{}'", user_id, template.name);
        Ok(template)
    }

    pub fn update_template(
        &self,
        user_id: &str,
        template_id: i64,
        name: &str,
        exercises: Vec<ExerciseSpec>,
    ) -> Result<WorkoutTemplate, AppError> {
        self.track_action("update-template");
        let mut data = self.repository.load(user_id)?;
        let slot = data
            .templates
            .iter_mut()
            .find(|t| t.id == template_id)
            .ok_or_else(|| AppError::NotFound(format!("workout {}", template_id)))?;

        // Re-validate through the constructor, then keep identity fields
        let mut updated = WorkoutTemplate::create(name, exercises)?;
        updated.id = slot.id;
        updated.created_at = slot.created_at;
        *slot = updated.clone();
        self.repository.save(user_id, &data)?;
        info!("User '{}' updated workout '{}'", user_id, updated.name);
        Ok(updated)
    }

    pub fn delete_template(&self, user_id: &str, template_id: i64) -> Result<(), AppError> {
        self.track_action("delete-template");
        let mut data = self.repository.load(user_id)?;
        let before = data.templates.len();
        data.templates.retain(|t| t.id != template_id);
        if data.templates.len() == before {
            return Err(AppError::NotFound(format!("workout {}", template_id)));
        }
        self.repository.save(user_id, &data)?;
        info!("User '{}' deleted workout {}", user_id, template_id);
        Ok(())
    }

    pub fn history(&self, user_id: &str) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(self.repository.load(user_id)?.history)
    }

    pub fn stats(&self, user_id: &str) -> Result<UserStats, AppError> {
        let data: UserData = self.repository.load(user_id)?;
        Ok(UserStats::compute(&data, Utc::now()))
    }

    // ----- server metadata -----

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    pub fn get_last_action(&self) -> Option<(String, DateTime<Utc>)> {
        self.last_action
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    fn track_action(&self, action: &str) {
        if let Ok(mut guard) = self.last_action.lock() {
            *guard = Some((action.to_string(), Utc::now()));
        }
    }

    async fn send<T, F>(&self, build: F) -> Result<T, AppError>
    where
        F: FnOnce(oneshot::Sender<Result<T, AppError>>) -> SessionCommand,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| AppError::EngineUnavailable)?;
        reply_rx.await.map_err(|_| AppError::EngineUnavailable)?
    }
}
