//! Session engine background task
//!
//! Every session mutation — user actions and rest-timer ticks alike — flows
//! through one mpsc queue into this task, which owns the per-user session
//! map. Serializing both kinds of events through a single consumer is what
//! keeps a tick from ever racing a `complete-set`.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::state::{SessionRunner, SessionSnapshot, SetOutcome};
use crate::storage::Repository;

/// Capacity of the engine command queue
pub const COMMAND_QUEUE_SIZE: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, AppError>>;

/// Commands accepted by the engine. User actions carry a reply channel;
/// `RestTick` is internal, produced by the per-rest ticker task.
#[derive(Debug)]
pub enum SessionCommand {
    Start {
        user_id: String,
        template_id: i64,
        reply: Reply<SessionSnapshot>,
    },
    CompleteSet {
        user_id: String,
        reps: Option<i64>,
        weight: Option<f64>,
        reply: Reply<SessionSnapshot>,
    },
    SkipRest {
        user_id: String,
        reply: Reply<SessionSnapshot>,
    },
    PauseRest {
        user_id: String,
        reply: Reply<SessionSnapshot>,
    },
    ResumeRest {
        user_id: String,
        reply: Reply<SessionSnapshot>,
    },
    Abandon {
        user_id: String,
        reply: Reply<()>,
    },
    Status {
        user_id: String,
        reply: Reply<SessionSnapshot>,
    },
    /// One second of rest elapsed. The generation stamps which ticker sent
    /// it; a stale generation means the ticker was cancelled while this tick
    /// was in flight, so it must be dropped.
    RestTick { user_id: String, generation: u64 },
    /// Number of in-flight sessions, for the status endpoint
    ActiveSessions { reply: oneshot::Sender<usize> },
}

/// Notifications published for observers (logging, tests)
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started { user_id: String },
    RestStarted { user_id: String, seconds: u64 },
    RestFinished { user_id: String },
    Completed { user_id: String, sets_logged: usize },
    Abandoned { user_id: String },
}

struct ActiveSession {
    runner: SessionRunner,
    /// Cancellation handle for the ticker driving the current rest period
    ticker_cancel: Option<watch::Sender<bool>>,
    /// Bumped whenever a ticker is started or cancelled
    generation: u64,
}

impl ActiveSession {
    fn cancel_ticker(&mut self) {
        if let Some(cancel) = self.ticker_cancel.take() {
            // Receiver may already be gone if the ticker exited on its own
            let _ = cancel.send(true);
        }
        self.generation += 1;
    }
}

/// Owns all in-flight sessions and consumes the command queue.
pub struct SessionEngine {
    repository: Arc<dyn Repository>,
    sessions: HashMap<String, ActiveSession>,
    /// Handed to ticker tasks so their ticks join the same queue
    command_tx: mpsc::Sender<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionEngine {
    pub fn new(
        repository: Arc<dyn Repository>,
        command_tx: mpsc::Sender<SessionCommand>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            repository,
            sessions: HashMap::new(),
            command_tx,
            event_tx,
        }
    }

    /// Process commands for the lifetime of the runtime. The engine keeps
    /// its own sender clone for ticker tasks, so the loop never sees the
    /// channel close; the task is torn down with the runtime on shutdown.
    pub async fn run(mut self, mut command_rx: mpsc::Receiver<SessionCommand>) {
        info!("Starting session engine task");
        while let Some(command) = command_rx.recv().await {
            self.handle(command);
        }
        info!("Session engine task stopped");
    }

    fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start {
                user_id,
                template_id,
                reply,
            } => {
                let _ = reply.send(self.start_session(&user_id, template_id));
            }
            SessionCommand::CompleteSet {
                user_id,
                reps,
                weight,
                reply,
            } => {
                let _ = reply.send(self.complete_set(&user_id, reps, weight));
            }
            SessionCommand::SkipRest { user_id, reply } => {
                let _ = reply.send(self.skip_rest(&user_id));
            }
            SessionCommand::PauseRest { user_id, reply } => {
                let _ = reply.send(self.pause_rest(&user_id));
            }
            SessionCommand::ResumeRest { user_id, reply } => {
                let _ = reply.send(self.resume_rest(&user_id));
            }
            SessionCommand::Abandon { user_id, reply } => {
                let _ = reply.send(self.abandon(&user_id));
            }
            SessionCommand::Status { user_id, reply } => {
                let _ = reply.send(self.status(&user_id));
            }
            SessionCommand::RestTick {
                user_id,
                generation,
            } => self.rest_tick(&user_id, generation),
            SessionCommand::ActiveSessions { reply } => {
                let _ = reply.send(self.sessions.len());
            }
        }
    }

    fn start_session(
        &mut self,
        user_id: &str,
        template_id: i64,
    ) -> Result<SessionSnapshot, AppError> {
        if self.sessions.contains_key(user_id) {
            return Err(AppError::PreconditionNotMet(
                "a session is already in progress".into(),
            ));
        }

        let data = self.repository.load(user_id)?;
        let template = data
            .templates
            .iter()
            .find(|t| t.id == template_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("workout {}", template_id)))?;

        info!(
            "User '{}' starting '{}' ({} exercises)",
            user_id,
            template.name,
            template.exercises.len()
        );
        // Snapshot semantics: the runner clones the template, so edits to
        // the stored copy never touch a running session
        let runner = SessionRunner::start(template)?;
        let snapshot = runner.snapshot();
        self.sessions.insert(
            user_id.to_string(),
            ActiveSession {
                runner,
                ticker_cancel: None,
                generation: 0,
            },
        );
        self.publish(SessionEvent::Started {
            user_id: user_id.to_string(),
        });
        Ok(snapshot)
    }

    fn complete_set(
        &mut self,
        user_id: &str,
        reps: Option<i64>,
        weight: Option<f64>,
    ) -> Result<SessionSnapshot, AppError> {
        let command_tx = self.command_tx.clone();
        let session = self.session_mut(user_id)?;
        let outcome = session.runner.complete_set(reps, weight)?;

        match outcome {
            SetOutcome::Resting => {
                let seconds = session
                    .runner
                    .timer_state()
                    .map(|t| t.total_seconds)
                    .unwrap_or(0);
                Self::start_ticker(session, user_id, &command_tx);
                let snapshot = session.runner.snapshot();
                self.publish(SessionEvent::RestStarted {
                    user_id: user_id.to_string(),
                    seconds,
                });
                Ok(snapshot)
            }
            SetOutcome::NextSet | SetOutcome::NextExercise => Ok(session.runner.snapshot()),
            SetOutcome::Complete => {
                let mut session = self
                    .sessions
                    .remove(user_id)
                    .ok_or(AppError::EngineUnavailable)?;
                session.cancel_ticker();
                let snapshot = session.runner.snapshot();
                let sets_logged = snapshot.completed_sets.len();
                self.persist_history(user_id, session.runner);
                info!(
                    "User '{}' completed their workout ({} sets logged)",
                    user_id, sets_logged
                );
                self.publish(SessionEvent::Completed {
                    user_id: user_id.to_string(),
                    sets_logged,
                });
                Ok(snapshot)
            }
        }
    }

    fn skip_rest(&mut self, user_id: &str) -> Result<SessionSnapshot, AppError> {
        let session = self.session_mut(user_id)?;
        session.runner.skip_rest()?;
        session.cancel_ticker();
        let snapshot = session.runner.snapshot();
        self.publish(SessionEvent::RestFinished {
            user_id: user_id.to_string(),
        });
        Ok(snapshot)
    }

    fn pause_rest(&mut self, user_id: &str) -> Result<SessionSnapshot, AppError> {
        let session = self.session_mut(user_id)?;
        session.runner.pause_rest()?;
        // Pausing cancels the scheduled ticks outright; resume re-arms them
        session.cancel_ticker();
        Ok(session.runner.snapshot())
    }

    fn resume_rest(&mut self, user_id: &str) -> Result<SessionSnapshot, AppError> {
        let command_tx = self.command_tx.clone();
        let session = self.session_mut(user_id)?;
        session.runner.resume_rest()?;
        Self::start_ticker(session, user_id, &command_tx);
        Ok(session.runner.snapshot())
    }

    fn abandon(&mut self, user_id: &str) -> Result<(), AppError> {
        let mut session = self
            .sessions
            .remove(user_id)
            .ok_or_else(|| AppError::NotFound("no active session".into()))?;
        session.cancel_ticker();
        info!(
            "User '{}' abandoned their session with {} sets logged",
            user_id,
            session.runner.completed_sets().len()
        );
        // Discarded: nothing is written to history for an abandoned session
        self.publish(SessionEvent::Abandoned {
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    fn status(&self, user_id: &str) -> Result<SessionSnapshot, AppError> {
        self.sessions
            .get(user_id)
            .map(|s| s.runner.snapshot())
            .ok_or_else(|| AppError::NotFound("no active session".into()))
    }

    fn rest_tick(&mut self, user_id: &str, generation: u64) {
        let Some(session) = self.sessions.get_mut(user_id) else {
            return;
        };
        if session.generation != generation {
            debug!("Dropping stale rest tick for user '{}'", user_id);
            return;
        }
        if session.runner.tick_rest() {
            session.cancel_ticker();
            info!("Rest finished for user '{}'", user_id);
            self.publish(SessionEvent::RestFinished {
                user_id: user_id.to_string(),
            });
        }
    }

    fn session_mut(&mut self, user_id: &str) -> Result<&mut ActiveSession, AppError> {
        self.sessions
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound("no active session".into()))
    }

    /// Spawn a ticker feeding one `RestTick` per second into the queue.
    /// Cancellation is prompt (watch channel) and any tick already queued is
    /// discarded by the generation check.
    fn start_ticker(
        session: &mut ActiveSession,
        user_id: &str,
        command_tx: &mpsc::Sender<SessionCommand>,
    ) {
        session.cancel_ticker();
        let generation = session.generation;
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        session.ticker_cancel = Some(cancel_tx);

        let user_id = user_id.to_string();
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first interval tick completes immediately; swallow it so
            // the countdown starts a full second after the rest began
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let tick = SessionCommand::RestTick {
                            user_id: user_id.clone(),
                            generation,
                        };
                        if command_tx.send(tick).await.is_err() {
                            break;
                        }
                    }
                    _ = cancel_rx.changed() => break,
                }
            }
            debug!("Rest ticker stopped for user '{}'", user_id);
        });
    }

    fn persist_history(&self, user_id: &str, runner: SessionRunner) {
        let entry = runner.into_history_entry();
        let result = self.repository.load(user_id).and_then(|mut data| {
            // Newest first, as the app displays it
            data.history.insert(0, entry);
            self.repository.save(user_id, &data)
        });
        if let Err(e) = result {
            error!("Failed to persist history for user '{}': {}", user_id, e);
        }
    }

    fn publish(&self, event: SessionEvent) {
        // Lagging or absent subscribers are fine; events are advisory
        if self.event_tx.send(event).is_err() {
            warn!("No session event subscribers");
        }
    }
}
