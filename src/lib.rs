//! Spot Me - a state-managed HTTP server for running timed workout sessions
//!
//! Users author workout templates (exercises with sets/reps/weight/rest),
//! run them as timed sessions stepping through sets with a rest countdown
//! between them, and review their history and statistics. All state is
//! persisted per user through a pluggable repository.

pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod stats;
pub mod storage;
pub mod tasks;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
pub use storage::{JsonFileRepository, MemoryRepository, Repository};
pub use utils::shutdown_signal;
