//! Per-user persistence
//!
//! The core never touches the backing medium directly: it goes through the
//! `Repository` trait, which loads and rewrites a user's full data blob on
//! every mutation. Production uses one JSON file per user; tests use the
//! in-memory double.

pub mod json_file;
pub mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{HistoryEntry, WorkoutTemplate};

pub use json_file::JsonFileRepository;
pub use memory::MemoryRepository;

/// Everything persisted for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub templates: Vec<WorkoutTemplate>,
    /// Newest first
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt user data: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("invalid user id '{0}'")]
    InvalidUserId(String),
}

/// User-scoped key-value store: `user_id -> UserData` blob, read in full at
/// session start and rewritten in full on every mutation.
pub trait Repository: Send + Sync {
    /// Load a user's data; a user never seen before loads as empty.
    fn load(&self, user_id: &str) -> Result<UserData, StorageError>;

    /// Persist the full blob for a user, replacing whatever was there.
    fn save(&self, user_id: &str, data: &UserData) -> Result<(), StorageError>;
}

/// User ids become file names, so restrict them to a path-safe alphabet.
pub fn validate_user_id(user_id: &str) -> Result<(), StorageError> {
    let ok = !user_id.is_empty()
        && user_id.len() <= 64
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidUserId(user_id.to_string()))
    }
}
