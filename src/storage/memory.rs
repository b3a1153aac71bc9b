//! In-memory repository used by the test suite

use std::{collections::HashMap, sync::Mutex};

use super::{validate_user_id, Repository, StorageError, UserData};

/// HashMap-backed `Repository` double. Same user-id rules as the file store
/// so tests exercise the identical validation path.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    users: Mutex<HashMap<String, UserData>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for MemoryRepository {
    fn load(&self, user_id: &str) -> Result<UserData, StorageError> {
        validate_user_id(user_id)?;
        let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        Ok(users.get(user_id).cloned().unwrap_or_default())
    }

    fn save(&self, user_id: &str, data: &UserData) -> Result<(), StorageError> {
        validate_user_id(user_id)?;
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        users.insert(user_id.to_string(), data.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExerciseSpec, WorkoutTemplate};

    #[test]
    fn save_then_load_round_trips() {
        let repo = MemoryRepository::new();
        let data = UserData {
            templates: vec![WorkoutTemplate::create(
                "Push Day",
                vec![ExerciseSpec::new("Bench Press", 3, 10, 50.0, 60)],
            )
            .unwrap()],
            history: Vec::new(),
        };
        repo.save("carol", &data).unwrap();
        assert_eq!(repo.load("carol").unwrap(), data);
    }

    #[test]
    fn users_are_isolated() {
        let repo = MemoryRepository::new();
        repo.save("a", &UserData::default()).unwrap();
        assert_eq!(repo.load("b").unwrap(), UserData::default());
    }

    #[test]
    fn same_rules_as_the_file_store() {
        let repo = MemoryRepository::new();
        assert!(matches!(
            repo.load("../escape"),
            Err(StorageError::InvalidUserId(_))
        ));
    }
}
