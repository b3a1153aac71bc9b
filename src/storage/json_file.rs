//! JSON-file-per-user repository

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use super::{validate_user_id, Repository, StorageError, UserData};

/// Stores each user's data as `<data_dir>/<user_id>.json`.
///
/// Writes go through a temp file in the same directory followed by a rename,
/// so a crash mid-write never leaves a truncated blob behind.
pub struct JsonFileRepository {
    data_dir: PathBuf,
}

impl JsonFileRepository {
    /// Open the repository, creating the data directory if needed.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        info!("Opened user data directory at {:?}", data_dir);
        Ok(Self { data_dir })
    }

    fn user_path(&self, user_id: &str) -> Result<PathBuf, StorageError> {
        validate_user_id(user_id)?;
        Ok(self.data_dir.join(format!("{}.json", user_id)))
    }

    fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(contents)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Repository for JsonFileRepository {
    fn load(&self, user_id: &str) -> Result<UserData, StorageError> {
        let path = self.user_path(user_id)?;
        if !path.exists() {
            debug!("No data file for user '{}', starting empty", user_id);
            return Ok(UserData::default());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, user_id: &str, data: &UserData) -> Result<(), StorageError> {
        let path = self.user_path(user_id)?;
        let serialized = serde_json::to_vec_pretty(data)?;
        Self::write_atomic(&path, &serialized)?;
        debug!(
            "Saved {} templates / {} history entries for user '{}'",
            data.templates.len(),
            data.history.len(),
            user_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExerciseSpec, WorkoutTemplate};

    fn sample_data() -> UserData {
        UserData {
            templates: vec![WorkoutTemplate::create(
                "Leg Day",
                vec![ExerciseSpec::new("Squats", 5, 5, 100.0, 180)],
            )
            .unwrap()],
            history: Vec::new(),
        }
    }

    #[test]
    fn round_trips_user_data() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path()).unwrap();

        let data = sample_data();
        repo.save("alice", &data).unwrap();
        let loaded = repo.load("alice").unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn unknown_user_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path()).unwrap();
        assert_eq!(repo.load("nobody").unwrap(), UserData::default());
    }

    #[test]
    fn save_replaces_previous_blob() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path()).unwrap();

        repo.save("bob", &sample_data()).unwrap();
        repo.save("bob", &UserData::default()).unwrap();
        assert_eq!(repo.load("bob").unwrap(), UserData::default());
    }

    #[test]
    fn rejects_path_escaping_user_id() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path()).unwrap();
        assert!(matches!(
            repo.load("../sneaky"),
            Err(StorageError::InvalidUserId(_))
        ));
    }
}
