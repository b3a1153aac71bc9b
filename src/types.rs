//! Domain types shared across the API, session engine and storage layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One exercise's planned parameters within a workout template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSpec {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    pub rest_seconds: u64,
}

/// Upper bounds on authored parameters. Generous for any real workout while
/// keeping the duration arithmetic far from integer limits.
pub const MAX_SETS: u32 = 100;
pub const MAX_REPS: u32 = 1000;
pub const MAX_REST_SECONDS: u64 = 3600;

impl ExerciseSpec {
    pub fn new(name: &str, sets: u32, reps: u32, weight: f64, rest_seconds: u64) -> Self {
        Self {
            name: name.to_string(),
            sets,
            reps,
            weight,
            rest_seconds,
        }
    }

    /// Validate the authored parameters.
    /// Every exercise needs a name, at least one set and at least one rep;
    /// weight may be zero (bodyweight) but never negative. Sets, reps and
    /// rest are bounded above so no downstream sum can overflow.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidInput("exercise name is required".into()));
        }
        if self.sets == 0 || self.sets > MAX_SETS {
            return Err(AppError::InvalidInput(format!(
                "exercise '{}' must have between 1 and {} sets",
                self.name, MAX_SETS
            )));
        }
        if self.reps == 0 || self.reps > MAX_REPS {
            return Err(AppError::InvalidInput(format!(
                "exercise '{}' must have between 1 and {} reps",
                self.name, MAX_REPS
            )));
        }
        if self.weight < 0.0 || !self.weight.is_finite() {
            return Err(AppError::InvalidInput(format!(
                "exercise '{}' has an invalid weight",
                self.name
            )));
        }
        if self.rest_seconds > MAX_REST_SECONDS {
            return Err(AppError::InvalidInput(format!(
                "exercise '{}' rest exceeds the {} second maximum",
                self.name, MAX_REST_SECONDS
            )));
        }
        Ok(())
    }
}

/// A user-authored, reusable workout: an ordered list of exercises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    /// Creation time in epoch milliseconds doubles as the identifier
    pub id: i64,
    pub name: String,
    pub exercises: Vec<ExerciseSpec>,
    pub estimated_minutes: u32,
    pub created_at: DateTime<Utc>,
}

impl WorkoutTemplate {
    /// Build a validated template, assigning the id and duration estimate.
    pub fn create(name: &str, exercises: Vec<ExerciseSpec>) -> Result<Self, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("workout name is required".into()));
        }
        if exercises.is_empty() {
            return Err(AppError::InvalidInput(
                "a workout needs at least one exercise".into(),
            ));
        }
        for exercise in &exercises {
            exercise.validate()?;
        }

        let now = Utc::now();
        Ok(Self {
            id: now.timestamp_millis(),
            name: name.trim().to_string(),
            estimated_minutes: estimate_minutes(&exercises),
            exercises,
            created_at: now,
        })
    }

    /// Total number of sets across all exercises
    pub fn total_sets(&self) -> u32 {
        self.exercises
            .iter()
            .fold(0u32, |acc, e| acc.saturating_add(e.sets))
    }
}

/// Estimate workout duration: each set takes roughly 30 seconds of work
/// plus the configured rest. Saturating so hand-edited stored data can
/// never panic the estimate.
pub fn estimate_minutes(exercises: &[ExerciseSpec]) -> u32 {
    let total_seconds = exercises.iter().fold(0u64, |acc, e| {
        acc.saturating_add(u64::from(e.sets).saturating_mul(e.rest_seconds.saturating_add(30)))
    });
    ((total_seconds as f64) / 60.0).round() as u32
}

/// One finished set within a session. Append-only: never mutated after
/// creation, exactly one per (exercise_index, set_number) pair completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSet {
    pub exercise_index: usize,
    /// 1-based set number within the exercise
    pub set_number: u32,
    pub reps: u32,
    pub weight: f64,
    pub completed_at: DateTime<Utc>,
}

/// A finished session as recorded in the user's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub template_id: i64,
    pub template_name: String,
    pub completed_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub completed_sets: Vec<CompletedSet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench_press() -> ExerciseSpec {
        ExerciseSpec::new("Bench Press", 3, 10, 50.0, 60)
    }

    #[test]
    fn create_assigns_estimate_and_id() {
        let template = WorkoutTemplate::create("Push Day", vec![bench_press()]).unwrap();
        // 3 sets x (60s rest + 30s work) = 270s -> 4.5 min, rounds to 5
        assert_eq!(template.estimated_minutes, 5);
        assert_eq!(template.total_sets(), 3);
        assert!(template.id > 0);
    }

    #[test]
    fn estimate_sums_across_exercises() {
        let exercises = vec![
            ExerciseSpec::new("Squats", 4, 8, 80.0, 90),
            ExerciseSpec::new("Plank", 2, 1, 0.0, 30),
        ];
        // 4x120 + 2x60 = 600s = 10 min
        assert_eq!(estimate_minutes(&exercises), 10);
    }

    #[test]
    fn rejects_empty_workout_name() {
        let err = WorkoutTemplate::create("  ", vec![bench_press()]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn rejects_workout_without_exercises() {
        let err = WorkoutTemplate::create("Push Day", vec![]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_sets_and_negative_weight() {
        let mut zero_sets = bench_press();
        zero_sets.sets = 0;
        assert!(zero_sets.validate().is_err());

        let mut negative = bench_press();
        negative.weight = -5.0;
        assert!(negative.validate().is_err());
    }

    #[test]
    fn rejects_absurd_rest_and_set_counts() {
        let hold = ExerciseSpec::new("Isometric Hold", 2, 1, 0.0, u64::MAX);
        assert!(hold.validate().is_err());
        let err = WorkoutTemplate::create("Endurance", vec![hold]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let mut marathon = bench_press();
        marathon.sets = MAX_SETS + 1;
        assert!(marathon.validate().is_err());
    }

    #[test]
    fn estimate_saturates_on_oversized_stored_data() {
        // Stored JSON is user-editable, so the estimate must not panic
        // even when the bounds checked at creation time were bypassed.
        let exercises = vec![ExerciseSpec::new("Isometric Hold", 2, 1, 0.0, u64::MAX)];
        assert_eq!(estimate_minutes(&exercises), u32::MAX);

        let template = WorkoutTemplate {
            id: 1,
            name: "Endurance".into(),
            estimated_minutes: 0,
            exercises: vec![
                ExerciseSpec::new("A", u32::MAX, 1, 0.0, 60),
                ExerciseSpec::new("B", u32::MAX, 1, 0.0, 60),
            ],
            created_at: Utc::now(),
        };
        assert_eq!(template.total_sets(), u32::MAX);
    }

    #[test]
    fn bodyweight_exercise_is_valid() {
        assert!(ExerciseSpec::new("Pull-ups", 3, 8, 0.0, 120).validate().is_ok());
    }
}
