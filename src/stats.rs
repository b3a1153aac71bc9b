//! Dashboard and profile statistics
//!
//! Pure functions over a user's stored data; everything here is derived on
//! read and never persisted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::UserData;

/// Aggregate numbers shown on the dashboard and profile pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    /// Authored workout templates
    pub total_workouts: usize,
    /// Templates created in the last 7 days
    pub workouts_this_week: usize,
    /// Templates created in the last month
    pub workouts_this_month: usize,
    /// Exercises summed across all templates
    pub total_exercises: usize,
    /// Mean estimated duration across templates, rounded
    pub avg_duration_minutes: u32,
    /// Finished sessions on record
    pub total_sessions: usize,
    /// Sessions finished in the last month
    pub sessions_this_month: usize,
    /// Sets logged across all finished sessions
    pub total_sets_completed: usize,
    /// Σ reps × weight over every logged set, in kg
    pub total_volume_kg: f64,
}

impl UserStats {
    pub fn compute(data: &UserData, now: DateTime<Utc>) -> Self {
        let week_ago = now - Duration::days(7);
        let month_ago = now - Duration::days(30);

        let total_workouts = data.templates.len();
        let total_exercises = data.templates.iter().map(|t| t.exercises.len()).sum();
        let avg_duration_minutes = if total_workouts > 0 {
            let sum: u64 = data
                .templates
                .iter()
                .map(|t| u64::from(t.estimated_minutes))
                .sum();
            (sum as f64 / total_workouts as f64).round() as u32
        } else {
            0
        };

        let completed_sets = || data.history.iter().flat_map(|h| h.completed_sets.iter());

        Self {
            total_workouts,
            workouts_this_week: data
                .templates
                .iter()
                .filter(|t| t.created_at > week_ago)
                .count(),
            workouts_this_month: data
                .templates
                .iter()
                .filter(|t| t.created_at > month_ago)
                .count(),
            total_exercises,
            avg_duration_minutes,
            total_sessions: data.history.len(),
            sessions_this_month: data
                .history
                .iter()
                .filter(|h| h.completed_at > month_ago)
                .count(),
            total_sets_completed: completed_sets().count(),
            total_volume_kg: completed_sets()
                .map(|s| f64::from(s.reps) * s.weight)
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompletedSet, ExerciseSpec, HistoryEntry, WorkoutTemplate};

    fn template(name: &str) -> WorkoutTemplate {
        WorkoutTemplate::create(
            name,
            vec![
                ExerciseSpec::new("Bench Press", 3, 10, 50.0, 60),
                ExerciseSpec::new("Rows", 3, 12, 40.0, 60),
            ],
        )
        .unwrap()
    }

    fn history_entry(completed_at: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            id: completed_at.timestamp_millis(),
            template_id: 1,
            template_name: "Push Day".into(),
            completed_at,
            duration_minutes: 40,
            completed_sets: vec![
                CompletedSet {
                    exercise_index: 0,
                    set_number: 1,
                    reps: 10,
                    weight: 50.0,
                    completed_at,
                },
                CompletedSet {
                    exercise_index: 0,
                    set_number: 2,
                    reps: 8,
                    weight: 52.5,
                    completed_at,
                },
            ],
        }
    }

    #[test]
    fn empty_data_yields_zeros() {
        let stats = UserStats::compute(&UserData::default(), Utc::now());
        assert_eq!(stats.total_workouts, 0);
        assert_eq!(stats.avg_duration_minutes, 0);
        assert_eq!(stats.total_volume_kg, 0.0);
    }

    #[test]
    fn template_counts_and_average() {
        let data = UserData {
            templates: vec![template("A"), template("B")],
            history: Vec::new(),
        };
        let stats = UserStats::compute(&data, Utc::now());
        assert_eq!(stats.total_workouts, 2);
        assert_eq!(stats.workouts_this_week, 2);
        assert_eq!(stats.total_exercises, 4);
        // Each template: 6 sets x 90s = 540s = 9 min
        assert_eq!(stats.avg_duration_minutes, 9);
    }

    #[test]
    fn volume_and_session_windows() {
        let now = Utc::now();
        let data = UserData {
            templates: Vec::new(),
            history: vec![
                history_entry(now - Duration::days(2)),
                history_entry(now - Duration::days(45)),
            ],
        };
        let stats = UserStats::compute(&data, now);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.sessions_this_month, 1);
        assert_eq!(stats.total_sets_completed, 4);
        // 2 x (10x50 + 8x52.5) = 2 x 920
        assert_eq!(stats.total_volume_kg, 1840.0);
    }
}
