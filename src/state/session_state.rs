//! Workout session state machine
//!
//! One `SessionRunner` exists per in-flight session. It owns the snapshot of
//! the template being run, the exercise/set pointers, the append-only log of
//! completed sets and, while resting, the countdown timer. All mutation goes
//! through the session engine queue, so transitions never race.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::types::{CompletedSet, ExerciseSpec, HistoryEntry, WorkoutTemplate};

use super::timer_state::{RestTimer, TimerSignal, TimerState};

/// Where the session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// User is performing a set
    Active,
    /// Waiting out the rest between sets
    Resting,
    /// Terminal; every planned set is logged
    Complete,
}

/// What a successful `complete_set` did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Rest started; the caller must drive the countdown
    Resting,
    /// Zero-second rest expired on the spot, next set is immediately active
    NextSet,
    /// Exercise finished, moved to the first set of the next one (no rest
    /// between exercises, matching the running app's behavior)
    NextExercise,
    /// Last set of the last exercise; session is terminal
    Complete,
}

/// Read-only view of a session, returned to the API layer after every
/// engine command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub template_id: i64,
    pub template_name: String,
    pub phase: Phase,
    pub exercise_index: usize,
    pub set_index: usize,
    pub current_exercise: ExerciseSpec,
    pub total_sets: u32,
    pub completed_sets: Vec<CompletedSet>,
    pub progress_percent: f64,
    pub timer: Option<TimerState>,
}

#[derive(Debug)]
pub struct SessionRunner {
    template: WorkoutTemplate,
    exercise_index: usize,
    set_index: usize,
    phase: Phase,
    completed: Vec<CompletedSet>,
    rest_timer: Option<RestTimer>,
    started_at: DateTime<Utc>,
}

impl SessionRunner {
    /// Begin a session on a snapshot of the template.
    pub fn start(template: WorkoutTemplate) -> Result<Self, AppError> {
        if template.exercises.is_empty() {
            return Err(AppError::InvalidInput(
                "cannot start a session on an empty workout".into(),
            ));
        }
        // Stored data may have been edited by hand; re-check the invariants
        // the pointer arithmetic below relies on
        for exercise in &template.exercises {
            exercise.validate()?;
        }
        Ok(Self {
            template,
            exercise_index: 0,
            set_index: 0,
            phase: Phase::Active,
            completed: Vec::new(),
            rest_timer: None,
            started_at: Utc::now(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn exercise_index(&self) -> usize {
        self.exercise_index
    }

    pub fn set_index(&self) -> usize {
        self.set_index
    }

    pub fn template(&self) -> &WorkoutTemplate {
        &self.template
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_sets(&self) -> &[CompletedSet] {
        &self.completed
    }

    pub fn current_exercise(&self) -> &ExerciseSpec {
        // exercise_index never leaves 0..exercises.len()
        &self.template.exercises[self.exercise_index]
    }

    pub fn timer_state(&self) -> Option<TimerState> {
        self.rest_timer.as_ref().map(RestTimer::snapshot)
    }

    /// Derived on every read, never stored: `100 * completed / total sets`.
    pub fn progress_percent(&self) -> f64 {
        let total = self.template.total_sets() as f64;
        if total == 0.0 {
            return 0.0;
        }
        100.0 * self.completed.len() as f64 / total
    }

    /// Log the current set and advance the pointers.
    ///
    /// Missing, non-positive or out-of-range `reps` fall back to the
    /// exercise's plan, as does a missing, negative or non-finite `weight`. Only valid while
    /// `Active`; completing during rest or after the end is rejected so a
    /// double-tap cannot log a set twice.
    pub fn complete_set(
        &mut self,
        reps: Option<i64>,
        weight: Option<f64>,
    ) -> Result<SetOutcome, AppError> {
        match self.phase {
            Phase::Complete => {
                return Err(AppError::PreconditionNotMet(
                    "session is already complete".into(),
                ))
            }
            Phase::Resting => {
                return Err(AppError::PreconditionNotMet(
                    "rest in progress; skip it before completing the next set".into(),
                ))
            }
            Phase::Active => {}
        }

        let exercise = self.current_exercise().clone();

        let effective_reps = match reps {
            Some(r) if r > 0 => u32::try_from(r).unwrap_or(exercise.reps),
            _ => exercise.reps,
        };
        if effective_reps == 0 {
            return Err(AppError::PreconditionNotMet(
                "cannot complete a set of zero reps".into(),
            ));
        }
        let effective_weight = match weight {
            Some(w) if w.is_finite() && w >= 0.0 => w,
            _ => exercise.weight,
        };

        self.completed.push(CompletedSet {
            exercise_index: self.exercise_index,
            set_number: self.set_index as u32 + 1,
            reps: effective_reps,
            weight: effective_weight,
            completed_at: Utc::now(),
        });

        let last_set = self.set_index as u32 == exercise.sets - 1;
        let last_exercise = self.exercise_index == self.template.exercises.len() - 1;

        let outcome = if !last_set {
            self.set_index += 1;
            let (timer, signal) = RestTimer::start(exercise.rest_seconds);
            if signal == Some(TimerSignal::Expired) {
                // Zero rest configured, straight into the next set
                SetOutcome::NextSet
            } else {
                self.rest_timer = Some(timer);
                self.phase = Phase::Resting;
                SetOutcome::Resting
            }
        } else if !last_exercise {
            self.exercise_index += 1;
            self.set_index = 0;
            SetOutcome::NextExercise
        } else {
            self.phase = Phase::Complete;
            SetOutcome::Complete
        };

        debug!(
            "Set logged: exercise {} set {} -> {:?} ({:.0}% done)",
            self.exercise_index,
            self.set_index,
            outcome,
            self.progress_percent()
        );
        Ok(outcome)
    }

    /// Deliver one rest-timer second. Returns true when the rest just
    /// expired and the session moved back to `Active`. Ticks arriving in any
    /// other phase are stale and ignored.
    pub fn tick_rest(&mut self) -> bool {
        if self.phase != Phase::Resting {
            return false;
        }
        let expired = self
            .rest_timer
            .as_mut()
            .map(|t| t.tick() == Some(TimerSignal::Expired))
            .unwrap_or(false);
        if expired {
            self.finish_rest();
        }
        expired
    }

    /// End the rest early.
    pub fn skip_rest(&mut self) -> Result<(), AppError> {
        self.require_resting("skip rest")?;
        if let Some(timer) = self.rest_timer.as_mut() {
            timer.skip();
        }
        self.finish_rest();
        Ok(())
    }

    pub fn pause_rest(&mut self) -> Result<TimerState, AppError> {
        self.require_resting("pause rest")?;
        let timer = self.rest_timer.as_mut().ok_or_else(|| {
            AppError::PreconditionNotMet("no rest timer to pause".into())
        })?;
        timer.pause();
        Ok(timer.snapshot())
    }

    pub fn resume_rest(&mut self) -> Result<TimerState, AppError> {
        self.require_resting("resume rest")?;
        let timer = self.rest_timer.as_mut().ok_or_else(|| {
            AppError::PreconditionNotMet("no rest timer to resume".into())
        })?;
        timer.resume();
        Ok(timer.snapshot())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            template_id: self.template.id,
            template_name: self.template.name.clone(),
            phase: self.phase,
            exercise_index: self.exercise_index,
            set_index: self.set_index,
            current_exercise: self.current_exercise().clone(),
            total_sets: self.template.total_sets(),
            completed_sets: self.completed.clone(),
            progress_percent: self.progress_percent(),
            timer: self.timer_state(),
        }
    }

    /// Turn a completed session into its history record.
    pub fn into_history_entry(self) -> HistoryEntry {
        let now = Utc::now();
        HistoryEntry {
            id: now.timestamp_millis(),
            template_id: self.template.id,
            template_name: self.template.name.clone(),
            completed_at: now,
            duration_minutes: (now - self.started_at).num_minutes().max(0),
            completed_sets: self.completed,
        }
    }

    fn finish_rest(&mut self) {
        self.rest_timer = None;
        self.phase = Phase::Active;
    }

    fn require_resting(&self, action: &str) -> Result<(), AppError> {
        if self.phase == Phase::Resting {
            Ok(())
        } else {
            Err(AppError::PreconditionNotMet(format!(
                "cannot {} outside the resting phase",
                action
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkoutTemplate;

    fn single_exercise() -> WorkoutTemplate {
        WorkoutTemplate::create(
            "Bench Day",
            vec![ExerciseSpec::new("Bench Press", 3, 10, 50.0, 60)],
        )
        .unwrap()
    }

    fn two_exercises() -> WorkoutTemplate {
        WorkoutTemplate::create(
            "Full Body",
            vec![
                ExerciseSpec::new("Squats", 2, 5, 100.0, 90),
                ExerciseSpec::new("Pull-ups", 2, 8, 0.0, 60),
            ],
        )
        .unwrap()
    }

    #[test]
    fn three_set_walkthrough() {
        let mut runner = SessionRunner::start(single_exercise()).unwrap();
        assert_eq!(runner.phase(), Phase::Active);

        assert_eq!(
            runner.complete_set(Some(10), Some(50.0)).unwrap(),
            SetOutcome::Resting
        );
        assert_eq!(runner.phase(), Phase::Resting);
        assert_eq!(runner.set_index(), 1);
        assert_eq!(runner.completed_sets().len(), 1);

        runner.skip_rest().unwrap();
        assert_eq!(
            runner.complete_set(Some(10), Some(50.0)).unwrap(),
            SetOutcome::Resting
        );
        assert_eq!(runner.set_index(), 2);

        runner.skip_rest().unwrap();
        assert_eq!(
            runner.complete_set(Some(10), Some(50.0)).unwrap(),
            SetOutcome::Complete
        );
        assert_eq!(runner.phase(), Phase::Complete);
        assert_eq!(runner.completed_sets().len(), 3);
        assert!((runner.progress_percent() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn completing_every_set_logs_sum_of_sets() {
        let template = two_exercises();
        let total = template.total_sets() as usize;
        let mut runner = SessionRunner::start(template).unwrap();

        let mut outcomes = Vec::new();
        while runner.phase() != Phase::Complete {
            if runner.phase() == Phase::Resting {
                runner.skip_rest().unwrap();
            }
            outcomes.push(runner.complete_set(None, None).unwrap());
        }
        assert_eq!(runner.completed_sets().len(), total);
        assert_eq!(outcomes.last(), Some(&SetOutcome::Complete));
        // Exercise boundary crossed without a rest phase
        assert!(outcomes.contains(&SetOutcome::NextExercise));
    }

    #[test]
    fn progress_is_monotonic_and_hits_100_only_at_complete() {
        let mut runner = SessionRunner::start(two_exercises()).unwrap();
        let mut last = runner.progress_percent();
        assert_eq!(last, 0.0);

        while runner.phase() != Phase::Complete {
            if runner.phase() == Phase::Resting {
                runner.skip_rest().unwrap();
            }
            runner.complete_set(None, None).unwrap();
            let now = runner.progress_percent();
            assert!(now >= last);
            if runner.phase() != Phase::Complete {
                assert!(now < 100.0);
            }
            last = now;
        }
        assert!((last - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_input_coerces_to_plan() {
        let mut runner = SessionRunner::start(single_exercise()).unwrap();
        runner.complete_set(Some(-3), Some(-20.0)).unwrap();
        let set = &runner.completed_sets()[0];
        assert_eq!(set.reps, 10);
        assert_eq!(set.weight, 50.0);
        assert_eq!(set.set_number, 1);
    }

    #[test]
    fn oversized_reps_coerce_to_plan_not_truncate() {
        let mut runner = SessionRunner::start(single_exercise()).unwrap();
        // Larger than any u32; a wrapping cast would silently log 5 reps.
        runner.complete_set(Some(4_294_967_301), Some(50.0)).unwrap();
        assert_eq!(runner.completed_sets()[0].reps, 10);
    }

    #[test]
    fn complete_during_rest_is_rejected() {
        let mut runner = SessionRunner::start(single_exercise()).unwrap();
        runner.complete_set(None, None).unwrap();
        assert_eq!(runner.phase(), Phase::Resting);

        let err = runner.complete_set(None, None).unwrap_err();
        assert!(matches!(err, AppError::PreconditionNotMet(_)));
        assert_eq!(runner.completed_sets().len(), 1);
    }

    #[test]
    fn complete_after_terminal_is_rejected() {
        let mut runner = SessionRunner::start(WorkoutTemplate::create(
            "Quick",
            vec![ExerciseSpec::new("Deadlift", 1, 5, 120.0, 0)],
        )
        .unwrap())
        .unwrap();

        assert_eq!(runner.complete_set(None, None).unwrap(), SetOutcome::Complete);
        assert!(matches!(
            runner.complete_set(None, None),
            Err(AppError::PreconditionNotMet(_))
        ));
    }

    #[test]
    fn zero_rest_goes_straight_to_next_set() {
        let mut runner = SessionRunner::start(WorkoutTemplate::create(
            "No Rest",
            vec![ExerciseSpec::new("Burpees", 2, 15, 0.0, 0)],
        )
        .unwrap())
        .unwrap();

        assert_eq!(runner.complete_set(None, None).unwrap(), SetOutcome::NextSet);
        assert_eq!(runner.phase(), Phase::Active);
        assert_eq!(runner.set_index(), 1);
    }

    #[test]
    fn rest_tick_sequence_returns_to_active() {
        let mut runner = SessionRunner::start(WorkoutTemplate::create(
            "Short Rest",
            vec![ExerciseSpec::new("Rows", 2, 12, 40.0, 3)],
        )
        .unwrap())
        .unwrap();

        runner.complete_set(None, None).unwrap();
        assert!(!runner.tick_rest());
        assert!(!runner.tick_rest());
        assert!(runner.tick_rest());
        assert_eq!(runner.phase(), Phase::Active);
        assert!(runner.timer_state().is_none());

        // Stale tick after the rest resolved is a no-op
        assert!(!runner.tick_rest());
    }

    #[test]
    fn history_entry_carries_the_full_log() {
        let mut runner = SessionRunner::start(WorkoutTemplate::create(
            "Quick",
            vec![ExerciseSpec::new("Deadlift", 1, 5, 120.0, 0)],
        )
        .unwrap())
        .unwrap();
        runner.complete_set(Some(5), Some(125.0)).unwrap();

        let entry = runner.into_history_entry();
        assert_eq!(entry.template_name, "Quick");
        assert_eq!(entry.completed_sets.len(), 1);
        assert_eq!(entry.completed_sets[0].weight, 125.0);
        assert!(entry.duration_minutes >= 0);
    }

    #[test]
    fn pause_and_resume_only_while_resting() {
        let mut runner = SessionRunner::start(single_exercise()).unwrap();
        assert!(runner.pause_rest().is_err());

        runner.complete_set(None, None).unwrap();
        let paused = runner.pause_rest().unwrap();
        assert!(!paused.running);
        assert_eq!(paused.remaining_seconds, 60);

        let resumed = runner.resume_rest().unwrap();
        assert!(resumed.running);
    }
}
