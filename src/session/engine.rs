// ABOUTME: Pure workout-session state machine: transitions, clocks, and derived statistics
// ABOUTME: Deterministic and tick-driven so every scenario is replayable in unit tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! Workout session state machine.

use crate::constants::energy::{WORKOUT_INTENSITY_FACTOR, WORKOUT_KCAL_PER_MINUTE};
use crate::errors::{AppError, AppResult};
use crate::models::WorkoutPlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Lifecycle state of a workout session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created but not started
    Ready,
    /// Working through a set
    Active,
    /// Between sets, rest clock running
    Resting,
    /// Frozen by the user
    Paused,
    /// Terminal; no further transitions
    Completed,
}

impl SessionStatus {
    /// Stable string form used in logs and persisted snapshots
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Active => "active",
            Self::Resting => "resting",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    /// Whether the session can still change
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Phase a paused session returns to on resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResumePhase {
    Active,
    Resting,
}

/// Per-exercise progress bookkeeping
#[derive(Debug, Clone, Copy, Default)]
struct ExerciseProgress {
    /// Sets finished so far; the displayed set number is this plus one
    sets_done: u32,
    completed: bool,
}

/// Point-in-time view over a session, recomputed on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Plan identifier
    pub workout_id: String,
    /// Plan display name
    pub workout_name: String,
    /// Current lifecycle state
    pub status: SessionStatus,
    /// Index of the exercise being performed
    pub current_exercise_index: usize,
    /// Name of the exercise being performed
    pub current_exercise_name: String,
    /// Displayed set number, 1-based and never past the exercise's sets
    pub current_set: u32,
    /// Number of exercises in the plan
    pub total_exercises: u32,
    /// Sets completed across all exercises
    pub sets_completed: u32,
    /// Exercises fully completed
    pub exercises_completed: u32,
    /// Seconds spent working
    pub active_secs: u64,
    /// Seconds spent resting
    pub rest_secs: u64,
    /// Seconds spent paused, outside every other clock
    pub paused_secs: u64,
    /// Seconds since start, pauses excluded
    pub total_secs: u64,
    /// Seconds spent on the current exercise
    pub exercise_elapsed_secs: u64,
    /// Progress of the running rest period
    pub rest_elapsed_secs: u32,
    /// Remainder of the running rest period
    pub rest_remaining_secs: u32,
    /// Overall progress in percent, clamped to [0, 100]
    pub overall_progress_percent: f64,
    /// Estimated calories burned so far (kcal)
    pub calories_estimated: u32,
    /// When the session started
    pub start_time: Option<DateTime<Utc>>,
    /// When the session completed
    pub end_time: Option<DateTime<Utc>>,
}

/// Deterministic workout-session state machine
///
/// Drives one plan from `Ready` to `Completed`. All clocks advance only
/// through [`tick`](Self::tick), one second at a time, which makes every
/// transition sequence exactly replayable. Rest expiry is evaluated inside
/// the tick rather than on a separate timer, so a pause or completion can
/// never race a stale rest callback.
#[derive(Debug, Clone)]
pub struct SessionEngine {
    plan: WorkoutPlan,
    status: SessionStatus,
    resumes_to: ResumePhase,
    current_exercise: usize,
    progress: Vec<ExerciseProgress>,
    sets_completed: u32,
    exercises_completed: u32,
    active_secs: u64,
    rest_total_secs: u64,
    paused_secs: u64,
    total_secs: u64,
    exercise_elapsed: u64,
    rest_elapsed: u32,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl SessionEngine {
    /// Create a session over a validated plan, in `Ready`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the plan is empty or an exercise has
    /// zero sets.
    pub fn new(plan: WorkoutPlan) -> AppResult<Self> {
        plan.validate()?;
        let progress = vec![ExerciseProgress::default(); plan.exercises.len()];
        Ok(Self {
            plan,
            status: SessionStatus::Ready,
            resumes_to: ResumePhase::Active,
            current_exercise: 0,
            progress,
            sets_completed: 0,
            exercises_completed: 0,
            active_secs: 0,
            rest_total_secs: 0,
            paused_secs: 0,
            total_secs: 0,
            exercise_elapsed: 0,
            rest_elapsed: 0,
            start_time: None,
            end_time: None,
        })
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Whether the session has reached `Completed`
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Begin the session
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the session is `Ready`.
    pub fn start(&mut self) -> AppResult<()> {
        if self.status != SessionStatus::Ready {
            return Err(AppError::invalid_transition("start", self.status));
        }
        self.status = SessionStatus::Active;
        self.start_time = Some(Utc::now());
        Ok(())
    }

    /// Finish the current set
    ///
    /// From `Active`, or from `Resting` where it implicitly ends the rest.
    /// Entering the rest of a mid-exercise set, advancing to the next
    /// exercise, or completing the session, depending on position.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from `Ready`, `Paused`, or `Completed`.
    pub fn complete_set(&mut self) -> AppResult<()> {
        match self.status {
            SessionStatus::Active | SessionStatus::Resting => {}
            other => return Err(AppError::invalid_transition("complete_set", other)),
        }
        self.rest_elapsed = 0;

        let exercise_sets = self.plan.exercises[self.current_exercise].sets;
        let rest_secs = self.plan.exercises[self.current_exercise].rest_secs;
        let progress = &mut self.progress[self.current_exercise];
        progress.sets_done += 1;
        self.sets_completed += 1;

        if progress.sets_done < exercise_sets {
            // More sets remain; a zero-rest exercise goes straight back to work
            self.status = if rest_secs == 0 {
                SessionStatus::Active
            } else {
                SessionStatus::Resting
            };
        } else {
            progress.completed = true;
            self.exercises_completed += 1;
            self.advance_or_finish();
        }
        Ok(())
    }

    /// Freeze all clocks
    ///
    /// Idempotent while already `Paused`. A rest in progress keeps its
    /// elapsed value; resuming continues the remainder.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from `Ready` or `Completed`.
    pub fn pause(&mut self) -> AppResult<()> {
        match self.status {
            SessionStatus::Active => {
                self.resumes_to = ResumePhase::Active;
                self.status = SessionStatus::Paused;
            }
            SessionStatus::Resting => {
                self.resumes_to = ResumePhase::Resting;
                self.status = SessionStatus::Paused;
            }
            SessionStatus::Paused => {}
            other => return Err(AppError::invalid_transition("pause", other)),
        }
        Ok(())
    }

    /// Return to the phase that was running before the pause
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the session is `Paused`.
    pub fn resume(&mut self) -> AppResult<()> {
        if self.status != SessionStatus::Paused {
            return Err(AppError::invalid_transition("resume", self.status));
        }
        self.status = match self.resumes_to {
            ResumePhase::Active => SessionStatus::Active,
            ResumePhase::Resting => SessionStatus::Resting,
        };
        Ok(())
    }

    /// Cut the running rest short
    ///
    /// Accepted as a no-op while `Active`; the user pressing skip just as
    /// the rest expires on its own is not an error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from `Ready`, `Paused`, or `Completed`.
    pub fn skip_rest(&mut self) -> AppResult<()> {
        match self.status {
            SessionStatus::Resting => {
                self.rest_elapsed = 0;
                self.status = SessionStatus::Active;
                Ok(())
            }
            SessionStatus::Active => Ok(()),
            other => Err(AppError::invalid_transition("skip_rest", other)),
        }
    }

    /// Move past the current exercise without crediting it
    ///
    /// Skipping the last exercise completes the session; the exercise index
    /// stays on the last valid position. Skipping from `Paused` resumes
    /// into the next exercise.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from `Ready` or `Completed`.
    pub fn skip_exercise(&mut self) -> AppResult<()> {
        match self.status {
            SessionStatus::Active | SessionStatus::Resting | SessionStatus::Paused => {}
            other => return Err(AppError::invalid_transition("skip_exercise", other)),
        }
        self.rest_elapsed = 0;
        self.advance_or_finish();
        Ok(())
    }

    /// End the session now, completed or not
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from `Ready` or `Completed`.
    pub fn end(&mut self) -> AppResult<()> {
        match self.status {
            SessionStatus::Active | SessionStatus::Resting | SessionStatus::Paused => {
                self.finish();
                Ok(())
            }
            other => Err(AppError::invalid_transition("end_workout", other)),
        }
    }

    /// Advance every clock by one second
    ///
    /// Exactly one bucket receives the second: active, rest, or paused.
    /// A rest reaching its target flips back to `Active` within the same
    /// tick, so the observable rest clock never shows the full target.
    pub fn tick(&mut self) {
        match self.status {
            SessionStatus::Active => {
                self.active_secs += 1;
                self.exercise_elapsed += 1;
                self.total_secs += 1;
            }
            SessionStatus::Resting => {
                self.rest_total_secs += 1;
                self.total_secs += 1;
                self.rest_elapsed += 1;
                if self.rest_elapsed >= self.plan.exercises[self.current_exercise].rest_secs {
                    self.rest_elapsed = 0;
                    self.status = SessionStatus::Active;
                }
            }
            SessionStatus::Paused => self.paused_secs += 1,
            SessionStatus::Ready | SessionStatus::Completed => {}
        }
    }

    /// Build the derived view
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let exercise = &self.plan.exercises[self.current_exercise];
        let progress = self.progress[self.current_exercise];
        let rest_remaining = if self.in_rest_phase() {
            exercise.rest_secs.saturating_sub(self.rest_elapsed)
        } else {
            0
        };

        SessionSnapshot {
            workout_id: self.plan.id.clone(),
            workout_name: self.plan.name.clone(),
            status: self.status,
            current_exercise_index: self.current_exercise,
            current_exercise_name: exercise.name.clone(),
            current_set: (progress.sets_done + 1).min(exercise.sets),
            total_exercises: self.plan.exercises.len() as u32,
            sets_completed: self.sets_completed,
            exercises_completed: self.exercises_completed,
            active_secs: self.active_secs,
            rest_secs: self.rest_total_secs,
            paused_secs: self.paused_secs,
            total_secs: self.total_secs,
            exercise_elapsed_secs: self.exercise_elapsed,
            rest_elapsed_secs: self.rest_elapsed,
            rest_remaining_secs: rest_remaining,
            overall_progress_percent: self.progress_percent(),
            calories_estimated: self.calories_estimated(),
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    /// Plan driven by this session
    #[must_use]
    pub const fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    fn in_rest_phase(&self) -> bool {
        self.status == SessionStatus::Resting
            || (self.status == SessionStatus::Paused && self.resumes_to == ResumePhase::Resting)
    }

    /// Move to the next exercise, or finish when there is none
    fn advance_or_finish(&mut self) {
        if self.current_exercise + 1 < self.plan.exercises.len() {
            self.current_exercise += 1;
            self.exercise_elapsed = 0;
            self.status = SessionStatus::Active;
        } else {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.status = SessionStatus::Completed;
        self.end_time = Some(Utc::now());
        self.rest_elapsed = 0;
    }

    fn progress_percent(&self) -> f64 {
        let total = self.plan.exercises.len() as f64;
        let exercise = &self.plan.exercises[self.current_exercise];
        let sets_done = f64::from(self.progress[self.current_exercise].sets_done);
        let through_exercise = self.current_exercise as f64 + sets_done / f64::from(exercise.sets);
        (through_exercise / total * 100.0).clamp(0.0, 100.0)
    }

    fn calories_estimated(&self) -> u32 {
        (self.active_secs as f64 / 60.0 * WORKOUT_KCAL_PER_MINUTE * WORKOUT_INTENSITY_FACTOR)
            .round() as u32
    }
}
