// ABOUTME: Core data models for step tracking, workouts, and goal profiles
// ABOUTME: Defines the persisted record shapes and the value types shared across services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! # Data Models
//!
//! Core data structures shared across the tracker, session engine, and record
//! store. Persisted shapes ([`DailyStepRecord`], [`WorkoutRecord`],
//! [`GoalProfile`]) are keyed by user and serialized with serde; transient
//! shapes ([`StepSample`]) never leave the process.
//!
//! ## Design Principles
//!
//! - **Backend Agnostic**: the same records round-trip through the in-memory
//!   and SQLite stores
//! - **Serializable**: all persisted models support JSON serialization
//! - **Type Safe**: sources and statuses are enums, not stringly-typed fields

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// A usable 3-axis acceleration sample in sample-stream event time
///
/// Produced from a raw platform reading once all components are known to be
/// present. Timestamps are milliseconds on the sample clock, which keeps the
/// step detector exactly replayable in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSample {
    /// Acceleration along the x axis, gravity included
    pub x: f64,
    /// Acceleration along the y axis, gravity included
    pub y: f64,
    /// Acceleration along the z axis, gravity included
    pub z: f64,
    /// Sample timestamp in milliseconds
    pub timestamp_ms: u64,
}

impl StepSample {
    /// Create a sample from known-good components
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self {
            x,
            y,
            z,
            timestamp_ms,
        }
    }

    /// Build a sample from possibly-missing components
    ///
    /// Platform motion events may deliver partial vectors; a sample with any
    /// missing component is unusable and yields `None`.
    #[must_use]
    pub fn from_components(
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
        timestamp_ms: u64,
    ) -> Option<Self> {
        match (x, y, z) {
            (Some(x), Some(y), Some(z)) => Some(Self::new(x, y, z, timestamp_ms)),
            _ => None,
        }
    }

    /// Euclidean magnitude of the acceleration vector
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.x
            .mul_add(self.x, self.y.mul_add(self.y, self.z * self.z))
            .sqrt()
    }
}

/// Where a daily step count came from
#[non_exhaustive]
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepSource {
    /// Counted from device motion events
    #[default]
    DeviceMotion,
    /// Imported from Health Connect (Android)
    HealthConnect,
    /// Imported from HealthKit (iOS)
    HealthKit,
    /// Entered or adjusted manually by the user
    Manual,
    /// Generated by the synthetic sensor (demo mode)
    Synthetic,
}

impl StepSource {
    /// Stable string form used in persisted records
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DeviceMotion => "device_motion",
            Self::HealthConnect => "health_connect",
            Self::HealthKit => "healthkit",
            Self::Manual => "manual",
            Self::Synthetic => "synthetic",
        }
    }
}

impl Display for StepSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "device_motion" => Ok(Self::DeviceMotion),
            "health_connect" => Ok(Self::HealthConnect),
            "healthkit" => Ok(Self::HealthKit),
            "manual" => Ok(Self::Manual),
            "synthetic" => Ok(Self::Synthetic),
            other => Err(AppError::invalid_input(format!(
                "unknown step source: {other}"
            ))),
        }
    }
}

/// One user's persisted step count for one calendar date
///
/// Upserted by the tracker's flush on `(user_id, date)`; `created_at` is
/// preserved across upserts and records are never deleted by this library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStepRecord {
    /// Record identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Calendar date the steps were taken
    pub date: NaiveDate,
    /// Step count for the date
    pub steps: u32,
    /// Estimated calories burned (kcal), heuristic multiplier
    pub calories_est: f64,
    /// Estimated distance covered in meters, heuristic multiplier
    pub distance_m: f64,
    /// How the count was obtained
    pub source: StepSource,
    /// When the record was first created
    pub created_at: DateTime<Utc>,
    /// When the record was last written
    pub updated_at: DateTime<Utc>,
}

/// Payload for the daily-steps upsert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDailySteps {
    /// Owning user
    pub user_id: Uuid,
    /// Calendar date the steps were taken
    pub date: NaiveDate,
    /// Step count for the date
    pub steps: u32,
    /// Estimated calories burned (kcal)
    pub calories_est: f64,
    /// Estimated distance covered in meters
    pub distance_m: f64,
    /// How the count was obtained
    pub source: StepSource,
}

/// Where a workout record came from
#[non_exhaustive]
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutSource {
    /// Recorded by the in-app session engine
    #[default]
    App,
    /// Synced from Strava by an external integration
    Strava,
}

impl WorkoutSource {
    /// Stable string form used in persisted records
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Strava => "strava",
        }
    }
}

impl Display for WorkoutSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "app" => Ok(Self::App),
            "strava" => Ok(Self::Strava),
            other => Err(AppError::invalid_input(format!(
                "unknown workout source: {other}"
            ))),
        }
    }
}

/// A persisted workout-session summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    /// Record identifier, assigned by the store on create
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Name of the workout plan that was performed
    pub workout_name: String,
    /// Total session duration in whole minutes
    pub duration_min: u32,
    /// Estimated calories burned (kcal)
    pub calories_est: u32,
    /// How the record was produced
    pub source: WorkoutSource,
    /// When the session completed (start time while still in progress)
    pub completed_at: DateTime<Utc>,
    /// When the record was first created
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a workout record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewWorkout {
    /// Owning user
    pub user_id: Uuid,
    /// Name of the workout plan
    pub workout_name: String,
    /// Total session duration in whole minutes
    pub duration_min: u32,
    /// Estimated calories burned (kcal)
    pub calories_est: u32,
    /// How the record was produced
    pub source: WorkoutSource,
    /// Completion timestamp (start time for in-progress autosaves)
    pub completed_at: DateTime<Utc>,
}

/// Partial update applied to an existing workout record
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkoutUpdate {
    /// New duration in whole minutes
    pub duration_min: Option<u32>,
    /// New calorie estimate (kcal)
    pub calories_est: Option<u32>,
    /// New completion timestamp
    pub completed_at: Option<DateTime<Utc>>,
}

/// A user's activity goals, read at hydration and edited via `update_goal`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalProfile {
    /// Daily step goal, must be positive
    pub step_goal: u32,
    /// Workouts per week the user aims for
    pub weekly_workout_goal: u32,
}

impl GoalProfile {
    /// Reject goals that can never be met or divide by zero in progress math
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `step_goal` is zero.
    pub fn validate(&self) -> AppResult<()> {
        if self.step_goal == 0 {
            return Err(AppError::invalid_input("step goal must be at least 1"));
        }
        Ok(())
    }
}

impl Default for GoalProfile {
    fn default() -> Self {
        Self {
            step_goal: crate::constants::goals::DEFAULT_DAILY_STEP_GOAL,
            weekly_workout_goal: crate::constants::goals::DEFAULT_WEEKLY_WORKOUT_GOAL,
        }
    }
}

/// One exercise within a workout plan, immutable once the session starts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
    /// Exercise identifier from the plan library
    pub id: String,
    /// Display name
    pub name: String,
    /// Number of sets to perform, at least 1
    pub sets: u32,
    /// Target repetitions per set
    pub target_reps: u32,
    /// Suggested working time per set in seconds
    pub work_secs: u32,
    /// Rest time between sets in seconds
    pub rest_secs: u32,
}

impl Exercise {
    /// Check the structural constraints a session relies on
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `sets` is zero.
    pub fn validate(&self) -> AppResult<()> {
        if self.sets == 0 {
            return Err(AppError::invalid_input(format!(
                "exercise '{}' must have at least 1 set",
                self.name
            )));
        }
        Ok(())
    }
}

/// The workout the user selected: an ordered list of exercises
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutPlan {
    /// Plan identifier
    pub id: String,
    /// Display name, copied into persisted workout records
    pub name: String,
    /// Exercises in execution order
    pub exercises: Vec<Exercise>,
}

impl WorkoutPlan {
    /// Check that the plan can drive a session
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the plan has no exercises or any exercise
    /// fails validation.
    pub fn validate(&self) -> AppResult<()> {
        if self.exercises.is_empty() {
            return Err(AppError::invalid_input(
                "workout plan must contain at least one exercise",
            ));
        }
        for exercise in &self.exercises {
            exercise.validate()?;
        }
        Ok(())
    }
}
