// ABOUTME: Storage abstraction layer for step records, workouts, and goal profiles
// ABOUTME: Backend-agnostic trait with in-memory and `SQLite` implementations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! # Record Storage
//!
//! Backend-agnostic persistence for daily step records, workout records,
//! and goal profiles. The [`RecordStore`] trait is implemented by
//! [`MemoryStore`] for tests and ephemeral runs and by [`SqliteStore`]
//! for durable storage, with [`Store`] dispatching between them based on
//! the configured [`StoreUrl`].

use crate::config::StoreUrl;
use crate::models::{
    DailyStepRecord, GoalProfile, NewDailySteps, NewWorkout, WorkoutRecord, WorkoutUpdate,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

pub mod factory;
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use factory::Store;
pub use memory::MemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Core storage abstraction trait
///
/// All storage backends implement this trait to provide a consistent
/// interface for the tracker and session layers. Implementations must
/// be cheap to clone; clones share the same underlying storage.
#[async_trait]
pub trait RecordStore: Send + Sync + Clone {
    /// Open a connection to the backend described by `url`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or created.
    async fn connect(url: &StoreUrl) -> Result<Self>
    where
        Self: Sized;

    /// Run schema migrations to set up storage
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    async fn migrate(&self) -> Result<()>;

    // ================================
    // Daily Steps
    // ================================

    /// Insert or update the step record for one user and calendar date
    ///
    /// When a record for `(user_id, date)` already exists its counters are
    /// replaced and `updated_at` refreshed; `id` and `created_at` are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn upsert_daily_steps(&self, record: &NewDailySteps) -> Result<DailyStepRecord>;

    /// Get the step record for one user and calendar date
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn get_daily_steps(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DailyStepRecord>>;

    /// Get step records from the last `days` calendar days, most recent first
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn get_steps_history(&self, user_id: Uuid, days: u32) -> Result<Vec<DailyStepRecord>>;

    /// Sum steps recorded on or after `from` for one user
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn sum_steps_since(&self, user_id: Uuid, from: NaiveDate) -> Result<u64>;

    // ================================
    // Workouts
    // ================================

    /// Persist a completed or in-progress workout and return the stored record
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn create_workout(&self, workout: &NewWorkout) -> Result<WorkoutRecord>;

    /// Apply a partial update to an existing workout
    ///
    /// # Errors
    ///
    /// Returns an error if no workout with `workout_id` exists or the
    /// write fails.
    async fn update_workout(
        &self,
        workout_id: Uuid,
        update: &WorkoutUpdate,
    ) -> Result<WorkoutRecord>;

    /// Get up to `limit` workouts for one user, most recent first
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn get_workouts(&self, user_id: Uuid, limit: u32) -> Result<Vec<WorkoutRecord>>;

    /// Count workouts completed on or after `since` for one user
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn count_workouts_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<u64>;

    // ================================
    // Goal Profiles
    // ================================

    /// Get the goal profile for one user, if any has been stored
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn get_goal_profile(&self, user_id: Uuid) -> Result<Option<GoalProfile>>;

    /// Insert or replace the goal profile for one user
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn upsert_goal_profile(&self, user_id: Uuid, profile: &GoalProfile) -> Result<()>;
}
