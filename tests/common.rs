// ABOUTME: Shared test utilities for integration tests
// ABOUTME: Provides a failure-injecting record store and common record builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors
#![allow(dead_code, clippy::missing_errors_doc, clippy::must_use_candidate)]
//! Shared test utilities for `stride_engine` integration tests.
//!
//! Each integration test binary pulls these in with `mod common;`, so not
//! every helper is used from every binary.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Once};
use stride_engine::config::StoreUrl;
use stride_engine::constants::energy::{KCAL_PER_STEP, METERS_PER_STEP};
use stride_engine::models::{
    DailyStepRecord, GoalProfile, NewDailySteps, NewWorkout, StepSource, WorkoutRecord,
    WorkoutSource, WorkoutUpdate,
};
use stride_engine::store::{MemoryStore, RecordStore};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Helper: Initialize quiet logging once per test process
///
/// Set `TEST_LOG` to `trace`, `debug`, or `info` to raise the verbosity.
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("trace") => tracing::Level::TRACE,
            Ok("debug") => tracing::Level::DEBUG,
            Ok("info") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Helper: The calendar date `days` before today
pub fn days_ago(days: u64) -> Result<NaiveDate> {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(days))
        .context("date arithmetic out of range")
}

/// Helper: Build a daily-steps payload with derived calorie and distance estimates
pub fn steps_payload(user_id: Uuid, date: NaiveDate, steps: u32) -> NewDailySteps {
    NewDailySteps {
        user_id,
        date,
        steps,
        calories_est: f64::from(steps) * KCAL_PER_STEP,
        distance_m: f64::from(steps) * METERS_PER_STEP,
        source: StepSource::DeviceMotion,
    }
}

/// Helper: Build a workout payload completed at the given instant
pub fn workout_payload(user_id: Uuid, name: &str, completed_at: DateTime<Utc>) -> NewWorkout {
    NewWorkout {
        user_id,
        workout_name: name.to_owned(),
        duration_min: 30,
        calories_est: 240,
        source: WorkoutSource::App,
        completed_at,
    }
}

/// In-memory store that fails a scripted number of writes
///
/// Wraps [`MemoryStore`] and injects an error into the next N daily-step
/// upserts or workout creates, for driving the services' failure paths.
/// Reads always succeed.
#[derive(Clone)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing_step_writes: Arc<AtomicU32>,
    failing_workout_writes: Arc<AtomicU32>,
}

impl FlakyStore {
    /// Helper: Create a flaky store with no failures scripted
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing_step_writes: Arc::new(AtomicU32::new(0)),
            failing_workout_writes: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Helper: Fail the next `count` daily-step upserts
    pub fn fail_next_step_writes(&self, count: u32) {
        self.failing_step_writes.store(count, Ordering::SeqCst);
    }

    /// Helper: Fail the next `count` workout creates
    pub fn fail_next_workout_writes(&self, count: u32) {
        self.failing_workout_writes.store(count, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for FlakyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn connect(_url: &StoreUrl) -> Result<Self> {
        bail!("flaky test store is built directly, not from a url")
    }

    async fn migrate(&self) -> Result<()> {
        self.inner.migrate().await
    }

    async fn upsert_daily_steps(&self, record: &NewDailySteps) -> Result<DailyStepRecord> {
        if Self::take_failure(&self.failing_step_writes) {
            bail!("injected daily-step write failure");
        }
        self.inner.upsert_daily_steps(record).await
    }

    async fn get_daily_steps(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DailyStepRecord>> {
        self.inner.get_daily_steps(user_id, date).await
    }

    async fn get_steps_history(&self, user_id: Uuid, days: u32) -> Result<Vec<DailyStepRecord>> {
        self.inner.get_steps_history(user_id, days).await
    }

    async fn sum_steps_since(&self, user_id: Uuid, from: NaiveDate) -> Result<u64> {
        self.inner.sum_steps_since(user_id, from).await
    }

    async fn create_workout(&self, workout: &NewWorkout) -> Result<WorkoutRecord> {
        if Self::take_failure(&self.failing_workout_writes) {
            bail!("injected workout write failure");
        }
        self.inner.create_workout(workout).await
    }

    async fn update_workout(
        &self,
        workout_id: Uuid,
        update: &WorkoutUpdate,
    ) -> Result<WorkoutRecord> {
        self.inner.update_workout(workout_id, update).await
    }

    async fn get_workouts(&self, user_id: Uuid, limit: u32) -> Result<Vec<WorkoutRecord>> {
        self.inner.get_workouts(user_id, limit).await
    }

    async fn count_workouts_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<u64> {
        self.inner.count_workouts_since(user_id, since).await
    }

    async fn get_goal_profile(&self, user_id: Uuid) -> Result<Option<GoalProfile>> {
        self.inner.get_goal_profile(user_id).await
    }

    async fn upsert_goal_profile(&self, user_id: Uuid, profile: &GoalProfile) -> Result<()> {
        self.inner.upsert_goal_profile(user_id, profile).await
    }
}
