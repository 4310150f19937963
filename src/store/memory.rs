// ABOUTME: In-memory storage backend holding step, workout, and goal records in hash maps
// ABOUTME: Used by tests and ephemeral runs; clones share the same underlying maps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! In-memory implementation of [`RecordStore`].

use super::RecordStore;
use crate::config::StoreUrl;
use crate::models::{
    DailyStepRecord, GoalProfile, NewDailySteps, NewWorkout, WorkoutRecord, WorkoutUpdate,
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Record maps shared by every clone of a [`MemoryStore`]
#[derive(Debug, Default)]
struct MemoryInner {
    steps: HashMap<(Uuid, NaiveDate), DailyStepRecord>,
    workouts: HashMap<Uuid, WorkoutRecord>,
    profiles: HashMap<Uuid, GoalProfile>,
}

/// In-memory storage backend
///
/// Uses `Arc<RwLock<MemoryInner>>` for shared state so clones handed to
/// background tasks observe the same records the foreground sees. Nothing
/// is persisted; dropping the last clone discards all data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn connect(_url: &StoreUrl) -> Result<Self> {
        Ok(Self::new())
    }

    async fn migrate(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_daily_steps(&self, record: &NewDailySteps) -> Result<DailyStepRecord> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let stored = inner
            .steps
            .entry((record.user_id, record.date))
            .and_modify(|existing| {
                existing.steps = record.steps;
                existing.calories_est = record.calories_est;
                existing.distance_m = record.distance_m;
                existing.source = record.source;
                existing.updated_at = now;
            })
            .or_insert_with(|| DailyStepRecord {
                id: Uuid::new_v4(),
                user_id: record.user_id,
                date: record.date,
                steps: record.steps,
                calories_est: record.calories_est,
                distance_m: record.distance_m,
                source: record.source,
                created_at: now,
                updated_at: now,
            });
        Ok(stored.clone())
    }

    async fn get_daily_steps(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DailyStepRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.steps.get(&(user_id, date)).cloned())
    }

    async fn get_steps_history(&self, user_id: Uuid, days: u32) -> Result<Vec<DailyStepRecord>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let cutoff = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .unwrap_or(NaiveDate::MIN);

        let inner = self.inner.read().await;
        let mut records: Vec<DailyStepRecord> = inner
            .steps
            .values()
            .filter(|r| r.user_id == user_id && r.date >= cutoff)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn sum_steps_since(&self, user_id: Uuid, from: NaiveDate) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .steps
            .values()
            .filter(|r| r.user_id == user_id && r.date >= from)
            .map(|r| u64::from(r.steps))
            .sum())
    }

    async fn create_workout(&self, workout: &NewWorkout) -> Result<WorkoutRecord> {
        let record = WorkoutRecord {
            id: Uuid::new_v4(),
            user_id: workout.user_id,
            workout_name: workout.workout_name.clone(),
            duration_min: workout.duration_min,
            calories_est: workout.calories_est,
            source: workout.source,
            completed_at: workout.completed_at,
            created_at: Utc::now(),
        };
        let mut inner = self.inner.write().await;
        inner.workouts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_workout(
        &self,
        workout_id: Uuid,
        update: &WorkoutUpdate,
    ) -> Result<WorkoutRecord> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.workouts.get_mut(&workout_id) else {
            bail!("workout {workout_id} not found");
        };
        if let Some(duration_min) = update.duration_min {
            record.duration_min = duration_min;
        }
        if let Some(calories_est) = update.calories_est {
            record.calories_est = calories_est;
        }
        if let Some(completed_at) = update.completed_at {
            record.completed_at = completed_at;
        }
        Ok(record.clone())
    }

    async fn get_workouts(&self, user_id: Uuid, limit: u32) -> Result<Vec<WorkoutRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<WorkoutRecord> = inner
            .workouts
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn count_workouts_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<u64> {
        let inner = self.inner.read().await;
        let count = inner
            .workouts
            .values()
            .filter(|r| r.user_id == user_id && r.completed_at >= since)
            .count();
        Ok(count as u64)
    }

    async fn get_goal_profile(&self, user_id: Uuid) -> Result<Option<GoalProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.get(&user_id).copied())
    }

    async fn upsert_goal_profile(&self, user_id: Uuid, profile: &GoalProfile) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.profiles.insert(user_id, *profile);
        Ok(())
    }
}
