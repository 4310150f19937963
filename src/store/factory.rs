// ABOUTME: Storage factory selecting a backend at runtime from the configured store URL
// ABOUTME: Wraps the in-memory and SQLite backends behind one dispatching enum
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! Storage factory for creating record stores
//!
//! Backend selection happens at runtime from the parsed [`StoreUrl`], so the
//! same binary can run against an ephemeral in-memory store or a durable
//! `SQLite` file.

use super::memory::MemoryStore;
use super::RecordStore;
use crate::config::StoreUrl;
use crate::models::{
    DailyStepRecord, GoalProfile, NewDailySteps, NewWorkout, WorkoutRecord, WorkoutUpdate,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

#[cfg(feature = "sqlite")]
use super::sqlite::SqliteStore;

#[cfg(not(feature = "sqlite"))]
use anyhow::anyhow;

/// Store instance wrapper that delegates to the selected backend
#[derive(Clone)]
pub enum Store {
    /// Ephemeral in-memory backend
    Memory(MemoryStore),
    /// Durable `SQLite` backend
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteStore),
}

impl Store {
    /// Get a descriptive string for the current storage backend
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::Memory(_) => "Memory (Ephemeral)",
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => "SQLite (Durable)",
        }
    }

    /// Open the backend described by `url` and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL names a `SQLite` store but the `sqlite` feature is disabled
    /// - The backend cannot be opened
    /// - Schema migration fails
    pub async fn new(url: &StoreUrl) -> Result<Self> {
        debug!("Opening record store: {}", url);
        let store = Self::connect(url).await?;
        store.migrate().await?;
        info!("Record store ready: {}", store.backend_info());
        Ok(store)
    }
}

#[async_trait]
impl RecordStore for Store {
    async fn connect(url: &StoreUrl) -> Result<Self> {
        match url {
            StoreUrl::Memory => {
                let store = MemoryStore::connect(url).await?;
                Ok(Self::Memory(store))
            }
            #[cfg(feature = "sqlite")]
            StoreUrl::Sqlite { .. } => {
                let store = SqliteStore::connect(url).await?;
                Ok(Self::Sqlite(store))
            }
            #[cfg(not(feature = "sqlite"))]
            StoreUrl::Sqlite { .. } => Err(anyhow!(
                "SQLite store URL detected, but SQLite support is not enabled. \
                 Enable the 'sqlite' feature flag in Cargo.toml"
            )),
        }
    }

    async fn migrate(&self) -> Result<()> {
        match self {
            Self::Memory(store) => store.migrate().await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.migrate().await,
        }
    }

    async fn upsert_daily_steps(&self, record: &NewDailySteps) -> Result<DailyStepRecord> {
        match self {
            Self::Memory(store) => store.upsert_daily_steps(record).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.upsert_daily_steps(record).await,
        }
    }

    async fn get_daily_steps(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DailyStepRecord>> {
        match self {
            Self::Memory(store) => store.get_daily_steps(user_id, date).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.get_daily_steps(user_id, date).await,
        }
    }

    async fn get_steps_history(&self, user_id: Uuid, days: u32) -> Result<Vec<DailyStepRecord>> {
        match self {
            Self::Memory(store) => store.get_steps_history(user_id, days).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.get_steps_history(user_id, days).await,
        }
    }

    async fn sum_steps_since(&self, user_id: Uuid, from: NaiveDate) -> Result<u64> {
        match self {
            Self::Memory(store) => store.sum_steps_since(user_id, from).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.sum_steps_since(user_id, from).await,
        }
    }

    async fn create_workout(&self, workout: &NewWorkout) -> Result<WorkoutRecord> {
        match self {
            Self::Memory(store) => store.create_workout(workout).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.create_workout(workout).await,
        }
    }

    async fn update_workout(
        &self,
        workout_id: Uuid,
        update: &WorkoutUpdate,
    ) -> Result<WorkoutRecord> {
        match self {
            Self::Memory(store) => store.update_workout(workout_id, update).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.update_workout(workout_id, update).await,
        }
    }

    async fn get_workouts(&self, user_id: Uuid, limit: u32) -> Result<Vec<WorkoutRecord>> {
        match self {
            Self::Memory(store) => store.get_workouts(user_id, limit).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.get_workouts(user_id, limit).await,
        }
    }

    async fn count_workouts_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<u64> {
        match self {
            Self::Memory(store) => store.count_workouts_since(user_id, since).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.count_workouts_since(user_id, since).await,
        }
    }

    async fn get_goal_profile(&self, user_id: Uuid) -> Result<Option<GoalProfile>> {
        match self {
            Self::Memory(store) => store.get_goal_profile(user_id).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.get_goal_profile(user_id).await,
        }
    }

    async fn upsert_goal_profile(&self, user_id: Uuid, profile: &GoalProfile) -> Result<()> {
        match self {
            Self::Memory(store) => store.upsert_goal_profile(user_id, profile).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.upsert_goal_profile(user_id, profile).await,
        }
    }
}
