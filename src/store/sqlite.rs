// ABOUTME: SQLite storage backend over sqlx with schema migrations and upsert queries
// ABOUTME: Stores dates and timestamps as TEXT and identifiers as UUID strings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! `SQLite` implementation of [`RecordStore`].

use super::RecordStore;
use crate::config::StoreUrl;
use crate::models::{
    DailyStepRecord, GoalProfile, NewDailySteps, NewWorkout, StepSource, WorkoutRecord,
    WorkoutSource, WorkoutUpdate,
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// `SQLite` storage backend
///
/// Clones share the same connection pool. Timestamps are stored as RFC 3339
/// TEXT and dates as ISO `YYYY-MM-DD` TEXT, so range comparisons in SQL are
/// plain string comparisons.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    fn row_to_daily_steps(row: &SqliteRow) -> Result<DailyStepRecord> {
        let id_str: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id_str)?;

        let user_id_str: String = row.try_get("user_id")?;
        let user_id = Uuid::parse_str(&user_id_str)?;

        let date_str: String = row.try_get("date")?;
        let date = date_str.parse::<NaiveDate>()?;

        let steps: i64 = row.try_get("steps")?;
        let calories_est: f64 = row.try_get("calories_est")?;
        let distance_m: f64 = row.try_get("distance_m")?;

        let source_str: String = row.try_get("source")?;
        let source = source_str.parse::<StepSource>()?;

        let created_at_str: String = row.try_get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)?.with_timezone(&Utc);

        let updated_at_str: String = row.try_get("updated_at")?;
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)?.with_timezone(&Utc);

        Ok(DailyStepRecord {
            id,
            user_id,
            date,
            steps: u32::try_from(steps)?,
            calories_est,
            distance_m,
            source,
            created_at,
            updated_at,
        })
    }

    fn row_to_workout(row: &SqliteRow) -> Result<WorkoutRecord> {
        let id_str: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id_str)?;

        let user_id_str: String = row.try_get("user_id")?;
        let user_id = Uuid::parse_str(&user_id_str)?;

        let workout_name: String = row.try_get("workout_name")?;
        let duration_min: i64 = row.try_get("duration_min")?;
        let calories_est: i64 = row.try_get("calories_est")?;

        let source_str: String = row.try_get("source")?;
        let source = source_str.parse::<WorkoutSource>()?;

        let completed_at_str: String = row.try_get("completed_at")?;
        let completed_at = DateTime::parse_from_rfc3339(&completed_at_str)?.with_timezone(&Utc);

        let created_at_str: String = row.try_get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)?.with_timezone(&Utc);

        Ok(WorkoutRecord {
            id,
            user_id,
            workout_name,
            duration_min: u32::try_from(duration_min)?,
            calories_est: u32::try_from(calories_est)?,
            source,
            completed_at,
            created_at,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn connect(url: &StoreUrl) -> Result<Self> {
        let StoreUrl::Sqlite { path } = url else {
            bail!("sqlite store requires a sqlite: url, got {url}");
        };

        // mode=rwc creates the database file if it does not exist
        let connection_options = if path.as_os_str() == ":memory:" {
            "sqlite::memory:".to_owned()
        } else {
            format!("sqlite:{}?mode=rwc", path.display())
        };

        let pool = SqlitePool::connect(&connection_options).await?;
        Ok(Self { pool })
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS steps_daily (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                steps INTEGER NOT NULL DEFAULT 0,
                calories_est REAL NOT NULL DEFAULT 0,
                distance_m REAL NOT NULL DEFAULT 0,
                source TEXT NOT NULL DEFAULT 'device_motion',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, date)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_steps_daily_user_date ON steps_daily(user_id, date)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS workouts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                workout_name TEXT NOT NULL,
                duration_min INTEGER NOT NULL DEFAULT 0,
                calories_est INTEGER NOT NULL DEFAULT 0,
                source TEXT NOT NULL DEFAULT 'app',
                completed_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_workouts_user_completed \
             ON workouts(user_id, completed_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS goal_profiles (
                user_id TEXT PRIMARY KEY,
                step_goal INTEGER NOT NULL,
                weekly_workout_goal INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_daily_steps(&self, record: &NewDailySteps) -> Result<DailyStepRecord> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO steps_daily (
                id, user_id, date, steps, calories_est, distance_m, source,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT(user_id, date) DO UPDATE SET
                steps = excluded.steps,
                calories_est = excluded.calories_est,
                distance_m = excluded.distance_m,
                source = excluded.source,
                updated_at = excluded.updated_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(record.user_id.to_string())
        .bind(record.date.to_string())
        .bind(i64::from(record.steps))
        .bind(record.calories_est)
        .bind(record.distance_m)
        .bind(record.source.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        // Re-read so an update returns the original id and created_at
        let row = sqlx::query("SELECT * FROM steps_daily WHERE user_id = $1 AND date = $2")
            .bind(record.user_id.to_string())
            .bind(record.date.to_string())
            .fetch_one(&self.pool)
            .await?;

        Self::row_to_daily_steps(&row)
    }

    async fn get_daily_steps(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DailyStepRecord>> {
        let row = sqlx::query("SELECT * FROM steps_daily WHERE user_id = $1 AND date = $2")
            .bind(user_id.to_string())
            .bind(date.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_daily_steps(&r)).transpose()
    }

    async fn get_steps_history(&self, user_id: Uuid, days: u32) -> Result<Vec<DailyStepRecord>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let cutoff = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .unwrap_or(NaiveDate::MIN);

        let rows = sqlx::query(
            "SELECT * FROM steps_daily WHERE user_id = $1 AND date >= $2 ORDER BY date DESC",
        )
        .bind(user_id.to_string())
        .bind(cutoff.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_daily_steps).collect()
    }

    async fn sum_steps_since(&self, user_id: Uuid, from: NaiveDate) -> Result<u64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(steps), 0) as total FROM steps_daily \
             WHERE user_id = $1 AND date >= $2",
        )
        .bind(user_id.to_string())
        .bind(from.to_string())
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = row.try_get("total")?;
        Ok(u64::try_from(total)?)
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

        sqlx::query(
            r"
            INSERT INTO workouts (
                id, user_id, workout_name, duration_min, calories_est, source,
                completed_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(&record.workout_name)
        .bind(i64::from(record.duration_min))
        .bind(i64::from(record.calories_est))
        .bind(record.source.as_str())
        .bind(record.completed_at.to_rfc3339())
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_workout(
        &self,
        workout_id: Uuid,
        update: &WorkoutUpdate,
    ) -> Result<WorkoutRecord> {
        let result = sqlx::query(
            r"
            UPDATE workouts SET
                duration_min = COALESCE($2, duration_min),
                calories_est = COALESCE($3, calories_est),
                completed_at = COALESCE($4, completed_at)
            WHERE id = $1
            ",
        )
        .bind(workout_id.to_string())
        .bind(update.duration_min.map(i64::from))
        .bind(update.calories_est.map(i64::from))
        .bind(update.completed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("workout {workout_id} not found");
        }

        let row = sqlx::query("SELECT * FROM workouts WHERE id = $1")
            .bind(workout_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Self::row_to_workout(&row)
    }

    async fn get_workouts(&self, user_id: Uuid, limit: u32) -> Result<Vec<WorkoutRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM workouts WHERE user_id = $1 ORDER BY completed_at DESC LIMIT $2",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_workout).collect()
    }

    async fn count_workouts_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM workouts WHERE user_id = $1 AND completed_at >= $2",
        )
        .bind(user_id.to_string())
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.try_get("count")?;
        Ok(u64::try_from(count)?)
    }

    async fn get_goal_profile(&self, user_id: Uuid) -> Result<Option<GoalProfile>> {
        let row = sqlx::query(
            "SELECT step_goal, weekly_workout_goal FROM goal_profiles WHERE user_id = $1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let step_goal: i64 = r.try_get("step_goal")?;
            let weekly_workout_goal: i64 = r.try_get("weekly_workout_goal")?;
            Ok(GoalProfile {
                step_goal: u32::try_from(step_goal)?,
                weekly_workout_goal: u32::try_from(weekly_workout_goal)?,
            })
        })
        .transpose()
    }

    async fn upsert_goal_profile(&self, user_id: Uuid, profile: &GoalProfile) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO goal_profiles (
                user_id, step_goal, weekly_workout_goal, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(user_id) DO UPDATE SET
                step_goal = excluded.step_goal,
                weekly_workout_goal = excluded.weekly_workout_goal,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(profile.step_goal))
        .bind(i64::from(profile.weekly_workout_goal))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
