// ABOUTME: Integration tests for the in-memory record store backend
// ABOUTME: Covers upsert identity, history windows, workout updates, and goal profiles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use common::{days_ago, steps_payload, workout_payload};
use stride_engine::config::StoreUrl;
use stride_engine::models::{GoalProfile, StepSource, WorkoutUpdate};
use stride_engine::store::{MemoryStore, RecordStore, Store};
use uuid::Uuid;

#[tokio::test]
async fn test_upsert_creates_then_updates_in_place() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let today = days_ago(0)?;

    let created = store
        .upsert_daily_steps(&steps_payload(user_id, today, 1_000))
        .await?;
    assert_eq!(created.steps, 1_000);
    assert_eq!(created.source, StepSource::DeviceMotion);

    let updated = store
        .upsert_daily_steps(&steps_payload(user_id, today, 2_500))
        .await?;
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.steps, 2_500);
    assert!(updated.updated_at >= created.updated_at);

    let fetched = store.get_daily_steps(user_id, today).await?;
    assert_eq!(fetched.map(|record| record.steps), Some(2_500));
    Ok(())
}

#[tokio::test]
async fn test_get_daily_steps_returns_none_when_absent() -> Result<()> {
    let store = MemoryStore::new();
    let record = store.get_daily_steps(Uuid::new_v4(), days_ago(0)?).await?;
    assert_eq!(record, None);
    Ok(())
}

#[tokio::test]
async fn test_history_is_windowed_and_newest_first() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    for (age, steps) in [(0, 3_000), (1, 2_000), (10, 9_000)] {
        store
            .upsert_daily_steps(&steps_payload(user_id, days_ago(age)?, steps))
            .await?;
    }

    let week = store.get_steps_history(user_id, 7).await?;
    let steps: Vec<u32> = week.iter().map(|record| record.steps).collect();
    assert_eq!(steps, vec![3_000, 2_000]);

    let month = store.get_steps_history(user_id, 30).await?;
    assert_eq!(month.len(), 3);

    let empty_window = store.get_steps_history(user_id, 0).await?;
    assert!(empty_window.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sum_steps_since_honors_the_cutoff() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    for (age, steps) in [(0, 4_000), (3, 6_000), (9, 1_000)] {
        store
            .upsert_daily_steps(&steps_payload(user_id, days_ago(age)?, steps))
            .await?;
    }

    assert_eq!(store.sum_steps_since(user_id, days_ago(6)?).await?, 10_000);
    assert_eq!(store.sum_steps_since(user_id, days_ago(0)?).await?, 4_000);
    assert_eq!(store.sum_steps_since(user_id, days_ago(30)?).await?, 11_000);
    Ok(())
}

#[tokio::test]
async fn test_records_are_scoped_by_user() -> Result<()> {
    let store = MemoryStore::new();
    let walker = Uuid::new_v4();
    let runner = Uuid::new_v4();
    store
        .upsert_daily_steps(&steps_payload(walker, days_ago(0)?, 5_000))
        .await?;
    store
        .upsert_daily_steps(&steps_payload(runner, days_ago(0)?, 7_000))
        .await?;

    let history = store.get_steps_history(walker, 7).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history.first().map(|record| record.steps), Some(5_000));
    assert_eq!(store.sum_steps_since(runner, days_ago(0)?).await?, 7_000);
    Ok(())
}

#[tokio::test]
async fn test_workouts_order_newest_first_with_limit() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let now = Utc::now();
    for (name, hours_back) in [("Morning Run", 30), ("Leg Day", 20), ("Evening Walk", 2)] {
        store
            .create_workout(&workout_payload(
                user_id,
                name,
                now - Duration::hours(hours_back),
            ))
            .await?;
    }

    let recent = store.get_workouts(user_id, 2).await?;
    let names: Vec<&str> = recent
        .iter()
        .map(|record| record.workout_name.as_str())
        .collect();
    assert_eq!(names, vec!["Evening Walk", "Leg Day"]);

    let everything = store.get_workouts(user_id, 10).await?;
    assert_eq!(everything.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_update_workout_applies_only_given_fields() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let record = store
        .create_workout(&workout_payload(user_id, "Full Body", Utc::now()))
        .await?;

    let updated = store
        .update_workout(
            record.id,
            &WorkoutUpdate {
                duration_min: Some(45),
                ..WorkoutUpdate::default()
            },
        )
        .await?;
    assert_eq!(updated.duration_min, 45);
    assert_eq!(updated.calories_est, record.calories_est);
    assert_eq!(updated.completed_at, record.completed_at);
    Ok(())
}

#[tokio::test]
async fn test_update_missing_workout_errors() -> Result<()> {
    let store = MemoryStore::new();
    let result = store
        .update_workout(Uuid::new_v4(), &WorkoutUpdate::default())
        .await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_count_workouts_since_cutoff() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let now = Utc::now();
    for hours_back in [50, 30, 1] {
        store
            .create_workout(&workout_payload(
                user_id,
                "Intervals",
                now - Duration::hours(hours_back),
            ))
            .await?;
    }

    let recent = store
        .count_workouts_since(user_id, now - Duration::hours(40))
        .await?;
    assert_eq!(recent, 2);
    assert_eq!(store.count_workouts_since(user_id, now).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_goal_profile_round_trip_and_replace() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    assert_eq!(store.get_goal_profile(user_id).await?, None);

    let goal = GoalProfile {
        step_goal: 12_000,
        weekly_workout_goal: 4,
    };
    store.upsert_goal_profile(user_id, &goal).await?;
    assert_eq!(store.get_goal_profile(user_id).await?, Some(goal));

    let revised = GoalProfile {
        step_goal: 8_000,
        weekly_workout_goal: 2,
    };
    store.upsert_goal_profile(user_id, &revised).await?;
    assert_eq!(store.get_goal_profile(user_id).await?, Some(revised));
    Ok(())
}

#[tokio::test]
async fn test_factory_builds_memory_backend_from_url() -> Result<()> {
    let store = Store::new(&StoreUrl::parse("memory://")?).await?;
    assert_eq!(store.backend_info(), "Memory (Ephemeral)");

    let user_id = Uuid::new_v4();
    store
        .upsert_daily_steps(&steps_payload(user_id, days_ago(0)?, 500))
        .await?;
    assert_eq!(store.sum_steps_since(user_id, days_ago(0)?).await?, 500);
    Ok(())
}

#[tokio::test]
async fn test_clones_share_the_same_records() -> Result<()> {
    let store = MemoryStore::new();
    let clone = store.clone();
    let user_id = Uuid::new_v4();

    store
        .upsert_daily_steps(&steps_payload(user_id, days_ago(0)?, 1_234))
        .await?;
    let seen = clone.get_daily_steps(user_id, days_ago(0)?).await?;
    assert_eq!(seen.map(|record| record.steps), Some(1_234));
    Ok(())
}
