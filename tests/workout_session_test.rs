// ABOUTME: Integration tests for the workout session service over the in-memory store
// ABOUTME: Covers the full session lifecycle, autosave cadence, and failed-save recovery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

mod common;

use anyhow::{bail, Context, Result};
use common::FlakyStore;
use std::time::Duration;
use stride_engine::config::SessionTuning;
use stride_engine::errors::ErrorCode;
use stride_engine::models::{Exercise, WorkoutPlan, WorkoutSource};
use stride_engine::session::{SaveStatus, SessionStatus, WorkoutSession};
use stride_engine::store::{MemoryStore, RecordStore};
use tokio::time::sleep;
use uuid::Uuid;

/// Helper: An exercise with the given sets and rest seconds
fn exercise(name: &str, sets: u32, rest_secs: u32) -> Exercise {
    Exercise {
        id: format!("ex-{}", name.to_lowercase().replace(' ', "-")),
        name: name.to_owned(),
        sets,
        target_reps: 10,
        work_secs: 40,
        rest_secs,
    }
}

/// Helper: Wrap exercises in a plan named "Test Circuit"
fn plan(exercises: Vec<Exercise>) -> WorkoutPlan {
    WorkoutPlan {
        id: "plan-test".to_owned(),
        name: "Test Circuit".to_owned(),
        exercises,
    }
}

#[tokio::test(start_paused = true)]
async fn test_full_session_persists_one_record() -> Result<()> {
    common::init_test_logging();
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let session = WorkoutSession::new(
        store.clone(),
        user_id,
        plan(vec![exercise("Push-ups", 2, 2)]),
        SessionTuning::default(),
    )?;

    session.start().await?;
    assert_eq!(session.snapshot().await.status, SessionStatus::Active);

    session.complete_set().await?;
    assert_eq!(session.snapshot().await.status, SessionStatus::Resting);

    // The 2s rest expires on the second tick
    sleep(Duration::from_millis(2_100)).await;
    assert_eq!(session.snapshot().await.status, SessionStatus::Active);

    session.complete_set().await?;
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.sets_completed, 2);
    assert_eq!(snapshot.exercises_completed, 1);
    assert!(snapshot.end_time.is_some());
    assert!((snapshot.overall_progress_percent - 100.0).abs() < 1e-9);

    assert_eq!(session.save_state().await.status, SaveStatus::Saved);
    let workouts = store.get_workouts(user_id, 10).await?;
    assert_eq!(workouts.len(), 1);
    let record = workouts.first().context("one persisted workout")?;
    assert_eq!(record.workout_name, "Test Circuit");
    assert_eq!(record.source, WorkoutSource::App);
    assert_eq!(record.duration_min, 0);
    assert_eq!(record.calories_est, snapshot.calories_estimated);
    assert_eq!(Some(record.completed_at), snapshot.end_time);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_autosave_creates_then_updates_single_record() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let session = WorkoutSession::new(
        store.clone(),
        user_id,
        plan(vec![exercise("Burpees", 5, 0)]),
        SessionTuning::default(),
    )?;

    session.start().await?;
    sleep(Duration::from_secs(31)).await;

    let after_first = store.get_workouts(user_id, 10).await?;
    assert_eq!(after_first.len(), 1);
    let initial = after_first.first().context("autosaved record")?;
    assert_eq!(initial.duration_min, 0);
    let initial_id = initial.id;
    assert_eq!(session.save_state().await.status, SaveStatus::Saved);

    sleep(Duration::from_secs(30)).await;
    let after_second = store.get_workouts(user_id, 10).await?;
    assert_eq!(after_second.len(), 1);
    let updated = after_second.first().context("updated record")?;
    assert_eq!(updated.id, initial_id);
    assert_eq!(updated.duration_min, 1);

    session.end_workout().await?;
    let final_records = store.get_workouts(user_id, 10).await?;
    assert_eq!(final_records.len(), 1);
    assert_eq!(final_records.first().map(|record| record.id), Some(initial_id));
    assert_eq!(session.snapshot().await.status, SessionStatus::Completed);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_end_workout_stops_the_clock() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let session = WorkoutSession::new(
        store.clone(),
        user_id,
        plan(vec![exercise("Plank", 3, 0)]),
        SessionTuning::default(),
    )?;

    session.start().await?;
    sleep(Duration::from_millis(5_100)).await;
    session.end_workout().await?;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.total_secs, 5);
    assert_eq!(snapshot.active_secs, 5);
    assert_eq!(snapshot.calories_estimated, 1);

    // The ticker is cancelled on completion: neither the clock nor the
    // autosave can move after the final save.
    sleep(Duration::from_secs(120)).await;
    assert_eq!(session.snapshot().await.total_secs, 5);
    assert_eq!(store.get_workouts(user_id, 10).await?.len(), 1);
    assert_eq!(session.save_state().await.status, SaveStatus::Saved);
    Ok(())
}

#[tokio::test]
async fn test_final_save_failure_surfaces_then_retry_succeeds() -> Result<()> {
    common::init_test_logging();
    let store = FlakyStore::new();
    let user_id = Uuid::new_v4();
    let session = WorkoutSession::new(
        store.clone(),
        user_id,
        plan(vec![exercise("Squats", 1, 0)]),
        SessionTuning::default(),
    )?;
    session.start().await?;

    store.fail_next_workout_writes(1);
    let Err(error) = session.complete_set().await else {
        bail!("the final save must surface the injected failure");
    };
    assert_eq!(error.code, ErrorCode::PersistenceFailure);

    // The session is still completed; only the save failed
    assert_eq!(session.snapshot().await.status, SessionStatus::Completed);
    let save_state = session.save_state().await;
    assert_eq!(save_state.status, SaveStatus::Error);
    assert!(save_state.last_error.is_some());
    assert!(store.get_workouts(user_id, 10).await?.is_empty());

    session.save_now().await?;
    assert_eq!(session.save_state().await.status, SaveStatus::Saved);
    assert_eq!(store.get_workouts(user_id, 10).await?.len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_every_clock_but_the_pause_bucket() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let session = WorkoutSession::new(
        store.clone(),
        user_id,
        plan(vec![exercise("Push-ups", 2, 60), exercise("Rows", 2, 60)]),
        SessionTuning::default(),
    )?;

    session.start().await?;
    sleep(Duration::from_millis(2_100)).await;
    session.pause().await?;
    assert_eq!(session.snapshot().await.status, SessionStatus::Paused);

    sleep(Duration::from_secs(10)).await;
    session.resume().await?;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Active);
    assert_eq!(snapshot.active_secs, 2);
    assert_eq!(snapshot.paused_secs, 10);
    assert_eq!(snapshot.total_secs, 2);

    session.end_workout().await?;
    assert_eq!(store.get_workouts(user_id, 10).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_skip_controls_move_through_the_plan() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let session = WorkoutSession::new(
        store.clone(),
        user_id,
        plan(vec![exercise("Push-ups", 2, 60), exercise("Rows", 1, 0)]),
        SessionTuning::default(),
    )?;

    session.start().await?;
    session.complete_set().await?;
    assert_eq!(session.snapshot().await.status, SessionStatus::Resting);

    session.skip_rest().await?;
    let resumed = session.snapshot().await;
    assert_eq!(resumed.status, SessionStatus::Active);
    assert_eq!(resumed.rest_elapsed_secs, 0);

    session.skip_exercise().await?;
    let advanced = session.snapshot().await;
    assert_eq!(advanced.current_exercise_index, 1);
    assert_eq!(advanced.current_exercise_name, "Rows");
    assert_eq!(advanced.exercises_completed, 0);

    session.complete_set().await?;
    let done = session.snapshot().await;
    assert_eq!(done.status, SessionStatus::Completed);
    assert_eq!(done.exercises_completed, 1);
    assert_eq!(store.get_workouts(user_id, 10).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_lifecycle_guards_reject_out_of_order_calls() -> Result<()> {
    let session = WorkoutSession::new(
        MemoryStore::new(),
        Uuid::new_v4(),
        plan(vec![exercise("Push-ups", 1, 0)]),
        SessionTuning::default(),
    )?;

    let Err(error) = session.save_now().await else {
        bail!("saving an unstarted session must fail");
    };
    assert_eq!(error.code, ErrorCode::InvalidTransition);
    assert!(session.pause().await.is_err());
    assert!(session.complete_set().await.is_err());

    session.start().await?;
    assert!(session.start().await.is_err());

    session.end_workout().await?;
    assert!(session.end_workout().await.is_err());
    assert!(session.complete_set().await.is_err());
    Ok(())
}

#[test]
fn test_unusable_plan_or_tuning_is_rejected() -> Result<()> {
    let empty_plan = WorkoutPlan {
        id: "plan-empty".to_owned(),
        name: "Empty".to_owned(),
        exercises: Vec::new(),
    };
    assert!(WorkoutSession::new(
        MemoryStore::new(),
        Uuid::new_v4(),
        empty_plan,
        SessionTuning::default(),
    )
    .is_err());

    let zero_autosave = SessionTuning {
        autosave_interval_secs: 0,
        ..SessionTuning::default()
    };
    assert!(WorkoutSession::new(
        MemoryStore::new(),
        Uuid::new_v4(),
        plan(vec![exercise("Push-ups", 1, 0)]),
        zero_autosave,
    )
    .is_err());
    Ok(())
}
