// ABOUTME: Integration tests for the step tracking service over scripted motion feeds
// ABOUTME: Covers permission gating, counting, hydration, flush failures, and manual adjustments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

mod common;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use common::{days_ago, steps_payload, FlakyStore};
use std::sync::Arc;
use std::time::Duration;
use stride_engine::config::TrackerTuning;
use stride_engine::constants::energy::{KCAL_PER_STEP, METERS_PER_STEP};
use stride_engine::errors::{AppResult, ErrorCode};
use stride_engine::models::{GoalProfile, StepSource};
use stride_engine::sensor::{MotionReading, MotionSensor, PermissionState};
use stride_engine::store::{MemoryStore, RecordStore};
use stride_engine::tracker::StepTracker;
use tokio::sync::mpsc;
use tokio::time::sleep;
use uuid::Uuid;

/// Scripted acceleration source for deterministic tracker tests
///
/// Sends its readings in order as fast as the channel accepts them, then
/// closes the feed.
struct ScriptedSensor {
    permission: PermissionState,
    script: Vec<MotionReading>,
}

impl ScriptedSensor {
    /// Helper: A granted sensor emitting a clean walking pattern of `steps` spikes
    fn walking(steps: u64) -> Self {
        let mut script = Vec::new();
        for i in 0..steps {
            let base = i * 600;
            script.push(MotionReading::complete(0.0, 0.0, 9.8, base));
            script.push(MotionReading::complete(0.0, 0.0, 14.5, base + 300));
        }
        Self {
            permission: PermissionState::Granted,
            script,
        }
    }

    /// Helper: A granted sensor with nothing to say
    fn idle() -> Self {
        Self {
            permission: PermissionState::Granted,
            script: Vec::new(),
        }
    }

    /// Helper: A sensor whose permission request is refused
    fn denied() -> Self {
        Self {
            permission: PermissionState::Denied,
            script: Vec::new(),
        }
    }

    /// Helper: A granted sensor with a fixed reading script
    fn scripted(script: Vec<MotionReading>) -> Self {
        Self {
            permission: PermissionState::Granted,
            script,
        }
    }
}

#[async_trait]
impl MotionSensor for ScriptedSensor {
    async fn request_permission(&self) -> AppResult<PermissionState> {
        Ok(self.permission)
    }

    async fn start(&self, tx: mpsc::Sender<MotionReading>) -> AppResult<()> {
        let script = self.script.clone();
        tokio::spawn(async move {
            for reading in script {
                if tx.send(reading).await.is_err() {
                    break;
                }
            }
        });
        Ok(())
    }

    async fn stop(&self) {}

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Helper: Tuning that flushes eagerly and keeps the interval flusher quiet
fn fast_tuning() -> TrackerTuning {
    TrackerTuning {
        flush_step_interval: 3,
        flush_interval_secs: 3_600,
        min_flush_gap_secs: 0,
        ..TrackerTuning::default()
    }
}

/// Helper: Poll the daily counter until it reaches `expected` or give up
async fn wait_for_daily<S: RecordStore + 'static>(
    tracker: &StepTracker<S>,
    expected: u32,
) -> Result<()> {
    for _ in 0..200 {
        if tracker.counts().await.daily >= expected {
            return Ok(());
        }
        sleep(Duration::from_millis(10)).await;
    }
    bail!("daily count never reached {expected}")
}

#[tokio::test]
async fn test_permission_denied_blocks_tracking() -> Result<()> {
    let tracker = StepTracker::new(
        MemoryStore::new(),
        Arc::new(ScriptedSensor::denied()),
        Uuid::new_v4(),
        fast_tuning(),
    )?;

    let Err(error) = tracker.start_tracking().await else {
        bail!("start_tracking must fail without motion permission");
    };
    assert_eq!(error.code, ErrorCode::PermissionDenied);

    let status = tracker.status().await;
    assert!(!status.tracking);
    assert_eq!(status.permission, PermissionState::Denied);
    Ok(())
}

#[tokio::test]
async fn test_walking_feed_counts_and_persists() -> Result<()> {
    common::init_test_logging();
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let tracker = StepTracker::new(
        store.clone(),
        Arc::new(ScriptedSensor::walking(5)),
        user_id,
        fast_tuning(),
    )?;

    tracker.start_tracking().await?;
    assert!(tracker.status().await.tracking);
    wait_for_daily(&tracker, 5).await?;
    tracker.stop_tracking().await?;

    let counts = tracker.counts().await;
    assert_eq!(counts.daily, 5);
    assert_eq!(counts.weekly, 5);
    assert_eq!(counts.monthly, 5);

    let record = store
        .get_daily_steps(user_id, days_ago(0)?)
        .await?
        .context("today's record should exist after the final flush")?;
    assert_eq!(record.steps, 5);
    assert_eq!(record.source, StepSource::DeviceMotion);
    assert!((record.calories_est - 5.0 * KCAL_PER_STEP).abs() < 1e-9);
    assert!((record.distance_m - 5.0 * METERS_PER_STEP).abs() < 1e-9);

    let status = tracker.status().await;
    assert!(!status.tracking);
    assert!(status.last_sync.is_some());
    assert_eq!(status.last_error, None);
    Ok(())
}

#[tokio::test]
async fn test_partial_readings_never_count() -> Result<()> {
    let store = MemoryStore::new();
    let script = vec![
        MotionReading {
            x: Some(0.0),
            y: None,
            z: Some(14.5),
            timestamp_ms: 0,
        },
        MotionReading {
            x: None,
            y: Some(0.0),
            z: Some(14.5),
            timestamp_ms: 600,
        },
        MotionReading::complete(0.0, 0.0, 14.5, 1_200),
    ];
    let tracker = StepTracker::new(
        store,
        Arc::new(ScriptedSensor::scripted(script)),
        Uuid::new_v4(),
        fast_tuning(),
    )?;

    tracker.start_tracking().await?;
    wait_for_daily(&tracker, 1).await?;

    // The feed is ordered, so by the time the complete spike registered
    // both partial readings had already been handled.
    assert_eq!(tracker.counts().await.daily, 1);
    tracker.stop_tracking().await?;
    Ok(())
}

#[tokio::test]
async fn test_start_twice_and_stop_twice_are_noops() -> Result<()> {
    let tracker = StepTracker::new(
        MemoryStore::new(),
        Arc::new(ScriptedSensor::idle()),
        Uuid::new_v4(),
        fast_tuning(),
    )?;

    tracker.start_tracking().await?;
    tracker.start_tracking().await?;
    assert!(tracker.status().await.tracking);

    tracker.stop_tracking().await?;
    tracker.stop_tracking().await?;
    assert!(!tracker.status().await.tracking);
    Ok(())
}

#[tokio::test]
async fn test_hydration_restores_persisted_counts_and_goal() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    store
        .upsert_daily_steps(&steps_payload(user_id, days_ago(0)?, 4_000))
        .await?;
    store
        .upsert_goal_profile(
            user_id,
            &GoalProfile {
                step_goal: 5_000,
                weekly_workout_goal: 3,
            },
        )
        .await?;

    let tracker = StepTracker::new(
        store,
        Arc::new(ScriptedSensor::idle()),
        user_id,
        fast_tuning(),
    )?;
    tracker.start_tracking().await?;

    let counts = tracker.counts().await;
    assert_eq!(counts.daily, 4_000);
    assert!(counts.weekly >= 4_000);
    assert!(counts.monthly >= 4_000);

    let stats = tracker.statistics().await;
    assert_eq!(stats.step_goal, 5_000);
    assert!((stats.goal_progress_percent - 80.0).abs() < 1e-9);

    tracker.stop_tracking().await?;
    Ok(())
}

#[tokio::test]
async fn test_flush_failure_sets_error_then_recovers() -> Result<()> {
    common::init_test_logging();
    let store = FlakyStore::new();
    let user_id = Uuid::new_v4();
    let tracker = StepTracker::new(
        store.clone(),
        Arc::new(ScriptedSensor::idle()),
        user_id,
        fast_tuning(),
    )?;

    tracker.adjust_steps(1_500).await?;

    store.fail_next_step_writes(1);
    let Err(error) = tracker.sync_now().await else {
        bail!("sync_now must surface the injected write failure");
    };
    assert_eq!(error.code, ErrorCode::PersistenceFailure);

    let status = tracker.status().await;
    assert!(status.last_error.is_some());
    assert_eq!(tracker.counts().await.daily, 1_500);

    tracker.sync_now().await?;
    let recovered = tracker.status().await;
    assert_eq!(recovered.last_error, None);

    let record = store
        .get_daily_steps(user_id, days_ago(0)?)
        .await?
        .context("record should exist after the retried flush")?;
    assert_eq!(record.steps, 1_500);
    Ok(())
}

#[tokio::test]
async fn test_adjust_steps_moves_counters_and_marks_manual() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let tracker = StepTracker::new(
        store.clone(),
        Arc::new(ScriptedSensor::idle()),
        user_id,
        fast_tuning(),
    )?;

    tracker.adjust_steps(1_500).await?;
    let raised = tracker.counts().await;
    assert_eq!((raised.daily, raised.weekly, raised.monthly), (1_500, 1_500, 1_500));

    tracker.adjust_steps(1_000).await?;
    let lowered = tracker.counts().await;
    assert_eq!((lowered.daily, lowered.weekly, lowered.monthly), (1_000, 1_000, 1_000));

    let record = store
        .get_daily_steps(user_id, days_ago(0)?)
        .await?
        .context("adjusted record should exist")?;
    assert_eq!(record.steps, 1_000);
    assert_eq!(record.source, StepSource::Manual);
    Ok(())
}

#[tokio::test]
async fn test_forced_flush_is_idempotent() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let tracker = StepTracker::new(
        store.clone(),
        Arc::new(ScriptedSensor::idle()),
        user_id,
        fast_tuning(),
    )?;

    tracker.adjust_steps(800).await?;
    let first = store
        .get_daily_steps(user_id, days_ago(0)?)
        .await?
        .context("record after first flush")?;

    tracker.sync_now().await?;
    let second = store
        .get_daily_steps(user_id, days_ago(0)?)
        .await?
        .context("record after second flush")?;

    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.steps, first.steps);
    Ok(())
}

#[tokio::test]
async fn test_update_goal_validates_before_persisting() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    let tracker = StepTracker::new(
        store.clone(),
        Arc::new(ScriptedSensor::idle()),
        user_id,
        fast_tuning(),
    )?;

    let unusable = GoalProfile {
        step_goal: 0,
        weekly_workout_goal: 1,
    };
    assert!(tracker.update_goal(unusable).await.is_err());
    assert_eq!(store.get_goal_profile(user_id).await?, None);

    let goal = GoalProfile {
        step_goal: 12_000,
        weekly_workout_goal: 4,
    };
    tracker.update_goal(goal).await?;
    assert_eq!(store.get_goal_profile(user_id).await?, Some(goal));
    Ok(())
}

#[tokio::test]
async fn test_analytics_aggregates_history() -> Result<()> {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    for (age, steps) in [(0, 12_000), (1, 11_000), (2, 3_000)] {
        store
            .upsert_daily_steps(&steps_payload(user_id, days_ago(age)?, steps))
            .await?;
    }

    let tracker = StepTracker::new(
        store,
        Arc::new(ScriptedSensor::idle()),
        user_id,
        fast_tuning(),
    )?;
    tracker
        .update_goal(GoalProfile {
            step_goal: 10_000,
            weekly_workout_goal: 3,
        })
        .await?;

    let analytics = tracker.analytics(7).await?;
    assert_eq!(analytics.recorded_days, 3);
    assert_eq!(analytics.total_steps, 26_000);
    assert_eq!(analytics.streak_days, 2);
    assert_eq!(analytics.best_day.map(|best| best.steps), Some(12_000));
    assert!((analytics.goal_achievement_rate - (2.0 / 3.0 * 100.0)).abs() < 1e-9);
    Ok(())
}
