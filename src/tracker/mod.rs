// ABOUTME: Step tracking service: sensor feed consumption, counters, and flush scheduling
// ABOUTME: Owns the detector state and synchronizes daily counts to the record store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! # Step Tracker
//!
//! [`StepTracker`] turns a raw motion feed into persisted daily step counts.
//! Readings stream through an internal channel into the detector; accepted
//! steps bump the daily, weekly, and monthly counters. Counts reach the
//! record store through coalesced flushes: every N accepted steps, on a
//! wall-clock interval, and always on stop or manual sync. A slow or failing
//! store never stalls counting; failures surface as a status flag and are
//! retried on the next natural flush.

use crate::config::TrackerTuning;
use crate::constants::energy::{KCAL_PER_STEP, METERS_PER_STEP};
use crate::errors::{AppError, AppResult};
use crate::models::{GoalProfile, NewDailySteps, StepSample, StepSource};
use crate::sensor::{MotionReading, MotionSensor, PermissionState};
use crate::store::RecordStore;
use crate::tasks::{shutdown_channel, TaskHandle};
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

pub mod detector;
pub mod stats;

pub use detector::{DetectorConfig, StepDetector, StepEvent};
pub use stats::{BestDay, StepAnalytics, StepStatistics, StepTrend};

/// Buffered readings between the sensor producer and the consumer loop
const SAMPLE_CHANNEL_CAPACITY: usize = 256;

/// Live counter snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCounts {
    /// Steps counted today
    pub daily: u32,
    /// Steps counted this calendar week
    pub weekly: u32,
    /// Steps counted this calendar month
    pub monthly: u32,
}

/// Tracker health snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerStatus {
    /// Whether the sample feed is currently being consumed
    pub tracking: bool,
    /// Last known motion permission state
    pub permission: PermissionState,
    /// Instant of the last successful flush
    pub last_sync: Option<DateTime<Utc>>,
    /// Message from the most recent failed flush, cleared on success
    pub last_error: Option<String>,
}

struct TrackerState {
    detector: StepDetector,
    permission: PermissionState,
    tracking: bool,
    daily: u32,
    weekly: u32,
    monthly: u32,
    goal: GoalProfile,
    source: StepSource,
    steps_since_flush: u32,
    flush_in_flight: bool,
    last_sync: Option<DateTime<Utc>>,
    last_error: Option<String>,
    parked: HashMap<NaiveDate, NewDailySteps>,
}

struct TrackerRuntime {
    consumer: TaskHandle,
    flusher: TaskHandle,
}

struct TrackerInner<S: RecordStore> {
    store: S,
    sensor: Arc<dyn MotionSensor>,
    user_id: Uuid,
    tuning: TrackerTuning,
    state: RwLock<TrackerState>,
    runtime: Mutex<Option<TrackerRuntime>>,
}

/// Step tracking service
///
/// Cheap to clone; clones share counters and the running feed. Dropping the
/// last clone cancels the background loops.
pub struct StepTracker<S: RecordStore> {
    inner: Arc<TrackerInner<S>>,
}

impl<S: RecordStore> Clone for StepTracker<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RecordStore + 'static> StepTracker<S> {
    /// Create a tracker for one user over the given store and sensor
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the tuning fails validation.
    pub fn new(
        store: S,
        sensor: Arc<dyn MotionSensor>,
        user_id: Uuid,
        tuning: TrackerTuning,
    ) -> AppResult<Self> {
        tuning.validate()?;
        let detector = StepDetector::new(DetectorConfig {
            threshold: tuning.threshold,
            min_rise: tuning.min_rise,
            debounce_ms: tuning.debounce_ms,
        });

        Ok(Self {
            inner: Arc::new(TrackerInner {
                store,
                sensor,
                user_id,
                tuning,
                state: RwLock::new(TrackerState {
                    detector,
                    permission: PermissionState::Unknown,
                    tracking: false,
                    daily: 0,
                    weekly: 0,
                    monthly: 0,
                    goal: GoalProfile::default(),
                    source: StepSource::DeviceMotion,
                    steps_since_flush: 0,
                    flush_in_flight: false,
                    last_sync: None,
                    last_error: None,
                    parked: HashMap::new(),
                }),
                runtime: Mutex::new(None),
            }),
        })
    }

    /// Ask for motion access, caching a grant
    ///
    /// Denial is a value, not an error; `start_tracking` turns it into
    /// `PermissionDenied`.
    ///
    /// # Errors
    ///
    /// Returns `SensorUnavailable` if the sensor cannot answer at all.
    pub async fn request_permission(&self) -> AppResult<PermissionState> {
        if self.inner.state.read().await.permission == PermissionState::Granted {
            return Ok(PermissionState::Granted);
        }

        let permission = self.inner.sensor.request_permission().await?;
        self.inner.state.write().await.permission = permission;
        if permission == PermissionState::Denied {
            warn!(sensor = self.inner.sensor.name(), "motion permission denied");
        }
        Ok(permission)
    }

    /// Begin consuming the motion feed
    ///
    /// No-op when already tracking. Hydrates counters and the goal profile
    /// from the store (best-effort), starts the sensor, and spawns the
    /// consumer and interval-flush loops.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when motion access is refused and
    /// `SensorUnavailable` when the sensor cannot start.
    pub async fn start_tracking(&self) -> AppResult<()> {
        let mut runtime = self.inner.runtime.lock().await;
        if runtime.is_some() {
            debug!("start_tracking ignored: already tracking");
            return Ok(());
        }

        if self.request_permission().await? != PermissionState::Granted {
            return Err(AppError::permission_denied());
        }

        self.inner.hydrate().await;

        let (tx, rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);
        self.inner.sensor.start(tx).await?;

        {
            let mut state = self.inner.state.write().await;
            state.detector.reset();
            state.steps_since_flush = 0;
            state.tracking = true;
        }

        *runtime = Some(TrackerRuntime {
            consumer: spawn_consumer(&self.inner, rx),
            flusher: spawn_flusher(&self.inner),
        });

        info!(
            sensor = self.inner.sensor.name(),
            user_id = %self.inner.user_id,
            "step tracking started"
        );
        Ok(())
    }

    /// Stop consuming the motion feed and flush once
    ///
    /// Cancels both background loops before stopping the sensor, so a
    /// scheduled flush cannot fire after the tracker has logically stopped.
    ///
    /// # Errors
    ///
    /// Always returns `Ok` today; a failed final flush is recorded in
    /// [`status`](Self::status) rather than returned.
    pub async fn stop_tracking(&self) -> AppResult<()> {
        let mut runtime = self.inner.runtime.lock().await;
        let Some(handles) = runtime.take() else {
            debug!("stop_tracking ignored: not tracking");
            return Ok(());
        };

        handles.consumer.cancel();
        handles.flusher.cancel();
        self.inner.sensor.stop().await;
        self.inner.state.write().await.tracking = false;
        drop(runtime);

        if let Err(error) = self.inner.flush(true).await {
            debug!("final flush on stop failed: {error}");
        }
        info!(user_id = %self.inner.user_id, "step tracking stopped");
        Ok(())
    }

    /// Manually override today's count
    ///
    /// Weekly and monthly counters move by the same delta, floored at zero.
    /// The day's record source becomes `manual` and the new value is flushed
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` when the forced flush fails; the
    /// in-memory counters keep the new value either way.
    pub async fn adjust_steps(&self, new_value: u32) -> AppResult<()> {
        {
            let mut state = self.inner.state.write().await;
            let previous = state.daily;
            state.daily = new_value;
            if new_value >= previous {
                let delta = new_value - previous;
                state.weekly = state.weekly.saturating_add(delta);
                state.monthly = state.monthly.saturating_add(delta);
            } else {
                let delta = previous - new_value;
                state.weekly = state.weekly.saturating_sub(delta);
                state.monthly = state.monthly.saturating_sub(delta);
            }
            state.source = StepSource::Manual;
            info!(from = previous, to = new_value, "daily steps adjusted");
        }
        self.inner.flush(true).await
    }

    /// Force a flush right now, surfacing the result
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` when the store rejects the write.
    pub async fn sync_now(&self) -> AppResult<()> {
        self.inner.flush(true).await
    }

    /// Validate, persist, and adopt a new goal profile
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unusable goal and `PersistenceFailure`
    /// when the store rejects the write; the in-memory goal is only updated
    /// after a successful persist.
    pub async fn update_goal(&self, goal: GoalProfile) -> AppResult<()> {
        goal.validate()?;
        self.inner
            .store
            .upsert_goal_profile(self.inner.user_id, &goal)
            .await
            .map_err(|error| AppError::persistence("failed to persist goal profile", error))?;
        self.inner.state.write().await.goal = goal;
        info!(step_goal = goal.step_goal, "goal profile updated");
        Ok(())
    }

    /// Current counter values
    pub async fn counts(&self) -> StepCounts {
        let state = self.inner.state.read().await;
        StepCounts {
            daily: state.daily,
            weekly: state.weekly,
            monthly: state.monthly,
        }
    }

    /// Tracking and sync health
    pub async fn status(&self) -> TrackerStatus {
        let state = self.inner.state.read().await;
        TrackerStatus {
            tracking: state.tracking,
            permission: state.permission,
            last_sync: state.last_sync,
            last_error: state.last_error.clone(),
        }
    }

    /// Derived statistics over the live counters
    pub async fn statistics(&self) -> StepStatistics {
        let state = self.inner.state.read().await;
        StepStatistics::compute(state.daily, state.weekly, state.monthly, &state.goal)
    }

    /// Aggregate the last `days` of persisted history
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` when history cannot be loaded.
    pub async fn analytics(&self, days: u32) -> AppResult<StepAnalytics> {
        let history = self
            .inner
            .store
            .get_steps_history(self.inner.user_id, days)
            .await
            .map_err(|error| AppError::persistence("failed to load step history", error))?;
        let goal = self.inner.state.read().await.goal;
        Ok(StepAnalytics::from_history(&history, &goal))
    }
}

impl<S: RecordStore + 'static> TrackerInner<S> {
    /// Load persisted counts and the goal into memory, best-effort
    ///
    /// In-memory counters stay authoritative: a stored value only ever
    /// raises a counter, so unflushed steps from a previous run survive a
    /// restart that beat the store.
    async fn hydrate(&self) {
        let today = Utc::now().date_naive();
        let week_start = today.week(Weekday::Mon).first_day();
        let month_start = today.with_day(1).unwrap_or(today);

        let daily = match self.store.get_daily_steps(self.user_id, today).await {
            Ok(record) => record.map(|r| (r.steps, r.source)),
            Err(error) => {
                warn!("hydration: today's steps unavailable: {error}");
                None
            }
        };
        let weekly = self.hydrate_sum(week_start, "weekly").await;
        let monthly = self.hydrate_sum(month_start, "monthly").await;
        let goal = match self.store.get_goal_profile(self.user_id).await {
            Ok(profile) => profile,
            Err(error) => {
                warn!("hydration: goal profile unavailable: {error}");
                None
            }
        };

        let mut state = self.state.write().await;
        if let Some((steps, source)) = daily {
            if steps > state.daily {
                state.daily = steps;
                state.source = source;
            }
        }
        if let Some(sum) = weekly {
            state.weekly = state.weekly.max(sum);
        }
        if let Some(sum) = monthly {
            state.monthly = state.monthly.max(sum);
        }
        if let Some(goal) = goal {
            state.goal = goal;
        }
        debug!(
            daily = state.daily,
            weekly = state.weekly,
            monthly = state.monthly,
            "tracker hydrated"
        );
    }

    async fn hydrate_sum(&self, from: NaiveDate, label: &str) -> Option<u32> {
        match self.store.sum_steps_since(self.user_id, from).await {
            Ok(sum) => Some(u32::try_from(sum).unwrap_or(u32::MAX)),
            Err(error) => {
                warn!("hydration: {label} sum unavailable: {error}");
                None
            }
        }
    }

    /// Route one reading through the detector and counters
    ///
    /// Returns whether the step-count flush threshold was reached; the
    /// caller spawns that flush so sample handling never awaits the store.
    async fn handle_reading(&self, reading: MotionReading) -> bool {
        let Some(sample) = StepSample::from_components(
            reading.x,
            reading.y,
            reading.z,
            reading.timestamp_ms,
        ) else {
            trace!("unusable motion reading skipped");
            return false;
        };

        let mut state = self.state.write().await;
        let Some(event) = state.detector.process(&sample) else {
            return false;
        };
        state.daily = state.daily.saturating_add(1);
        state.weekly = state.weekly.saturating_add(1);
        state.monthly = state.monthly.saturating_add(1);
        state.steps_since_flush += 1;
        trace!(
            at_ms = event.timestamp_ms,
            magnitude = event.magnitude,
            daily = state.daily,
            "step registered"
        );
        state.steps_since_flush >= self.tuning.flush_step_interval
    }

    /// Persist today's counters
    ///
    /// Non-forced flushes are coalesced: skipped while another flush is in
    /// flight or within the minimum gap after a success. A failed flush
    /// parks its payload by date; the next success drains parked dates.
    async fn flush(&self, force: bool) -> AppResult<()> {
        let payload = {
            let mut state = self.state.write().await;
            if !force {
                if state.flush_in_flight {
                    trace!("flush skipped: one already in flight");
                    return Ok(());
                }
                let min_gap = i64::try_from(self.tuning.min_flush_gap_secs).unwrap_or(i64::MAX);
                if let Some(last) = state.last_sync {
                    if Utc::now().signed_duration_since(last).num_seconds() < min_gap {
                        trace!("flush skipped: last sync too recent");
                        return Ok(());
                    }
                }
            }
            state.flush_in_flight = true;
            NewDailySteps {
                user_id: self.user_id,
                date: Utc::now().date_naive(),
                steps: state.daily,
                calories_est: f64::from(state.daily) * KCAL_PER_STEP,
                distance_m: f64::from(state.daily) * METERS_PER_STEP,
                source: state.source,
            }
        };

        let result = self.store.upsert_daily_steps(&payload).await;

        let mut state = self.state.write().await;
        state.flush_in_flight = false;
        match result {
            Ok(record) => {
                state.last_sync = Some(Utc::now());
                state.last_error = None;
                state.steps_since_flush = 0;
                state.parked.remove(&record.date);
                let parked: Vec<NewDailySteps> = state.parked.drain().map(|(_, v)| v).collect();
                drop(state);
                debug!(steps = record.steps, date = %record.date, "daily steps flushed");
                self.drain_parked(parked).await;
                Ok(())
            }
            Err(error) => {
                warn!(date = %payload.date, "daily step flush failed: {error}");
                state.last_error = Some(error.to_string());
                state.parked.insert(payload.date, payload);
                Err(AppError::persistence("failed to persist daily steps", error))
            }
        }
    }

    /// Retry records left behind by failed flushes on earlier dates
    async fn drain_parked(&self, parked: Vec<NewDailySteps>) {
        for pending in parked {
            if let Err(error) = self.store.upsert_daily_steps(&pending).await {
                warn!(date = %pending.date, "parked step record retry failed: {error}");
                self.state
                    .write()
                    .await
                    .parked
                    .insert(pending.date, pending);
            }
        }
    }
}

// Both loops hold only a weak handle to the tracker; dropping the last
// tracker clone ends them even without an explicit stop.

fn spawn_consumer<S: RecordStore + 'static>(
    inner: &Arc<TrackerInner<S>>,
    mut rx: mpsc::Receiver<MotionReading>,
) -> TaskHandle {
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let weak = Arc::downgrade(inner);
    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                maybe_reading = rx.recv() => {
                    let Some(reading) = maybe_reading else { break };
                    let Some(inner) = weak.upgrade() else { break };
                    if inner.handle_reading(reading).await {
                        tokio::spawn(async move {
                            if let Err(error) = inner.flush(false).await {
                                debug!("step-count flush failed: {error}");
                            }
                        });
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    });
    TaskHandle::new(shutdown_tx, handle)
}

fn spawn_flusher<S: RecordStore + 'static>(inner: &Arc<TrackerInner<S>>) -> TaskHandle {
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let weak = Arc::downgrade(inner);
    let period = Duration::from_secs(inner.tuning.flush_interval_secs);
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately; consume it so the loop
        // waits a full period before its first flush.
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let Some(inner) = weak.upgrade() else { break };
                    if let Err(error) = inner.flush(false).await {
                        debug!("interval flush failed: {error}");
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    });
    TaskHandle::new(shutdown_tx, handle)
}
