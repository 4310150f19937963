// ABOUTME: Async workout-session service: wall-clock ticker, autosave loop, and finalization
// ABOUTME: Wraps the pure state machine and owns every store write for the session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! Workout session service.

use super::engine::{SessionEngine, SessionSnapshot};
use crate::config::SessionTuning;
use crate::errors::{AppError, AppResult};
use crate::models::{NewWorkout, WorkoutPlan, WorkoutSource, WorkoutUpdate};
use crate::store::RecordStore;
use crate::tasks::{shutdown_channel, TaskHandle};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Outcome of the most recent persistence attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    /// Nothing has been saved yet
    #[default]
    Idle,
    /// A save is in flight
    Saving,
    /// The last save succeeded
    Saved,
    /// The last save failed; retried on the next interval or via `save_now`
    Error,
}

impl SaveStatus {
    /// Stable string form used in logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Saving => "saving",
            Self::Saved => "saved",
            Self::Error => "error",
        }
    }
}

impl Display for SaveStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Autosave health, read alongside the session snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    /// Outcome of the most recent save attempt
    pub status: SaveStatus,
    /// Message from the most recent failed save, cleared on success
    pub last_error: Option<String>,
}

struct SessionState {
    engine: SessionEngine,
    save_status: SaveStatus,
    record_id: Option<Uuid>,
    last_save_error: Option<String>,
}

struct SessionInner<S: RecordStore> {
    store: S,
    user_id: Uuid,
    tuning: SessionTuning,
    state: RwLock<SessionState>,
    ticker: Mutex<Option<TaskHandle>>,
    // Serializes store writes: the forced final save waits for an in-flight
    // autosave instead of racing it into a second create
    save_gate: Mutex<()>,
}

/// Guided workout session over one plan
///
/// Wraps the deterministic [`SessionEngine`] with a wall-clock ticker and a
/// periodic autosave. User actions, ticks, and rest expiry all mutate state
/// under one lock, so a timer scheduled before a pause or finish can never
/// fire into a state that no longer expects it. Cheap to clone; dropping the
/// last clone cancels the ticker.
pub struct WorkoutSession<S: RecordStore> {
    inner: Arc<SessionInner<S>>,
}

impl<S: RecordStore> Clone for WorkoutSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RecordStore + 'static> WorkoutSession<S> {
    /// Create a session for one user over the given plan
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for unusable tuning and `InvalidInput` for an
    /// unusable plan.
    pub fn new(
        store: S,
        user_id: Uuid,
        plan: WorkoutPlan,
        tuning: SessionTuning,
    ) -> AppResult<Self> {
        tuning.validate()?;
        let engine = SessionEngine::new(plan)?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                store,
                user_id,
                tuning,
                state: RwLock::new(SessionState {
                    engine,
                    save_status: SaveStatus::default(),
                    record_id: None,
                    last_save_error: None,
                }),
                ticker: Mutex::new(None),
                save_gate: Mutex::new(()),
            }),
        })
    }

    /// Begin the session and start the second ticker
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the session is `Ready`.
    pub async fn start(&self) -> AppResult<()> {
        let mut ticker = self.inner.ticker.lock().await;
        let workout_name = {
            let mut state = self.inner.state.write().await;
            state.engine.start()?;
            state.engine.plan().name.clone()
        };
        *ticker = Some(spawn_ticker(&self.inner));
        drop(ticker);

        info!(
            user_id = %self.inner.user_id,
            workout = %workout_name,
            "workout session started"
        );
        Ok(())
    }

    /// Finish the current set, advancing through rest, the next exercise,
    /// or completion
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from `Ready`, `Paused`, or `Completed`,
    /// and `PersistenceFailure` when this call completes the session and the
    /// final save fails; the session stays `Completed` either way.
    pub async fn complete_set(&self) -> AppResult<()> {
        let completed = {
            let mut state = self.inner.state.write().await;
            state.engine.complete_set()?;
            state.engine.is_terminal()
        };
        if completed {
            self.finalize().await?;
        }
        Ok(())
    }

    /// Freeze the session clocks
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from `Ready` or `Completed`.
    pub async fn pause(&self) -> AppResult<()> {
        self.inner.state.write().await.engine.pause()
    }

    /// Continue after a pause, back into the pre-pause phase
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the session is `Paused`.
    pub async fn resume(&self) -> AppResult<()> {
        self.inner.state.write().await.engine.resume()
    }

    /// Cut the running rest short
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from `Ready`, `Paused`, or `Completed`.
    pub async fn skip_rest(&self) -> AppResult<()> {
        self.inner.state.write().await.engine.skip_rest()
    }

    /// Move past the current exercise without crediting it
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from `Ready` or `Completed`, and
    /// `PersistenceFailure` when skipping the last exercise completes the
    /// session and the final save fails.
    pub async fn skip_exercise(&self) -> AppResult<()> {
        let completed = {
            let mut state = self.inner.state.write().await;
            state.engine.skip_exercise()?;
            state.engine.is_terminal()
        };
        if completed {
            self.finalize().await?;
        }
        Ok(())
    }

    /// End the session now, completed or not
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` from `Ready` or `Completed`, and
    /// `PersistenceFailure` when the final save fails; the session stays
    /// `Completed` either way.
    pub async fn end_workout(&self) -> AppResult<()> {
        self.inner.state.write().await.engine.end()?;
        self.finalize().await
    }

    /// Persist the current summary immediately
    ///
    /// The manual retry path after a failed final save.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` before the session has started and
    /// `PersistenceFailure` when the store rejects the write.
    pub async fn save_now(&self) -> AppResult<()> {
        self.inner.save(true).await
    }

    /// Point-in-time view of the session
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.read().await.engine.snapshot()
    }

    /// Autosave health
    pub async fn save_state(&self) -> SaveState {
        let state = self.inner.state.read().await;
        SaveState {
            status: state.save_status,
            last_error: state.last_save_error.clone(),
        }
    }

    /// Cancel the ticker, then run the final save
    ///
    /// Cancellation comes first so no tick lands after the terminal state.
    async fn finalize(&self) -> AppResult<()> {
        if let Some(handle) = self.inner.ticker.lock().await.take() {
            handle.cancel();
        }
        info!(user_id = %self.inner.user_id, "workout session completed");
        self.inner.save(true).await
    }
}

impl<S: RecordStore + 'static> SessionInner<S> {
    /// Persist the session summary
    ///
    /// The first successful save creates the workout record and caches its
    /// id; later saves update that record. Scheduled saves (`force` false)
    /// coalesce with one already in flight and stop once the session is
    /// terminal; the final save and manual retries wait their turn instead.
    async fn save(&self, force: bool) -> AppResult<()> {
        let _guard = if force {
            self.save_gate.lock().await
        } else {
            let Ok(guard) = self.save_gate.try_lock() else {
                trace!("autosave skipped: one already in flight");
                return Ok(());
            };
            guard
        };

        let (payload, existing) = {
            let mut state = self.state.write().await;
            if !force && state.engine.is_terminal() {
                return Ok(());
            }
            let snapshot = state.engine.snapshot();
            let Some(completed_at) = snapshot.end_time.or(snapshot.start_time) else {
                return Err(AppError::invalid_transition("save_workout", snapshot.status));
            };
            state.save_status = SaveStatus::Saving;
            let payload = NewWorkout {
                user_id: self.user_id,
                workout_name: snapshot.workout_name,
                duration_min: u32::try_from(snapshot.total_secs / 60).unwrap_or(u32::MAX),
                calories_est: snapshot.calories_estimated,
                source: WorkoutSource::App,
                completed_at,
            };
            (payload, state.record_id)
        };

        let result = match existing {
            Some(id) => {
                let update = WorkoutUpdate {
                    duration_min: Some(payload.duration_min),
                    calories_est: Some(payload.calories_est),
                    completed_at: Some(payload.completed_at),
                };
                self.store.update_workout(id, &update).await.map(|_| id)
            }
            None => self
                .store
                .create_workout(&payload)
                .await
                .map(|record| record.id),
        };

        let mut state = self.state.write().await;
        match result {
            Ok(id) => {
                state.record_id = Some(id);
                state.save_status = SaveStatus::Saved;
                state.last_save_error = None;
                debug!(
                    workout_id = %id,
                    duration_min = payload.duration_min,
                    "workout session saved"
                );
                Ok(())
            }
            Err(error) => {
                warn!("workout session save failed: {error}");
                state.save_status = SaveStatus::Error;
                state.last_save_error = Some(error.to_string());
                Err(AppError::persistence(
                    "failed to persist workout session",
                    error,
                ))
            }
        }
    }
}

/// Tick the engine once per interval and autosave on schedule
///
/// The loop holds only a weak handle to the session; dropping the last
/// session clone ends it.
fn spawn_ticker<S: RecordStore + 'static>(inner: &Arc<SessionInner<S>>) -> TaskHandle {
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let weak = Arc::downgrade(inner);
    let tick_secs = inner.tuning.tick_interval_secs;
    let autosave_secs = inner.tuning.autosave_interval_secs;
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(tick_secs));
        // The first tick completes immediately; consume it so the loop
        // waits a full period before the first engine tick.
        interval.tick().await;
        let mut secs_until_save = autosave_secs;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let Some(inner) = weak.upgrade() else { break };
                    let live = {
                        let mut state = inner.state.write().await;
                        state.engine.tick();
                        !state.engine.is_terminal()
                    };
                    if !live {
                        break;
                    }
                    secs_until_save = secs_until_save.saturating_sub(tick_secs);
                    if secs_until_save == 0 {
                        secs_until_save = autosave_secs;
                        tokio::spawn(async move {
                            if let Err(error) = inner.save(false).await {
                                debug!("scheduled workout autosave failed: {error}");
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
