// ABOUTME: Guided workout sessions: deterministic state machine plus the async service
// ABOUTME: Engine transitions and clocks are pure; the service adds the ticker and autosave
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! # Workout Sessions
//!
//! A session drives one [`WorkoutPlan`](crate::models::WorkoutPlan) from
//! `Ready` to `Completed`. The split mirrors how the pieces are tested:
//! [`SessionEngine`] is a pure, tick-driven state machine that unit tests can
//! replay exactly, and [`WorkoutSession`] owns the wall-clock ticker and the
//! autosave loop against the record store.

pub mod engine;
pub mod service;

pub use engine::{SessionEngine, SessionSnapshot, SessionStatus};
pub use service::{SaveState, SaveStatus, WorkoutSession};
