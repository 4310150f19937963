// ABOUTME: Main library entry point for the Stride fitness engine
// ABOUTME: Step tracking, guided workout sessions, and record persistence for fitness apps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

// Crate-level attributes:
// - deny(unsafe_code): Zero-tolerance unsafe policy; everything here is
//   counters, state machines, and SQL, none of which needs unsafe
#![deny(unsafe_code)]

//! # Stride Engine
//!
//! The in-process core of a fitness tracker: turns a raw accelerometer feed
//! into persisted daily step counts and drives guided workout sessions from
//! start to completion. UI layers sit on top of this crate; platform sensor
//! bridges plug in underneath it.
//!
//! ## Features
//!
//! - **Step detection**: peak detection over acceleration magnitude with a
//!   rise gate and debounce window, deterministic and replayable
//! - **Counters and sync**: daily/weekly/monthly counters with coalesced
//!   flushes to the record store; a slow or failing store never stalls
//!   counting
//! - **Workout sessions**: a tick-driven state machine for sets, rest, and
//!   pauses, wrapped by an async service with periodic autosave
//! - **Pluggable storage**: one [`store::RecordStore`] trait with in-memory
//!   and `SQLite` backends selected at runtime
//! - **Synthetic sensor**: a seedable walking-pattern generator for demos
//!   and tests
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use stride_engine::config::AppConfig;
//! use stride_engine::sensor::SyntheticSensor;
//! use stride_engine::store::Store;
//! use stride_engine::tracker::StepTracker;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let store = Store::new(&config.store_url).await?;
//!
//!     let tracker = StepTracker::new(
//!         store,
//!         Arc::new(SyntheticSensor::new()),
//!         Uuid::new_v4(),
//!         config.tracker,
//!     )?;
//!     tracker.start_tracking().await?;
//!     // ... steps accumulate while the feed runs ...
//!     tracker.stop_tracking().await?;
//!
//!     println!("today: {} steps", tracker.counts().await.daily);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **tracker**: step detector, counters, statistics, and flush scheduling
//! - **session**: deterministic session engine plus the async service
//! - **store**: record-store trait, backends, and the selecting factory
//! - **sensor**: motion-sensor trait and the synthetic implementation
//! - **config**: environment-driven configuration with validated tuning

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by the seeder binary (src/bin/) and integration
// tests (tests/). They must remain `pub` so external consumers can access
// them.

/// Configuration management from `STRIDE_*` environment variables
pub mod config;

/// Application constants and tuning defaults
pub mod constants;

/// Unified error handling system with standard error codes
pub mod errors;

/// Production logging and structured output
pub mod logging;

/// Common data models for steps, workouts, and goals
pub mod models;

/// Motion sensor abstraction and the synthetic walking feed
pub mod sensor;

/// Guided workout sessions: state machine and autosaving service
pub mod session;

/// Record store abstraction with in-memory and `SQLite` backends
pub mod store;

/// Background task handles and shutdown signalling
pub mod tasks;

/// Step tracking: detection, counters, statistics, and sync
pub mod tracker;
