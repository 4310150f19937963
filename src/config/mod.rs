// ABOUTME: Application configuration assembled from STRIDE_* environment variables
// ABOUTME: Tuning knobs for the tracker and session services with constant-backed defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! # Configuration
//!
//! Environment-only configuration: every knob has a constant-backed default
//! and an optional `STRIDE_*` override. Malformed numeric values fall back to
//! the default with a logged warning rather than failing startup; only a
//! structurally invalid store URL is an error.

/// Environment, log level, and store URL primitives
pub mod environment;

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{detection, sync};
use crate::errors::{AppError, AppResult, ErrorCode};

pub use environment::{Environment, LogLevel, StoreUrl};

/// Step-tracker tuning knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrackerTuning {
    /// Detection threshold over acceleration magnitude
    pub threshold: f64,
    /// Required rise over the previous magnitude
    pub min_rise: f64,
    /// Debounce window between accepted steps, sample-clock milliseconds
    pub debounce_ms: u64,
    /// Accepted steps between automatic flushes
    pub flush_step_interval: u32,
    /// Wall-clock seconds between automatic flushes
    pub flush_interval_secs: u64,
    /// Minimum seconds between non-forced flushes
    pub min_flush_gap_secs: u64,
}

impl Default for TrackerTuning {
    fn default() -> Self {
        Self {
            threshold: detection::DEFAULT_THRESHOLD,
            min_rise: detection::MIN_MAGNITUDE_RISE,
            debounce_ms: detection::DEBOUNCE_MS,
            flush_step_interval: sync::FLUSH_STEP_INTERVAL,
            flush_interval_secs: sync::FLUSH_INTERVAL_SECS,
            min_flush_gap_secs: sync::MIN_FLUSH_GAP_SECS,
        }
    }
}

impl TrackerTuning {
    /// Check that the knobs describe a detector that can accept steps
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for a non-positive threshold, a negative rise,
    /// or a zero flush interval.
    pub fn validate(&self) -> AppResult<()> {
        if self.threshold <= 0.0 {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                "step threshold must be positive",
            ));
        }
        if self.min_rise < 0.0 {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                "magnitude rise must not be negative",
            ));
        }
        if self.flush_step_interval == 0 {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                "flush step interval must be at least 1",
            ));
        }
        if self.flush_interval_secs == 0 {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                "flush interval must be at least 1 second",
            ));
        }
        Ok(())
    }
}

/// Workout-session tuning knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionTuning {
    /// Seconds between autosaves while a session is live
    pub autosave_interval_secs: u64,
    /// Seconds between session clock ticks
    pub tick_interval_secs: u64,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            autosave_interval_secs: sync::AUTOSAVE_INTERVAL_SECS,
            tick_interval_secs: sync::TICK_INTERVAL_SECS,
        }
    }
}

impl SessionTuning {
    /// Check that the intervals can drive a session
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` when either interval is zero.
    pub fn validate(&self) -> AppResult<()> {
        if self.autosave_interval_secs == 0 || self.tick_interval_secs == 0 {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                "session intervals must be at least 1 second",
            ));
        }
        Ok(())
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Record-store backend selection
    pub store_url: StoreUrl,
    /// Step-tracker tuning
    pub tracker: TrackerTuning,
    /// Workout-session tuning
    pub session: SessionTuning,
}

impl AppConfig {
    /// Build the configuration from `STRIDE_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` when the store URL is malformed or a tuning
    /// block fails validation.
    pub fn from_env() -> AppResult<Self> {
        let environment =
            Environment::from_str_or_default(&env_or("STRIDE_ENVIRONMENT", "development"));
        let store_url = StoreUrl::parse(&env_or(
            "STRIDE_DATABASE_URL",
            &StoreUrl::default().to_connection_string(),
        ))?;

        let tracker = TrackerTuning {
            threshold: parse_env_or("STRIDE_STEP_THRESHOLD", detection::DEFAULT_THRESHOLD),
            min_rise: parse_env_or("STRIDE_STEP_MIN_RISE", detection::MIN_MAGNITUDE_RISE),
            debounce_ms: parse_env_or("STRIDE_STEP_DEBOUNCE_MS", detection::DEBOUNCE_MS),
            flush_step_interval: parse_env_or(
                "STRIDE_FLUSH_STEP_INTERVAL",
                sync::FLUSH_STEP_INTERVAL,
            ),
            flush_interval_secs: parse_env_or(
                "STRIDE_FLUSH_INTERVAL_SECS",
                sync::FLUSH_INTERVAL_SECS,
            ),
            min_flush_gap_secs: parse_env_or(
                "STRIDE_MIN_FLUSH_GAP_SECS",
                sync::MIN_FLUSH_GAP_SECS,
            ),
        };
        tracker.validate()?;

        let session = SessionTuning {
            autosave_interval_secs: parse_env_or(
                "STRIDE_AUTOSAVE_INTERVAL_SECS",
                sync::AUTOSAVE_INTERVAL_SECS,
            ),
            tick_interval_secs: parse_env_or("STRIDE_TICK_INTERVAL_SECS", sync::TICK_INTERVAL_SECS),
        };
        session.validate()?;

        Ok(Self {
            environment,
            store_url,
            tracker,
            session,
        })
    }
}

/// Read an environment variable with a default fallback
fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Read and parse an environment variable, warning and falling back on
/// malformed values
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring malformed environment override");
            default
        }),
        Err(_) => default,
    }
}
