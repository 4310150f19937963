// ABOUTME: Heuristic constants for step detection, energy estimates, and sync policy
// ABOUTME: One flat module of nested const groups, referenced by config defaults and services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! Heuristic constants used throughout the library.
//!
//! These are fixed multipliers and policy intervals, not per-user biometrics.
//! Configuration can override the tunable ones; the rest are deliberately
//! hard-coded so two devices produce comparable numbers.

/// Step-detection filter parameters
///
/// The detector is a rising-edge filter with hysteresis over the acceleration
/// magnitude, not a validated gait-analysis algorithm. False positives under
/// non-walking vibration are expected.
pub mod detection {
    /// Acceleration magnitude a sample must exceed to be step-eligible
    /// (m/s²-equivalent, gravity included)
    pub const DEFAULT_THRESHOLD: f64 = 12.0;

    /// Required rise over the previous sample's magnitude
    ///
    /// Rejects sustained high-magnitude plateaus: only the rising edge of a
    /// spike counts as a step.
    pub const MIN_MAGNITUDE_RISE: f64 = 2.0;

    /// Minimum gap between two accepted steps, in sample-clock milliseconds
    ///
    /// Roughly caps cadence at 200 steps/min, above any plausible walking or
    /// running rate.
    pub const DEBOUNCE_MS: u64 = 300;
}

/// Energy and distance estimation multipliers
pub mod energy {
    /// Estimated kilocalories burned per step
    pub const KCAL_PER_STEP: f64 = 0.04;

    /// Estimated distance covered per step, in meters
    pub const METERS_PER_STEP: f64 = 0.7;

    /// Baseline kilocalories burned per minute of active workout time
    pub const WORKOUT_KCAL_PER_MINUTE: f64 = 8.0;

    /// Intensity multiplier applied to the workout baseline
    pub const WORKOUT_INTENSITY_FACTOR: f64 = 1.2;

    /// Steps assumed to take one minute of activity, for the active-minutes
    /// estimate
    pub const STEPS_PER_ACTIVE_MINUTE: f64 = 100.0;
}

/// Persistence cadence for both services
///
/// These are deliberate rate limits on store traffic, not correctness
/// requirements; a missed interval is retried on the next one.
pub mod sync {
    /// Accepted steps between automatic flushes
    pub const FLUSH_STEP_INTERVAL: u32 = 10;

    /// Wall-clock seconds between automatic flushes while tracking
    pub const FLUSH_INTERVAL_SECS: u64 = 120;

    /// Minimum seconds between non-forced flushes
    pub const MIN_FLUSH_GAP_SECS: u64 = 30;

    /// Seconds between workout-session autosaves
    pub const AUTOSAVE_INTERVAL_SECS: u64 = 30;

    /// Seconds between session clock ticks
    pub const TICK_INTERVAL_SECS: u64 = 1;
}

/// Default activity goals, used when a user has no stored profile
pub mod goals {
    /// Default daily step goal
    pub const DEFAULT_DAILY_STEP_GOAL: u32 = 10_000;

    /// Default workouts-per-week goal
    pub const DEFAULT_WEEKLY_WORKOUT_GOAL: u32 = 3;
}

/// Aggregation windows and bands for step analytics
pub mod analytics {
    /// Days in the rolling weekly window
    pub const WEEKLY_WINDOW_DAYS: u32 = 7;

    /// Days in the rolling monthly window
    pub const MONTHLY_WINDOW_DAYS: u32 = 30;

    /// Half-over-half change (percent) below which a trend reads as stable
    pub const TREND_STABLE_BAND_PERCENT: f64 = 5.0;

    /// Default history window for analytics queries, in days
    pub const DEFAULT_HISTORY_DAYS: u32 = 30;
}

/// Synthetic sensor shape: a plausible resting-plus-walking signal
pub mod synthetic {
    /// Gravity baseline magnitude for idle readings (m/s²)
    pub const BASELINE_MAGNITUDE: f64 = 9.81;

    /// Peak magnitude of a generated step spike
    pub const STEP_SPIKE_MAGNITUDE: f64 = 14.5;

    /// Milliseconds between emitted readings (~20 Hz)
    pub const SAMPLE_PERIOD_MS: u64 = 50;

    /// Default milliseconds between generated steps (~100 steps/min)
    pub const DEFAULT_STEP_CADENCE_MS: u64 = 600;
}
