// ABOUTME: Rising-edge step detector with hysteresis and debounce over acceleration magnitude
// ABOUTME: Pure and deterministic so recorded sample sequences replay exactly in tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! Step detection over raw acceleration samples.

use crate::constants::detection::{DEBOUNCE_MS, DEFAULT_THRESHOLD, MIN_MAGNITUDE_RISE};
use crate::models::StepSample;

/// Tuning knobs for the step detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Magnitude a sample must exceed to count as a step candidate
    pub threshold: f64,
    /// Required rise over the previous sample's magnitude
    pub min_rise: f64,
    /// Minimum gap between two accepted steps in milliseconds
    pub debounce_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_rise: MIN_MAGNITUDE_RISE,
            debounce_ms: DEBOUNCE_MS,
        }
    }
}

/// An accepted step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEvent {
    /// Sample-clock timestamp of the accepting sample
    pub timestamp_ms: u64,
    /// Magnitude of the accepting sample
    pub magnitude: f64,
}

/// Rising-edge step detector with hysteresis and debounce
///
/// A sample registers a step only when its magnitude clears the absolute
/// threshold, rises by at least `min_rise` over the previous sample, and
/// arrives more than `debounce_ms` after the last accepted step. This is a
/// heuristic filter, not a gait model; sustained non-walking vibration can
/// still produce counts.
#[derive(Debug, Clone)]
pub struct StepDetector {
    config: DetectorConfig,
    last_magnitude: f64,
    last_step_ms: Option<u64>,
}

impl StepDetector {
    /// Create a detector with the given tuning
    #[must_use]
    pub const fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            last_magnitude: 0.0,
            last_step_ms: None,
        }
    }

    /// Feed one sample; returns the step it registers, if any
    ///
    /// The previous-magnitude anchor updates on every sample whether or not
    /// a step registers, which is what suppresses sustained plateaus.
    pub fn process(&mut self, sample: &StepSample) -> Option<StepEvent> {
        let magnitude = sample.magnitude();

        let above_threshold = magnitude > self.config.threshold;
        let rising = magnitude > self.last_magnitude + self.config.min_rise;
        let debounced = self.last_step_ms.is_none_or(|last| {
            sample.timestamp_ms.saturating_sub(last) > self.config.debounce_ms
        });

        self.last_magnitude = magnitude;

        if above_threshold && rising && debounced {
            self.last_step_ms = Some(sample.timestamp_ms);
            Some(StepEvent {
                timestamp_ms: sample.timestamp_ms,
                magnitude,
            })
        } else {
            None
        }
    }

    /// Forget the magnitude anchor and debounce anchor
    ///
    /// Called when tracking restarts so a stale anchor from a previous run
    /// cannot suppress the first step of the new one.
    pub fn reset(&mut self) {
        self.last_magnitude = 0.0;
        self.last_step_ms = None;
    }
}

impl Default for StepDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
