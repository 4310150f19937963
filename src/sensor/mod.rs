// ABOUTME: Motion sensor abstraction feeding acceleration readings into the step tracker
// ABOUTME: Defines the permission gate, the raw reading shape, and the synthetic test sensor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! # Motion Sensors
//!
//! Acceleration sources implement [`MotionSensor`] and push raw
//! [`MotionReading`] values into a channel owned by the tracker. Readings may
//! arrive with missing components; the tracker drops those before detection.
//!
//! Platform accelerometer bindings live outside this library. The bundled
//! [`SyntheticSensor`] generates a deterministic walking pattern for demos
//! and tests.

use crate::errors::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub mod synthetic;

pub use synthetic::SyntheticSensor;

/// A raw 3-axis acceleration reading as delivered by a platform sensor
///
/// Components are optional because platform motion events can arrive with
/// partial vectors. Timestamps are milliseconds on the sensor's own clock.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionReading {
    /// Acceleration along the x axis, if reported
    pub x: Option<f64>,
    /// Acceleration along the y axis, if reported
    pub y: Option<f64>,
    /// Acceleration along the z axis, if reported
    pub z: Option<f64>,
    /// Reading timestamp in milliseconds on the sensor clock
    pub timestamp_ms: u64,
}

impl MotionReading {
    /// Create a reading with all components present
    #[must_use]
    pub const fn complete(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
            timestamp_ms,
        }
    }
}

/// Outcome of a motion permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermissionState {
    /// Permission has not been requested yet
    #[default]
    Unknown,
    /// The user granted motion access
    Granted,
    /// The user denied motion access
    Denied,
}

/// Source of acceleration readings
///
/// Implementations own their producing task: [`start`](Self::start) spawns
/// it and [`stop`](Self::stop) tears it down. Readings are pushed into the
/// channel handed to `start`; a closed channel stops the producer.
#[async_trait]
pub trait MotionSensor: Send + Sync {
    /// Ask the platform for motion access
    ///
    /// # Errors
    ///
    /// Returns `SensorUnavailable` if the device has no usable motion sensor.
    async fn request_permission(&self) -> AppResult<PermissionState>;

    /// Begin producing readings into `tx`
    ///
    /// Starting an already-started sensor is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SensorUnavailable` if the sensor cannot be started.
    async fn start(&self, tx: mpsc::Sender<MotionReading>) -> AppResult<()>;

    /// Stop producing readings
    ///
    /// Stopping an idle sensor is a no-op.
    async fn stop(&self);

    /// Short stable name used in logs
    fn name(&self) -> &'static str;
}
