// ABOUTME: Deterministic synthetic motion sensor generating a walking acceleration pattern
// ABOUTME: Emits gravity-baseline readings with periodic step spikes on a fixed cadence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! Synthetic walking-pattern sensor for demos and tests.

use super::{MotionReading, MotionSensor, PermissionState};
use crate::constants::synthetic::{
    BASELINE_MAGNITUDE, DEFAULT_STEP_CADENCE_MS, SAMPLE_PERIOD_MS, STEP_SPIKE_MAGNITUDE,
};
use crate::errors::AppResult;
use crate::tasks::{shutdown_channel, TaskHandle};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Readings between generated step spikes
const SAMPLES_PER_STEP: u64 = DEFAULT_STEP_CADENCE_MS / SAMPLE_PERIOD_MS;

/// Motion sensor that synthesizes a steady walking pattern
///
/// Emits one reading every [`SAMPLE_PERIOD_MS`] milliseconds on a synthetic
/// clock starting at zero. Most readings sit near the gravity baseline; every
/// [`DEFAULT_STEP_CADENCE_MS`] milliseconds one reading spikes hard enough
/// for the step detector to count it. The same seed always produces the same
/// reading sequence.
pub struct SyntheticSensor {
    seed: u64,
    producer: Mutex<Option<TaskHandle>>,
}

impl SyntheticSensor {
    /// Create a sensor seeded from entropy
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a sensor with a fixed seed for reproducible output
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            producer: Mutex::const_new(None),
        }
    }

    fn next_reading(rng: &mut StdRng, timestamp_ms: u64, sample_index: u64) -> MotionReading {
        let spike = sample_index > 0 && sample_index % SAMPLES_PER_STEP == 0;
        let magnitude = if spike {
            STEP_SPIKE_MAGNITUDE + rng.gen_range(-0.5..0.5)
        } else {
            BASELINE_MAGNITUDE + rng.gen_range(-0.4..0.4)
        };

        // Light sway on the horizontal axes, the rest of the magnitude on z
        let x: f64 = rng.gen_range(-0.8..0.8);
        let y: f64 = rng.gen_range(-0.8..0.8);
        let z_squared = magnitude.mul_add(magnitude, -x.mul_add(x, y * y)).max(0.0);

        MotionReading::complete(x, y, z_squared.sqrt(), timestamp_ms)
    }
}

impl Default for SyntheticSensor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MotionSensor for SyntheticSensor {
    async fn request_permission(&self) -> AppResult<PermissionState> {
        Ok(PermissionState::Granted)
    }

    async fn start(&self, tx: mpsc::Sender<MotionReading>) -> AppResult<()> {
        let mut producer = self.producer.lock().await;
        if producer.is_some() {
            return Ok(());
        }

        let seed = self.seed;
        let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
        let handle = tokio::spawn(async move {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut interval = tokio::time::interval(Duration::from_millis(SAMPLE_PERIOD_MS));
            let mut timestamp_ms: u64 = 0;
            let mut sample_index: u64 = 0;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let reading = Self::next_reading(&mut rng, timestamp_ms, sample_index);
                        if tx.send(reading).await.is_err() {
                            break;
                        }
                        timestamp_ms += SAMPLE_PERIOD_MS;
                        sample_index += 1;
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        *producer = Some(TaskHandle::new(shutdown_tx, handle));
        Ok(())
    }

    async fn stop(&self) {
        let mut producer = self.producer.lock().await;
        if let Some(handle) = producer.take() {
            handle.cancel();
        }
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
