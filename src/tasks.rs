// ABOUTME: Cancellation handles for the background interval loops services spawn
// ABOUTME: Pairs the shutdown channel with the JoinHandle so cancel is synchronous
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! Background-task lifecycle handles.
//!
//! Every interval loop in this crate (sample consumer, flush timer, session
//! ticker) is owned by a [`TaskHandle`]. Cancelling the handle signals the
//! loop's shutdown channel and aborts the task in the same call, so a timer
//! scheduled before `stop`/`end` can never fire into state that no longer
//! expects it. Dropping the handle cancels too.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of a shutdown channel; one pending signal is always enough
const SHUTDOWN_CHANNEL_CAPACITY: usize = 1;

/// Create the shutdown channel an interval loop selects on
#[must_use]
pub fn shutdown_channel() -> (mpsc::Sender<()>, mpsc::Receiver<()>) {
    mpsc::channel(SHUTDOWN_CHANNEL_CAPACITY)
}

/// Owner handle for one spawned interval loop
#[derive(Debug)]
pub struct TaskHandle {
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    /// Wrap a spawned loop and its shutdown sender
    #[must_use]
    pub const fn new(shutdown: mpsc::Sender<()>, handle: JoinHandle<()>) -> Self {
        Self { shutdown, handle }
    }

    /// Cancel the loop: signal shutdown and abort without waiting
    ///
    /// Safe to call more than once. After this returns, the loop body will
    /// not run again.
    pub fn cancel(&self) {
        let _ = self.shutdown.try_send(());
        self.handle.abort();
    }

    /// Whether the loop has already exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
