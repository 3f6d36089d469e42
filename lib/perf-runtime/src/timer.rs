/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use log::trace;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A periodic trigger running on a tokio runtime.
///
/// The action runs on the timer task, so firings never overlap. When an
/// action takes longer than the interval the missed ticks are not queued:
/// the next firing is scheduled one interval after the late one completed.
///
/// The timer task never keeps the runtime busy on its own behalf: it is
/// aborted on [`stop`](Self::stop) or when the timer is dropped, and runtime
/// shutdown does not wait for it.
pub struct RotationTimer {
    handle: Option<Handle>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl RotationTimer {
    /// Create a stopped timer. Without a handle, the runtime current at
    /// [`start`](Self::start) time is used.
    pub fn new(handle: Option<Handle>) -> Self {
        RotationTimer {
            handle,
            interval: Duration::ZERO,
            task: None,
        }
    }

    /// Start firing `on_fire` every `interval`, returns false if the timer
    /// was already running, in which case it is restarted.
    ///
    /// # Panics
    ///
    /// Panics if no handle was given and this is not called from within a
    /// tokio runtime.
    pub fn start<F>(&mut self, interval: Duration, mut on_fire: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        let restarted = self.abort_task();
        // tokio intervals need a non-zero period
        let period = interval.max(MIN_INTERVAL);
        self.interval = period;

        let handle = self.handle.clone().unwrap_or_else(Handle::current);
        let task = handle.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                on_fire();
            }
        });
        self.task = Some(task);
        trace!("rotation timer started with interval {period:?}");
        !restarted
    }

    /// Stop the timer, returns false if it was not running.
    pub fn stop(&mut self) -> bool {
        let stopped = self.abort_task();
        if stopped {
            trace!("rotation timer stopped");
        }
        stopped
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// The interval of the last start, if it has been started.
    pub fn interval(&self) -> Option<Duration> {
        if self.interval.is_zero() {
            None
        } else {
            Some(self.interval)
        }
    }

    fn abort_task(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                let running = !task.is_finished();
                task.abort();
                running
            }
            None => false,
        }
    }
}

impl Default for RotationTimer {
    fn default() -> Self {
        RotationTimer::new(None)
    }
}

impl Drop for RotationTimer {
    fn drop(&mut self) {
        self.abort_task();
    }
}
