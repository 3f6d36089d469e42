/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;

use perf_runtime::{MonotonicClock, RotationTimer};

use crate::RecordableHistogram;

/// One hour in nanoseconds.
const HIGHEST_DELAY: u64 = 3_600_000_000_000;

/// Samples scheduling delay of the runtime it runs on.
///
/// A timer fires every `resolution`. Each time a firing comes later than
/// expected, the lateness in nanoseconds is recorded.
pub struct IntervalHistogram {
    resolution: Duration,
    clock: Arc<dyn MonotonicClock>,
    histogram: Arc<Mutex<RecordableHistogram>>,
    timer: RotationTimer,
}

impl IntervalHistogram {
    pub fn new(resolution: Duration, clock: Arc<dyn MonotonicClock>, handle: Option<Handle>) -> Self {
        // the bounds are constant and valid
        let histogram = RecordableHistogram::new(1, HIGHEST_DELAY, 3).unwrap();
        IntervalHistogram {
            resolution,
            clock,
            histogram: Arc::new(Mutex::new(histogram)),
            timer: RotationTimer::new(handle),
        }
    }

    #[inline]
    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    /// Start sampling, returns false if already enabled.
    pub fn enable(&mut self) -> bool {
        if self.timer.is_running() {
            return false;
        }

        let clock = Arc::clone(&self.clock);
        let histogram = Arc::clone(&self.histogram);
        let expected = u64::try_from(self.resolution.as_nanos()).unwrap_or(u64::MAX);
        let mut last = clock.now_ns();
        self.timer.start(self.resolution, move || {
            let now = clock.now_ns();
            let actual = now.saturating_sub(last);
            if actual > expected {
                histogram.lock().unwrap().record(actual - expected);
            }
            last = now;
        })
    }

    /// Stop sampling, returns false if not enabled.
    pub fn disable(&mut self) -> bool {
        self.timer.stop()
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.timer.is_running()
    }

    /// A copy of the samples taken so far.
    pub fn snapshot(&self) -> RecordableHistogram {
        self.histogram.lock().unwrap().clone()
    }

    pub fn with_histogram<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&RecordableHistogram) -> R,
    {
        f(&self.histogram.lock().unwrap())
    }

    pub fn reset(&self) {
        self.histogram.lock().unwrap().reset();
    }
}
