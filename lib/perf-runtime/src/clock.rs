/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A source of monotonic timestamps in nanoseconds.
///
/// The returned value must never decrease for the lifetime of the process.
pub trait MonotonicClock: Send + Sync {
    fn now_ns(&self) -> u64;
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for Arc<T> {
    #[inline]
    fn now_ns(&self) -> u64 {
        self.as_ref().now_ns()
    }
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for &T {
    #[inline]
    fn now_ns(&self) -> u64 {
        (**self).now_ns()
    }
}

/// Clock backed by [`Instant`], counting from the moment it was created.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    base: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            base: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now_ns(&self) -> u64 {
        u64::try_from(self.base.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ns: u64) -> Self {
        ManualClock {
            now: AtomicU64::new(start_ns),
        }
    }

    pub fn advance(&self, delta_ns: u64) -> u64 {
        self.now.fetch_add(delta_ns, Ordering::Relaxed) + delta_ns
    }

    /// Move the clock forward to `ns`. Going backwards is ignored.
    pub fn set(&self, ns: u64) {
        self.now.fetch_max(ns, Ordering::Relaxed);
    }
}

impl MonotonicClock for ManualClock {
    #[inline]
    fn now_ns(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_non_decreasing() {
        let clock = SystemClock::new();
        let mut last = clock.now_ns();
        for _ in 0..1000 {
            let now = clock.now_ns();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn manual() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_ns(), 100);
        assert_eq!(clock.advance(50), 150);
        clock.set(120);
        assert_eq!(clock.now_ns(), 150);
        clock.set(1_000);
        assert_eq!(clock.now_ns(), 1_000);

        let shared: Arc<dyn MonotonicClock> = Arc::new(clock);
        assert_eq!(shared.now_ns(), 1_000);
    }
}
