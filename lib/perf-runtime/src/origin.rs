/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::MonotonicClock;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// The monotonic timestamp taken when the process started measuring.
///
/// Relative timestamps handed out to users are expressed in milliseconds
/// since this origin. Capture it once at startup and pass it to every
/// component that converts raw clock readings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeOrigin {
    origin_ns: u64,
}

impl TimeOrigin {
    pub fn capture<C: MonotonicClock + ?Sized>(clock: &C) -> Self {
        TimeOrigin {
            origin_ns: clock.now_ns(),
        }
    }

    pub const fn from_nanos(origin_ns: u64) -> Self {
        TimeOrigin { origin_ns }
    }

    #[inline]
    pub fn as_nanos(&self) -> u64 {
        self.origin_ns
    }

    #[inline]
    pub fn as_millis(&self) -> f64 {
        self.origin_ns as f64 / NANOS_PER_MILLI
    }

    /// Convert a raw clock reading to milliseconds since the origin.
    ///
    /// Readings taken before the origin map to negative values.
    pub fn relative_millis(&self, ts_ns: u64) -> f64 {
        if ts_ns >= self.origin_ns {
            (ts_ns - self.origin_ns) as f64 / NANOS_PER_MILLI
        } else {
            -((self.origin_ns - ts_ns) as f64 / NANOS_PER_MILLI)
        }
    }

    pub fn elapsed_millis<C: MonotonicClock + ?Sized>(&self, clock: &C) -> f64 {
        self.relative_millis(clock.now_ns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    #[test]
    fn relative() {
        let clock = ManualClock::new(5_000_000);
        let origin = TimeOrigin::capture(&clock);
        assert_eq!(origin.as_nanos(), 5_000_000);
        assert_eq!(origin.as_millis(), 5.0);

        clock.advance(2_500_000);
        assert_eq!(origin.elapsed_millis(&clock), 2.5);
        assert_eq!(origin.relative_millis(4_000_000), -1.0);
    }
}
