/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::Histogram;

/// Walks the occupied slots of a histogram and yields `(percentile, value)`
/// breakpoints.
///
/// Reporting ticks get finer as the percentile gets closer to 100: there
/// are `ticks_per_half_distance` ticks between 0 and 50, as many between 50
/// and 75, and so on. The last item is always `(100.0, max)`.
pub struct PercentileIter<'a> {
    histogram: &'a Histogram,
    ticks_per_half_distance: f64,
    index: usize,
    total_to_index: u64,
    started: bool,
    percentile_to_iterate_to: f64,
    reached_end: bool,
}

impl<'a> PercentileIter<'a> {
    pub(crate) fn new(histogram: &'a Histogram, ticks_per_half_distance: u32) -> Self {
        PercentileIter {
            histogram,
            ticks_per_half_distance: ticks_per_half_distance.max(1) as f64,
            index: 0,
            total_to_index: 0,
            started: false,
            percentile_to_iterate_to: 0.0,
            reached_end: false,
        }
    }

    fn advance_tick(&mut self) {
        let remaining = 100.0 - self.percentile_to_iterate_to;
        let half_distance = ((100.0 / remaining).log2().floor() + 1.0).exp2();
        let reporting_ticks = self.ticks_per_half_distance * half_distance;
        self.percentile_to_iterate_to += 100.0 / reporting_ticks;
    }

    // only called with counts present, so min <= max
    fn value_at_index(&self) -> u64 {
        let value = self.histogram.value_for(self.index);
        self.histogram
            .highest_equivalent(value)
            .clamp(self.histogram.min(), self.histogram.max())
    }
}

impl Iterator for PercentileIter<'_> {
    type Item = (f64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let total_count = self.histogram.total_count();
        if self.total_to_index >= total_count {
            // all counts consumed, close with the 100th percentile once
            if self.reached_end || total_count == 0 {
                return None;
            }
            self.reached_end = true;
            return Some((100.0, self.histogram.max()));
        }

        let counts = self.histogram.counts();
        if !self.started {
            self.started = true;
            self.total_to_index = counts[0];
        }

        loop {
            let count = counts[self.index];
            if count != 0 {
                let current_percentile =
                    100.0 * self.total_to_index as f64 / total_count as f64;
                if self.percentile_to_iterate_to <= current_percentile {
                    let item = (self.percentile_to_iterate_to, self.value_at_index());
                    self.advance_tick();
                    return Some(item);
                }
            }

            self.index += 1;
            if self.index >= counts.len() {
                self.reached_end = true;
                return None;
            }
            self.total_to_index = self.total_to_index.saturating_add(counts[self.index]);
        }
    }
}
