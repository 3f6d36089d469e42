/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use crate::{CreationError, MergeError, PercentileIter};

pub const DEFAULT_LOWEST: u64 = 1;
/// The largest integer a double can hold exactly.
pub const DEFAULT_HIGHEST: u64 = (1 << 53) - 1;
pub const DEFAULT_SIGFIG: u8 = 3;

/// A fixed-memory histogram with bounded relative error.
///
/// The value range is split into buckets whose width doubles from one to
/// the next. Each bucket is split into the same number of linear
/// sub-buckets, enough to tell apart `significant_figures` decimal digits.
/// The lower half of every bucket but the first overlaps the previous
/// bucket, so only the upper half of each is stored.
///
/// All counts live in one array allocated at construction. The slot of a
/// value is computed from its leading zero count, which keeps recording O(1).
#[derive(Clone)]
pub struct Histogram {
    lowest_trackable_value: u64,
    highest_trackable_value: u64,
    significant_figures: u8,

    unit_magnitude: u8,
    sub_bucket_half_count_magnitude: u8,
    sub_bucket_count: u32,
    sub_bucket_half_count: u32,
    sub_bucket_mask: u64,
    leading_zero_count_base: u8,
    bucket_count: u8,

    counts: Box<[u64]>,
    total_count: u64,
    min_value: u64,
    max_value: u64,
}

impl Histogram {
    pub fn new(lowest: u64, highest: u64, significant_figures: u8) -> Result<Self, CreationError> {
        if lowest < 1 {
            return Err(CreationError::LowestIsZero);
        }
        if highest <= lowest {
            return Err(CreationError::HighestNotAboveLowest { lowest, highest });
        }
        if !(1..=5).contains(&significant_figures) {
            return Err(CreationError::SigFigOutOfRange(significant_figures));
        }

        let largest_value_with_single_unit_resolution = 2 * 10_u64.pow(significant_figures as u32);
        // ceil(log2(x))
        let sub_bucket_count_magnitude =
            (u64::BITS - (largest_value_with_single_unit_resolution - 1).leading_zeros()) as u8;
        let sub_bucket_half_count_magnitude = sub_bucket_count_magnitude.max(1) - 1;

        let unit_magnitude = lowest.ilog2() as u8;
        if unit_magnitude + sub_bucket_half_count_magnitude > 61 {
            return Err(CreationError::RangeTooWide(lowest));
        }

        let sub_bucket_count = 1_u32 << (sub_bucket_half_count_magnitude + 1);
        let sub_bucket_half_count = sub_bucket_count / 2;
        let sub_bucket_mask = (u64::from(sub_bucket_count) - 1) << unit_magnitude;
        let leading_zero_count_base = 64 - unit_magnitude - sub_bucket_half_count_magnitude - 1;

        let bucket_count = buckets_to_cover(highest, sub_bucket_count, unit_magnitude);
        let len = (bucket_count as usize + 1) * sub_bucket_half_count as usize;

        Ok(Histogram {
            lowest_trackable_value: lowest,
            highest_trackable_value: highest,
            significant_figures,
            unit_magnitude,
            sub_bucket_half_count_magnitude,
            sub_bucket_count,
            sub_bucket_half_count,
            sub_bucket_mask,
            leading_zero_count_base,
            bucket_count,
            counts: vec![0; len].into_boxed_slice(),
            total_count: 0,
            min_value: u64::MAX,
            max_value: 0,
        })
    }

    #[inline]
    pub fn lowest_trackable_value(&self) -> u64 {
        self.lowest_trackable_value
    }

    #[inline]
    pub fn highest_trackable_value(&self) -> u64 {
        self.highest_trackable_value
    }

    #[inline]
    pub fn significant_figures(&self) -> u8 {
        self.significant_figures
    }

    /// Number of slots in the count array.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn bucket_count(&self) -> u8 {
        self.bucket_count
    }

    #[inline]
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    #[inline]
    pub fn is_trackable(&self, value: u64) -> bool {
        value >= self.lowest_trackable_value && value <= self.highest_trackable_value
    }

    /// Record a value, returns false and leaves the histogram untouched if
    /// the value is out of the trackable range.
    #[inline]
    pub fn record(&mut self, value: u64) -> bool {
        self.record_n(value, 1)
    }

    pub fn record_n(&mut self, value: u64, count: u64) -> bool {
        if !self.is_trackable(value) {
            return false;
        }
        if count == 0 {
            return true;
        }

        let index = self.index_for(value);
        self.counts[index] = self.counts[index].saturating_add(count);
        self.total_count = self.total_count.saturating_add(count);
        self.min_value = self.min_value.min(value);
        self.max_value = self.max_value.max(value);
        true
    }

    pub fn reset(&mut self) {
        self.counts.fill(0);
        self.total_count = 0;
        self.min_value = u64::MAX;
        self.max_value = 0;
    }

    pub fn is_compatible(&self, other: &Histogram) -> bool {
        self.params() == other.params()
    }

    /// Add all counts of `other` into this histogram.
    ///
    /// Both histograms must have been created with the same parameters,
    /// otherwise nothing is changed.
    pub fn merge(&mut self, other: &Histogram) -> Result<(), MergeError> {
        if !self.is_compatible(other) {
            return Err(MergeError::Incompatible {
                expected: self.params(),
                found: other.params(),
            });
        }
        if other.is_empty() {
            return Ok(());
        }

        for (dst, src) in self.counts.iter_mut().zip(other.counts.iter()) {
            *dst = dst.saturating_add(*src);
        }
        self.total_count = self.total_count.saturating_add(other.total_count);
        self.min_value = self.min_value.min(other.min_value);
        self.max_value = self.max_value.max(other.max_value);
        Ok(())
    }

    /// The smallest recorded value, 0 if empty.
    pub fn min(&self) -> u64 {
        if self.is_empty() { 0 } else { self.min_value }
    }

    /// The largest recorded value, 0 if empty.
    pub fn max(&self) -> u64 {
        if self.is_empty() { 0 } else { self.max_value }
    }

    /// Mean of the median equivalent values of all recorded values.
    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        let sum = self
            .occupied()
            .map(|(index, count)| self.median_equivalent(self.value_for(index)) as f64 * count as f64)
            .sum::<f64>();
        sum / self.total_count as f64
    }

    pub fn stddev(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        let mean = self.mean();
        let geometric_dev_total = self
            .occupied()
            .map(|(index, count)| {
                let dev = self.median_equivalent(self.value_for(index)) as f64 - mean;
                dev * dev * count as f64
            })
            .sum::<f64>();
        (geometric_dev_total / self.total_count as f64).sqrt()
    }

    /// The value below or at which `percentile` percent of the recorded
    /// values fall, reported as the highest value equivalent to the bucket
    /// that reaches the target count.
    ///
    /// Results are clamped to the recorded extremes, so `0` gives
    /// [`min`](Self::min) and `100` gives [`max`](Self::max).
    /// An empty histogram always gives 0.
    pub fn value_at_percentile(&self, percentile: f64) -> u64 {
        if self.is_empty() {
            return 0;
        }
        if percentile.is_nan() || percentile <= 0.0 {
            return self.min_value;
        }
        if percentile >= 100.0 {
            return self.max_value;
        }

        let count_at_percentile = ((percentile / 100.0) * self.total_count as f64).ceil() as u64;
        let count_at_percentile = count_at_percentile.clamp(1, self.total_count);

        let mut total_to_current_index = 0_u64;
        for (index, count) in self.occupied() {
            total_to_current_index = total_to_current_index.saturating_add(count);
            if total_to_current_index >= count_at_percentile {
                let value = self.highest_equivalent(self.value_for(index));
                return value.clamp(self.min_value, self.max_value);
            }
        }
        self.max_value
    }

    #[inline]
    pub fn value_at_quantile(&self, quantile: f64) -> u64 {
        self.value_at_percentile(quantile * 100.0)
    }

    /// Iterate percentile breakpoints with one reporting tick per half
    /// distance to 100%.
    pub fn percentiles(&self) -> PercentileIter<'_> {
        PercentileIter::new(self, 1)
    }

    pub fn iter_percentiles(&self, ticks_per_half_distance: u32) -> PercentileIter<'_> {
        PercentileIter::new(self, ticks_per_half_distance)
    }

    /// Count recorded in the slot `value` maps to.
    pub fn count_at(&self, value: u64) -> u64 {
        if !self.is_trackable(value) {
            return 0;
        }
        self.counts[self.index_for(value)]
    }

    pub fn lowest_equivalent(&self, value: u64) -> u64 {
        let bucket_index = self.bucket_for(value);
        let sub_bucket_index = self.sub_bucket_for(value, bucket_index);
        self.value_from_loc(bucket_index, sub_bucket_index)
    }

    pub fn highest_equivalent(&self, value: u64) -> u64 {
        self.next_non_equivalent(value).saturating_sub(1)
    }

    pub fn median_equivalent(&self, value: u64) -> u64 {
        self.lowest_equivalent(value)
            .saturating_add(self.equivalent_range(value) >> 1)
    }

    pub fn next_non_equivalent(&self, value: u64) -> u64 {
        self.lowest_equivalent(value)
            .saturating_add(self.equivalent_range(value))
    }

    /// Width of the range of values sharing a slot with `value`.
    pub fn equivalent_range(&self, value: u64) -> u64 {
        let bucket_index = self.bucket_for(value);
        let sub_bucket_index = self.sub_bucket_for(value, bucket_index);
        let adjusted_bucket = if sub_bucket_index >= self.sub_bucket_count {
            bucket_index + 1
        } else {
            bucket_index
        };
        1_u64 << (self.unit_magnitude + adjusted_bucket)
    }

    pub(crate) fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub(crate) fn occupied(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count != 0)
            .map(|(index, count)| (index, *count))
    }

    fn params(&self) -> (u64, u64, u8) {
        (
            self.lowest_trackable_value,
            self.highest_trackable_value,
            self.significant_figures,
        )
    }

    #[inline]
    fn bucket_for(&self, value: u64) -> u8 {
        self.leading_zero_count_base - (value | self.sub_bucket_mask).leading_zeros() as u8
    }

    #[inline]
    fn sub_bucket_for(&self, value: u64, bucket_index: u8) -> u32 {
        (value >> (bucket_index + self.unit_magnitude)) as u32
    }

    #[inline]
    fn index_for(&self, value: u64) -> usize {
        let bucket_index = self.bucket_for(value);
        let sub_bucket_index = self.sub_bucket_for(value, bucket_index);
        let bucket_base_index =
            (bucket_index as usize + 1) << self.sub_bucket_half_count_magnitude;
        bucket_base_index + sub_bucket_index as usize - self.sub_bucket_half_count as usize
    }

    #[inline]
    fn value_from_loc(&self, bucket_index: u8, sub_bucket_index: u32) -> u64 {
        u64::from(sub_bucket_index) << (bucket_index + self.unit_magnitude)
    }

    /// The lowest value that maps to slot `index`.
    pub(crate) fn value_for(&self, index: usize) -> u64 {
        let mut bucket_index = (index >> self.sub_bucket_half_count_magnitude) as isize - 1;
        let mut sub_bucket_index =
            (index as u32 & (self.sub_bucket_half_count - 1)) + self.sub_bucket_half_count;
        if bucket_index < 0 {
            sub_bucket_index -= self.sub_bucket_half_count;
            bucket_index = 0;
        }
        self.value_from_loc(bucket_index as u8, sub_bucket_index)
    }
}

fn buckets_to_cover(value: u64, sub_bucket_count: u32, unit_magnitude: u8) -> u8 {
    let mut smallest_untrackable_value = u64::from(sub_bucket_count) << unit_magnitude;
    let mut buckets_needed = 1_u8;
    while smallest_untrackable_value <= value {
        if smallest_untrackable_value > u64::MAX / 2 {
            return buckets_needed + 1;
        }
        smallest_untrackable_value <<= 1;
        buckets_needed += 1;
    }
    buckets_needed
}

impl PartialEq for Histogram {
    fn eq(&self, other: &Self) -> bool {
        self.params() == other.params()
            && self.total_count == other.total_count
            && self.min() == other.min()
            && self.max() == other.max()
            && self.counts == other.counts
    }
}

impl Eq for Histogram {}

impl fmt::Debug for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Histogram")
            .field("lowest_trackable_value", &self.lowest_trackable_value)
            .field("highest_trackable_value", &self.highest_trackable_value)
            .field("significant_figures", &self.significant_figures)
            .field("len", &self.counts.len())
            .field("total_count", &self.total_count)
            .field("min", &self.min())
            .field("max", &self.max())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_params() {
        assert_eq!(Histogram::new(0, 100, 3).unwrap_err(), CreationError::LowestIsZero);
        assert_eq!(
            Histogram::new(10, 10, 3).unwrap_err(),
            CreationError::HighestNotAboveLowest {
                lowest: 10,
                highest: 10
            }
        );
        assert_eq!(
            Histogram::new(1, 100, 0).unwrap_err(),
            CreationError::SigFigOutOfRange(0)
        );
        assert_eq!(
            Histogram::new(1, 100, 6).unwrap_err(),
            CreationError::SigFigOutOfRange(6)
        );
        assert_eq!(
            Histogram::new(1 << 50, u64::MAX, 5).unwrap_err(),
            CreationError::RangeTooWide(1 << 50)
        );
    }

    #[test]
    fn layout() {
        let h = Histogram::new(1, DEFAULT_HIGHEST, 3).unwrap();
        assert_eq!(h.sub_bucket_count, 2048);
        assert_eq!(h.sub_bucket_half_count, 1024);
        assert_eq!(h.unit_magnitude, 0);
        assert_eq!(h.bucket_count, 43);
        assert_eq!(h.len(), 44 * 1024);

        let h = Histogram::new(1000, 1_000_000, 2).unwrap();
        assert_eq!(h.sub_bucket_count, 256);
        assert_eq!(h.unit_magnitude, 9);
    }

    #[test]
    fn narrow_range() {
        let mut h = Histogram::new(5, 6, 1).unwrap();
        assert!(h.record(5));
        assert!(h.record(6));
        assert!(!h.record(4));
        assert!(!h.record(7));
        assert_eq!(h.total_count(), 2);
    }

    #[test]
    fn record_out_of_range() {
        let mut h = Histogram::new(10, 1000, 3).unwrap();
        assert!(!h.record(9));
        assert!(!h.record(1001));
        assert!(h.is_empty());
        assert!(h.record(10));
        assert!(h.record(1000));
        assert_eq!(h.total_count(), 2);
        assert_eq!(h.min(), 10);
        assert_eq!(h.max(), 1000);
    }

    #[test]
    fn exact_extremes() {
        let mut h = Histogram::new(1, 3_600_000_000_000, 3).unwrap();
        h.record(123_456_789);
        h.record(987_654_321);
        assert_eq!(h.min(), 123_456_789);
        assert_eq!(h.max(), 987_654_321);
        assert_eq!(h.value_at_percentile(0.0), 123_456_789);
        assert_eq!(h.value_at_percentile(100.0), 987_654_321);
    }

    #[test]
    fn equivalent_values() {
        let h = Histogram::new(1, DEFAULT_HIGHEST, 3).unwrap();
        // exact below the first bucket boundary
        assert_eq!(h.lowest_equivalent(2047), 2047);
        assert_eq!(h.equivalent_range(2047), 1);
        assert_eq!(h.lowest_equivalent(2049), 2048);
        assert_eq!(h.highest_equivalent(2048), 2049);
        assert_eq!(h.equivalent_range(10_007), 8);
        assert_eq!(h.lowest_equivalent(10_007), 10_000);
        assert_eq!(h.median_equivalent(10_007), 10_004);
    }

    #[test]
    fn index_round_trip() {
        let h = Histogram::new(1, 1 << 40, 2).unwrap();
        for index in 0..h.len() {
            let value = h.value_for(index);
            if value >= 1 && value <= h.highest_trackable_value() {
                assert_eq!(h.index_for(value), index, "value {value}");
            }
        }
    }

    #[test]
    fn relative_error_bound() {
        for sigfig in 1..=5 {
            let h = Histogram::new(1, 1 << 40, sigfig).unwrap();
            let bound = 10_f64.powi(-(sigfig as i32));
            let mut v = 1_u64;
            while v < (1 << 40) {
                let err = (h.highest_equivalent(v) - h.lowest_equivalent(v)) as f64 / v as f64;
                assert!(err <= bound, "sigfig {sigfig} value {v} error {err}");
                v = v * 3 + 1;
            }
        }
    }

    #[test]
    fn reset() {
        let mut h = Histogram::new(1, 10_000, 3).unwrap();
        let len = h.len();
        for v in 1..=100 {
            h.record(v);
        }
        h.reset();
        assert_eq!(h.total_count(), 0);
        assert_eq!(h.len(), len);
        assert_eq!(h.min(), 0);
        assert_eq!(h.max(), 0);
        assert_eq!(h.mean(), 0.0);
        assert_eq!(h.stddev(), 0.0);
        assert_eq!(h.value_at_percentile(50.0), 0);
        assert!(h.counts().iter().all(|c| *c == 0));
    }

    #[test]
    fn mean_stddev() {
        let mut h = Histogram::new(1, 100_000, 3).unwrap();
        for v in [10, 20, 30, 40] {
            h.record(v);
        }
        assert_eq!(h.mean(), 25.0);
        assert!((h.stddev() - 125_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn merge() {
        let mut a = Histogram::new(1, 100_000, 3).unwrap();
        let mut b = Histogram::new(1, 100_000, 3).unwrap();
        a.record(5);
        b.record(50_000);
        b.record_n(7, 3);
        a.merge(&b).unwrap();
        assert_eq!(a.total_count(), 5);
        assert_eq!(a.min(), 5);
        assert_eq!(a.max(), 50_000);
        assert_eq!(a.count_at(7), 3);

        let c = Histogram::new(1, 100_000, 2).unwrap();
        let before = a.clone();
        assert!(matches!(a.merge(&c), Err(MergeError::Incompatible { .. })));
        assert_eq!(a.counts(), before.counts());
        assert_eq!(a.total_count(), before.total_count());
    }

    #[test]
    fn percentile_median() {
        let mut h = Histogram::new(1, 100_000, 3).unwrap();
        for v in 1..=100 {
            h.record(v);
        }
        assert_eq!(h.value_at_percentile(50.0), 50);
        assert_eq!(h.value_at_percentile(99.0), 99);
        assert_eq!(h.value_at_percentile(99.5), 100);
        assert_eq!(h.value_at_quantile(0.25), 25);
    }
}
