/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

use portable_atomic::AtomicF64;

use crate::{Histogram, Quantile};

pub struct HistogramQuantileStats {
    quantile: Quantile,
    value: AtomicU64,
}

impl HistogramQuantileStats {
    fn new(quantile: Quantile) -> Self {
        HistogramQuantileStats {
            quantile,
            value: AtomicU64::new(0),
        }
    }
}

/// The last published summary of a histogram, readable from any thread.
pub struct HistogramStats {
    count: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
    mean: AtomicF64,
    stddev: AtomicF64,
    quantile: Vec<HistogramQuantileStats>,
}

impl HistogramStats {
    pub fn new() -> Self {
        HistogramStats {
            count: AtomicU64::new(0),
            min: AtomicU64::new(0),
            max: AtomicU64::new(0),
            mean: AtomicF64::new(0.0_f64),
            stddev: AtomicF64::new(0.0_f64),
            quantile: Vec::with_capacity(8),
        }
    }

    pub fn with_quantiles<'a, T>(quantiles: T) -> Self
    where
        T: IntoIterator<Item = &'a Quantile>,
    {
        let mut stats = HistogramStats::new();
        for q in quantiles {
            stats.quantile.push(HistogramQuantileStats::new(q.clone()));
        }
        stats
    }

    pub fn with_quantile(mut self, quantile: Quantile) -> Self {
        self.quantile.push(HistogramQuantileStats::new(quantile));
        self
    }

    pub fn update(&self, histogram: &Histogram) {
        self.count.store(histogram.total_count(), Ordering::Relaxed);
        self.min.store(histogram.min(), Ordering::Relaxed);
        self.max.store(histogram.max(), Ordering::Relaxed);
        self.mean.store(histogram.mean(), Ordering::Relaxed);
        self.stddev.store(histogram.stddev(), Ordering::Relaxed);
        for q in &self.quantile {
            q.value.store(
                histogram.value_at_quantile(q.quantile.value()),
                Ordering::Relaxed,
            );
        }
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// The published value of `quantile`, if it is tracked.
    pub fn quantile(&self, quantile: &Quantile) -> Option<u64> {
        self.quantile
            .iter()
            .find(|q| &q.quantile == quantile)
            .map(|q| q.value.load(Ordering::Relaxed))
    }

    pub fn foreach_stat<F>(&self, mut call: F)
    where
        F: FnMut(Option<f64>, &str, f64),
    {
        let min = self.min.load(Ordering::Relaxed);
        call(None, "min", min as f64);
        let max = self.max.load(Ordering::Relaxed);
        call(None, "max", max as f64);
        let mean = self.mean.load(Ordering::Relaxed);
        call(None, "mean", mean);
        let stddev = self.stddev.load(Ordering::Relaxed);
        call(None, "stddev", stddev);
        for q in &self.quantile {
            let v = q.value.load(Ordering::Relaxed);
            call(Some(q.quantile.value()), q.quantile.as_str(), v as f64);
        }
    }
}

impl Default for HistogramStats {
    fn default() -> Self {
        HistogramStats::new()
            .with_quantile(Quantile::PCT50)
            .with_quantile(Quantile::PCT80)
            .with_quantile(Quantile::PCT90)
            .with_quantile(Quantile::PCT95)
            .with_quantile(Quantile::PCT99)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update() {
        let mut h = Histogram::new(1, 10_000, 3).unwrap();
        for v in 1..=100 {
            h.record(v);
        }
        let stats = HistogramStats::default();
        stats.update(&h);
        assert_eq!(stats.count(), 100);
        assert_eq!(stats.quantile(&Quantile::PCT50), Some(50));
        assert_eq!(stats.quantile(&Quantile::PCT99), Some(99));
        assert_eq!(stats.quantile(&Quantile::PCT999), None);

        let mut names = Vec::new();
        stats.foreach_stat(|q, name, v| {
            names.push(name.to_string());
            if name == "max" {
                assert_eq!(v, 100.0);
            }
            if name == "mean" {
                assert_eq!(v, 50.5);
            }
            if let Some(q) = q {
                assert!(q > 0.0 && q < 1.0);
            }
        });
        assert_eq!(
            names,
            ["min", "max", "mean", "stddev", "0.50", "0.80", "0.90", "0.95", "0.99"]
        );
    }
}
