/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::{
    CreationError, DEFAULT_HIGHEST, DEFAULT_LOWEST, DEFAULT_SIGFIG, Histogram, HistogramRecorder,
    HistogramStats, Quantile, RotatingHistogram,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistogramMetricsConfig {
    quantile_list: BTreeSet<Quantile>,
    rotate_interval: Duration,
    lowest: u64,
    highest: u64,
    sigfig: u8,
}

impl HistogramMetricsConfig {
    pub fn with_rotate(dur: Duration) -> Self {
        HistogramMetricsConfig {
            quantile_list: BTreeSet::new(),
            rotate_interval: dur,
            lowest: DEFAULT_LOWEST,
            highest: DEFAULT_HIGHEST,
            sigfig: DEFAULT_SIGFIG,
        }
    }

    #[inline]
    pub fn set_quantile_list(&mut self, list: BTreeSet<Quantile>) {
        self.quantile_list = list;
    }

    #[inline]
    pub fn set_rotate_interval(&mut self, dur: Duration) {
        self.rotate_interval = dur;
    }

    #[inline]
    pub fn rotate_interval(&self) -> Duration {
        self.rotate_interval
    }

    #[inline]
    pub fn set_lowest(&mut self, lowest: u64) {
        self.lowest = lowest;
    }

    #[inline]
    pub fn set_highest(&mut self, highest: u64) {
        self.highest = highest;
    }

    #[inline]
    pub fn set_sigfig(&mut self, sigfig: u8) {
        self.sigfig = sigfig;
    }

    /// Check that a histogram can be built from the configured bounds.
    pub fn check(&self) -> Result<(), CreationError> {
        Histogram::new(self.lowest, self.highest, self.sigfig).map(|_| ())
    }

    pub fn build_spawned(
        &self,
        handle: Option<Handle>,
    ) -> Result<(HistogramRecorder, Arc<HistogramStats>), CreationError> {
        let (h, r) = RotatingHistogram::new_with_bounds(
            self.rotate_interval,
            self.lowest,
            self.highest,
            self.sigfig,
        )?;
        let stats = if self.quantile_list.is_empty() {
            Arc::new(HistogramStats::default())
        } else {
            Arc::new(HistogramStats::with_quantiles(&self.quantile_list))
        };
        h.spawn_refresh(Arc::clone(&stats), handle);
        Ok((r, stats))
    }
}

impl Default for HistogramMetricsConfig {
    fn default() -> Self {
        HistogramMetricsConfig::with_rotate(Duration::from_secs(4))
    }
}
