/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::{CreationError, Histogram, MergeError};

/// A histogram that also counts the values it had to reject.
#[derive(Clone, Debug)]
pub struct RecordableHistogram {
    inner: Histogram,
    exceeds: u64,
}

impl RecordableHistogram {
    pub fn new(lowest: u64, highest: u64, sigfig: u8) -> Result<Self, CreationError> {
        Ok(RecordableHistogram::from(Histogram::new(lowest, highest, sigfig)?))
    }

    pub fn record(&mut self, value: u64) -> bool {
        if self.inner.record(value) {
            true
        } else {
            self.exceeds = self.exceeds.saturating_add(1);
            false
        }
    }

    /// Merge `other` into this one, summing both counts and exceeds.
    pub fn add(&mut self, other: &RecordableHistogram) -> Result<(), MergeError> {
        self.inner.merge(&other.inner)?;
        self.exceeds = self.exceeds.saturating_add(other.exceeds);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.inner.reset();
        self.exceeds = 0;
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.inner.total_count()
    }

    #[inline]
    pub fn exceeds(&self) -> u64 {
        self.exceeds
    }

    #[inline]
    pub fn inner(&self) -> &Histogram {
        &self.inner
    }
}

impl From<Histogram> for RecordableHistogram {
    fn from(inner: Histogram) -> Self {
        RecordableHistogram { inner, exceeds: 0 }
    }
}
