/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::{
    CreationError, DEFAULT_HIGHEST, DEFAULT_LOWEST, DEFAULT_SIGFIG, HistogramRecorder,
    HistogramStats, RecordableHistogram,
};

/// A histogram owned by a background task which publishes its summary and
/// starts over every rotate interval.
pub struct RotatingHistogram {
    rotate_interval: Duration,
    inner: RecordableHistogram,
    receiver: mpsc::UnboundedReceiver<u64>,
}

impl RotatingHistogram {
    pub fn new(rotate_interval: Duration) -> (Self, HistogramRecorder) {
        RotatingHistogram::new_with_bounds(
            rotate_interval,
            DEFAULT_LOWEST,
            DEFAULT_HIGHEST,
            DEFAULT_SIGFIG,
        )
        .unwrap()
    }

    pub fn with_sigfig(
        rotate_interval: Duration,
        sigfig: u8,
    ) -> Result<(Self, HistogramRecorder), CreationError> {
        RotatingHistogram::new_with_bounds(rotate_interval, DEFAULT_LOWEST, DEFAULT_HIGHEST, sigfig)
    }

    pub fn new_with_max(
        rotate_interval: Duration,
        high: u64,
        sigfig: u8,
    ) -> Result<(Self, HistogramRecorder), CreationError> {
        RotatingHistogram::new_with_bounds(rotate_interval, DEFAULT_LOWEST, high, sigfig)
    }

    pub fn new_with_bounds(
        rotate_interval: Duration,
        low: u64,
        high: u64,
        sigfig: u8,
    ) -> Result<(Self, HistogramRecorder), CreationError> {
        let inner = RecordableHistogram::new(low, high, sigfig)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        Ok((
            RotatingHistogram {
                rotate_interval,
                inner,
                receiver,
            },
            HistogramRecorder::new(sender),
        ))
    }

    pub fn spawn_refresh(mut self, stats: Arc<HistogramStats>, handle: Option<Handle>) {
        let handle = handle.unwrap_or_else(Handle::current);
        handle.spawn(async move {
            const BATCH_SIZE: usize = 16;
            let mut buf = Vec::with_capacity(BATCH_SIZE);
            let mut rotate_interval = tokio::time::interval(self.rotate_interval);

            loop {
                tokio::select! {
                    biased;

                    n = self.receiver.recv_many(&mut buf, BATCH_SIZE) => {
                        if n == 0 {
                            break;
                        }
                        for v in &buf {
                            self.inner.record(*v);
                        }
                        buf.clear();
                    }
                    _ = rotate_interval.tick() => {
                        if self.inner.exceeds() > 0 {
                            debug!(
                                "{} values out of range [{}, {}] dropped in the last rotation",
                                self.inner.exceeds(),
                                self.inner.inner().lowest_trackable_value(),
                                self.inner.inner().highest_trackable_value(),
                            );
                        }
                        if !self.inner.inner().is_empty() {
                            stats.update(self.inner.inner());
                        }
                        self.inner.reset();
                    }
                }
            }
        });
    }
}
