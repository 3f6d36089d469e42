/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::sync::mpsc;

/// A cloneable handle to feed values into a histogram owned by another task.
#[derive(Clone)]
pub struct HistogramRecorder {
    sender: mpsc::UnboundedSender<u64>,
}

impl HistogramRecorder {
    pub(crate) fn new(sender: mpsc::UnboundedSender<u64>) -> Self {
        HistogramRecorder { sender }
    }

    pub fn record(&self, v: u64) -> Result<(), mpsc::error::SendError<u64>> {
        self.sender.send(v)
    }

    /// Whether the owning histogram has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
