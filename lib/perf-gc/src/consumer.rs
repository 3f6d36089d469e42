/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::GcEntry;

/// Receiver of relayed GC entries, called on the delivery task in the order
/// the entries were queued.
pub trait GcEntryConsumer: Send + 'static {
    fn consume(&mut self, entry: GcEntry);
}

impl<F> GcEntryConsumer for F
where
    F: FnMut(GcEntry) + Send + 'static,
{
    fn consume(&mut self, entry: GcEntry) {
        self(entry)
    }
}
