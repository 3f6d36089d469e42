/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod entry;
pub use entry::{GcEntry, GcKind};

mod consumer;
pub use consumer::GcEntryConsumer;

mod error;
pub use error::RelayError;

mod relay;
pub use relay::{EventRelay, RELAY_QUEUE_CAPACITY};

mod tracking;
pub use tracking::{GcTracking, GcTrackingHandle};
