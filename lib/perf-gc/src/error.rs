/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

use crate::GcKind;

/// Why a hook invocation did not produce a queued entry, or why gc tracking
/// could not be started.
///
/// Hook errors should not be escalated by the GC host, they are only
/// reported for diagnostics.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    #[error("gc tracking is not enabled")]
    Disarmed,
    #[error("end of {0} collection without a matching start")]
    UnmatchedEnd(GcKind),
    #[error("relay queue is full, entry dropped")]
    ChannelFull,
    #[error("relay is already enabled by another consumer")]
    AlreadyEnabled,
}
