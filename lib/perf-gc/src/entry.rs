/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GcKind {
    /// Full heap collection.
    MarkCompact,
    /// Young generation collection.
    Generational,
}

impl GcKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GcKind::MarkCompact => "mark-compact",
            GcKind::Generational => "generational",
        }
    }
}

impl fmt::Display for GcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed collection. Times are raw monotonic clock readings in
/// nanoseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GcEntry {
    pub kind: GcKind,
    pub start_time: u64,
    pub duration: u64,
}
