/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::TimelineError;

mod entry;
pub use entry::{EntryType, PerformanceEntry, PerformanceEntryList};

mod options;
pub use options::{MarkOptions, MeasureOptions, ObserveOptions, TimeSpec};

mod timeline;
pub use timeline::{Timeline, TimelineBuilder};

mod observer;
pub use observer::PerformanceObserver;
