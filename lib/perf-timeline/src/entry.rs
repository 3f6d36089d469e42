/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryType {
    Mark,
    Measure,
    Gc,
}

impl EntryType {
    pub const SUPPORTED: &'static [EntryType] = &[EntryType::Mark, EntryType::Measure, EntryType::Gc];

    pub const fn as_str(&self) -> &'static str {
        match self {
            EntryType::Mark => "mark",
            EntryType::Measure => "measure",
            EntryType::Gc => "gc",
        }
    }
}

impl FromStr for EntryType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mark" => Ok(EntryType::Mark),
            "measure" => Ok(EntryType::Measure),
            "gc" => Ok(EntryType::Gc),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named point or span on the timeline. Times are in milliseconds
/// relative to the timeline origin.
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceEntry {
    name: String,
    entry_type: EntryType,
    start_time: f64,
    duration: f64,
    detail: Option<Value>,
}

impl PerformanceEntry {
    pub(crate) fn new(
        name: String,
        entry_type: EntryType,
        start_time: f64,
        duration: f64,
        detail: Option<Value>,
    ) -> Self {
        PerformanceEntry {
            name,
            entry_type,
            start_time,
            duration,
            detail,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    #[inline]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[inline]
    pub fn detail(&self) -> Option<&Value> {
        self.detail.as_ref()
    }
}

/// The batch of entries handed to an observer callback.
#[derive(Clone, Debug, Default)]
pub struct PerformanceEntryList {
    entries: Vec<Arc<PerformanceEntry>>,
}

impl PerformanceEntryList {
    pub(crate) fn new(entries: Vec<Arc<PerformanceEntry>>) -> Self {
        PerformanceEntryList { entries }
    }

    #[inline]
    pub fn entries(&self) -> &[Arc<PerformanceEntry>] {
        &self.entries
    }

    pub fn entries_by_type(&self, entry_type: EntryType) -> Vec<Arc<PerformanceEntry>> {
        self.entries
            .iter()
            .filter(|e| e.entry_type == entry_type)
            .cloned()
            .collect()
    }

    pub fn entries_by_name(&self, name: &str) -> Vec<Arc<PerformanceEntry>> {
        self.entries
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_inner(self) -> Vec<Arc<PerformanceEntry>> {
        self.entries
    }
}
