/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde_json::Value;

use crate::TimelineError;

/// A point on the timeline given either by the name of a mark or directly
/// in milliseconds since the origin.
#[derive(Clone, Debug, PartialEq)]
pub enum TimeSpec {
    Mark(String),
    Timestamp(f64),
}

impl From<&str> for TimeSpec {
    fn from(name: &str) -> Self {
        TimeSpec::Mark(name.to_string())
    }
}

impl From<String> for TimeSpec {
    fn from(name: String) -> Self {
        TimeSpec::Mark(name)
    }
}

impl From<f64> for TimeSpec {
    fn from(ts: f64) -> Self {
        TimeSpec::Timestamp(ts)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkOptions {
    pub(crate) start_time: Option<f64>,
    pub(crate) detail: Option<Value>,
}

impl MarkOptions {
    pub fn new() -> Self {
        MarkOptions::default()
    }

    /// Place the mark at the given time instead of now.
    pub fn start_time(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Bounds of a measure.
///
/// With nothing set the measure spans from the origin to now. Otherwise at
/// least one of start and end must be given, and at most two of start, end
/// and duration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasureOptions {
    pub(crate) start: Option<TimeSpec>,
    pub(crate) end: Option<TimeSpec>,
    pub(crate) duration: Option<f64>,
    pub(crate) detail: Option<Value>,
}

impl MeasureOptions {
    pub fn new() -> Self {
        MeasureOptions::default()
    }

    pub fn start<T: Into<TimeSpec>>(mut self, start: T) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn end<T: Into<TimeSpec>>(mut self, end: T) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.duration.is_none() && self.detail.is_none()
    }

    pub(crate) fn check(&self) -> Result<(), TimelineError> {
        if self.is_empty() {
            return Ok(());
        }
        if self.start.is_none() && self.end.is_none() {
            return Err(TimelineError::InvalidMeasureOptions(
                "start or end must be specified",
            ));
        }
        if self.start.is_some() && self.end.is_some() && self.duration.is_some() {
            return Err(TimelineError::InvalidMeasureOptions(
                "start, end and duration can not be all specified",
            ));
        }
        if self.duration.is_some_and(|d| d < 0.0 || d.is_nan()) {
            return Err(TimelineError::InvalidMeasureOptions(
                "duration must not be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObserveOptions {
    /// Observe any number of entry types, without buffered entries.
    EntryTypes(Vec<String>),
    /// Observe a single entry type, optionally starting with the entries
    /// already on the timeline.
    Type { entry_type: String, buffered: bool },
}

impl ObserveOptions {
    pub fn entry_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ObserveOptions::EntryTypes(types.into_iter().map(Into::into).collect())
    }

    pub fn single<S: Into<String>>(entry_type: S, buffered: bool) -> Self {
        ObserveOptions::Type {
            entry_type: entry_type.into(),
            buffered,
        }
    }

    /// Build from loosely specified fields, exactly one of `entry_types`
    /// and `entry_type` must be present.
    pub fn from_parts(
        entry_types: Option<Vec<String>>,
        entry_type: Option<String>,
        buffered: bool,
    ) -> Result<Self, TimelineError> {
        match (entry_types, entry_type) {
            (Some(types), None) => Ok(ObserveOptions::EntryTypes(types)),
            (None, Some(entry_type)) => Ok(ObserveOptions::Type {
                entry_type,
                buffered,
            }),
            _ => Err(TimelineError::InvalidObserveOptions),
        }
    }
}
