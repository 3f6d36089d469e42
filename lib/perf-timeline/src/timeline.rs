/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use serde_json::json;
use tokio::runtime::Handle;

use perf_gc::{GcEntry, GcTracking, GcTrackingHandle};
use perf_runtime::{MonotonicClock, TimeOrigin};

use crate::observer::ObserverShared;
use crate::{
    EntryType, MarkOptions, MeasureOptions, PerformanceEntry, PerformanceEntryList,
    PerformanceObserver, TimeSpec, TimelineError,
};

const NANOS_PER_MILLI: f64 = 1_000_000.0;

pub struct TimelineBuilder {
    clock: Arc<dyn MonotonicClock>,
    origin: Option<TimeOrigin>,
    handle: Option<Handle>,
    gc: Option<Arc<GcTracking>>,
}

impl TimelineBuilder {
    pub fn new(clock: Arc<dyn MonotonicClock>) -> Self {
        TimelineBuilder {
            clock,
            origin: None,
            handle: None,
            gc: None,
        }
    }

    /// Use a previously captured origin, by default it is captured at build
    /// time.
    pub fn origin(mut self, origin: TimeOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Runtime for observer callbacks, the current one is used if not set.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Enable the `gc` entry type.
    pub fn gc_tracking(mut self, gc: Arc<GcTracking>) -> Self {
        self.gc = Some(gc);
        self
    }

    pub fn build(self) -> Timeline {
        let origin = self
            .origin
            .unwrap_or_else(|| TimeOrigin::capture(self.clock.as_ref()));
        Timeline {
            inner: Arc::new(TimelineInner {
                clock: self.clock,
                origin,
                handle: self.handle,
                gc: self.gc,
                state: Mutex::new(TimelineState::default()),
                gc_ref: Mutex::new(GcRef::default()),
                next_observer_id: AtomicU64::new(0),
            }),
        }
    }
}

/// User timing marks and measures plus the observers interested in them.
///
/// Cloning gives another handle to the same timeline.
#[derive(Clone)]
pub struct Timeline {
    pub(crate) inner: Arc<TimelineInner>,
}

impl Timeline {
    pub fn new(clock: Arc<dyn MonotonicClock>) -> Self {
        TimelineBuilder::new(clock).build()
    }

    pub fn builder(clock: Arc<dyn MonotonicClock>) -> TimelineBuilder {
        TimelineBuilder::new(clock)
    }

    #[inline]
    pub fn origin(&self) -> TimeOrigin {
        self.inner.origin
    }

    /// Milliseconds since the origin.
    pub fn now(&self) -> f64 {
        self.inner.origin.elapsed_millis(self.inner.clock.as_ref())
    }

    #[inline]
    pub fn supports_gc(&self) -> bool {
        self.inner.gc.is_some()
    }

    pub fn mark(&self, name: &str, options: MarkOptions) -> Arc<PerformanceEntry> {
        let start_time = options.start_time.unwrap_or_else(|| self.now());
        let entry = Arc::new(PerformanceEntry::new(
            name.to_string(),
            EntryType::Mark,
            start_time,
            0.0,
            options.detail,
        ));
        self.inner.queue_entry(Arc::clone(&entry), true);
        entry
    }

    pub fn measure(
        &self,
        name: &str,
        options: MeasureOptions,
    ) -> Result<Arc<PerformanceEntry>, TimelineError> {
        options.check()?;

        let end_time = match (&options.end, &options.start, options.duration) {
            (Some(end), _, _) => self.resolve(end)?,
            (None, Some(start), Some(duration)) => self.resolve(start)? + duration,
            _ => self.now(),
        };
        let start_time = match (&options.start, &options.end, options.duration) {
            (Some(start), _, _) => self.resolve(start)?,
            (None, Some(end), Some(duration)) => self.resolve(end)? - duration,
            _ => 0.0,
        };

        let entry = Arc::new(PerformanceEntry::new(
            name.to_string(),
            EntryType::Measure,
            start_time,
            end_time - start_time,
            options.detail,
        ));
        self.inner.queue_entry(Arc::clone(&entry), true);
        Ok(entry)
    }

    fn resolve(&self, point: &TimeSpec) -> Result<f64, TimelineError> {
        match point {
            TimeSpec::Mark(name) => {
                let state = self.inner.state.lock().unwrap();
                state
                    .buffer
                    .iter()
                    .rev()
                    .find(|e| e.entry_type() == EntryType::Mark && e.name() == name)
                    .map(|e| e.start_time())
                    .ok_or_else(|| TimelineError::MarkNotFound(name.clone()))
            }
            TimeSpec::Timestamp(ts) => {
                if *ts < 0.0 || ts.is_nan() {
                    Err(TimelineError::InvalidMeasureOptions(
                        "timestamp must not be negative",
                    ))
                } else {
                    Ok(*ts)
                }
            }
        }
    }

    /// Remove marks with the given name, or all marks.
    pub fn clear_marks(&self, name: Option<&str>) {
        self.clear(EntryType::Mark, name);
    }

    /// Remove measures with the given name, or all measures.
    pub fn clear_measures(&self, name: Option<&str>) {
        self.clear(EntryType::Measure, name);
    }

    fn clear(&self, entry_type: EntryType, name: Option<&str>) {
        let mut state = self.inner.state.lock().unwrap();
        state
            .buffer
            .retain(|e| e.entry_type() != entry_type || name.is_some_and(|n| e.name() != n));
    }

    /// All buffered entries in start time order.
    pub fn entries(&self) -> Vec<Arc<PerformanceEntry>> {
        self.filtered(|_| true)
    }

    pub fn entries_by_name(&self, name: &str) -> Vec<Arc<PerformanceEntry>> {
        self.filtered(|e| e.name() == name)
    }

    pub fn entries_by_type(&self, entry_type: EntryType) -> Vec<Arc<PerformanceEntry>> {
        self.filtered(|e| e.entry_type() == entry_type)
    }

    fn filtered<F>(&self, f: F) -> Vec<Arc<PerformanceEntry>>
    where
        F: Fn(&PerformanceEntry) -> bool,
    {
        let mut entries: Vec<_> = {
            let state = self.inner.state.lock().unwrap();
            state.buffer.iter().filter(|&e| f(e)).cloned().collect()
        };
        entries.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
        entries
    }

    pub fn observer<F>(&self, callback: F) -> PerformanceObserver
    where
        F: FnMut(PerformanceEntryList) + Send + 'static,
    {
        PerformanceObserver::new(self, callback)
    }
}

#[derive(Default)]
struct TimelineState {
    buffer: Vec<Arc<PerformanceEntry>>,
    observers: BTreeMap<u64, Arc<ObserverShared>>,
    pending: Vec<u64>,
    dispatch_scheduled: bool,
}

impl TimelineState {
    fn add_pending(&mut self, id: u64) {
        if !self.pending.contains(&id) {
            self.pending.push(id);
        }
    }
}

#[derive(Default)]
struct GcRef {
    observers: usize,
    handle: Option<GcTrackingHandle>,
}

pub(crate) struct TimelineInner {
    clock: Arc<dyn MonotonicClock>,
    origin: TimeOrigin,
    handle: Option<Handle>,
    gc: Option<Arc<GcTracking>>,
    state: Mutex<TimelineState>,
    // never locked on the entry delivery path
    gc_ref: Mutex<GcRef>,
    next_observer_id: AtomicU64,
}

impl TimelineInner {
    pub(crate) fn next_observer_id(&self) -> u64 {
        self.next_observer_id.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn supports_gc(&self) -> bool {
        self.gc.is_some()
    }

    fn queue_entry(self: &Arc<Self>, entry: Arc<PerformanceEntry>, keep: bool) {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        if keep {
            state.buffer.push(Arc::clone(&entry));
        }
        for (id, observer) in &state.observers {
            if observer.offer(&entry) && !state.pending.contains(id) {
                state.pending.push(*id);
            }
        }
        if !state.pending.is_empty() {
            self.schedule_dispatch(state);
        }
    }

    pub(crate) fn register(
        self: &Arc<Self>,
        observer: &Arc<ObserverShared>,
        buffered: Option<EntryType>,
    ) {
        let mut state = self.state.lock().unwrap();
        state.observers.insert(observer.id, Arc::clone(observer));

        let Some(entry_type) = buffered else {
            return;
        };
        let entries: Vec<_> = state
            .buffer
            .iter()
            .filter(|e| e.entry_type() == entry_type)
            .cloned()
            .collect();
        if !entries.is_empty() {
            observer.extend(entries);
            state.add_pending(observer.id);
            self.schedule_dispatch(&mut state);
        }
    }

    pub(crate) fn unregister(&self, id: u64) {
        let mut state = self.state.lock().unwrap();
        state.observers.remove(&id);
        state.pending.retain(|v| *v != id);
    }

    fn schedule_dispatch(self: &Arc<Self>, state: &mut TimelineState) {
        if state.dispatch_scheduled {
            return;
        }
        let Some(handle) = self.handle.clone().or_else(|| Handle::try_current().ok()) else {
            warn!("no runtime to dispatch performance entries, they stay with their observers");
            return;
        };
        state.dispatch_scheduled = true;
        let inner = Arc::clone(self);
        handle.spawn(async move {
            inner.dispatch();
        });
    }

    fn dispatch(&self) {
        let observers: Vec<Arc<ObserverShared>> = {
            let mut state = self.state.lock().unwrap();
            state.dispatch_scheduled = false;
            let pending = std::mem::take(&mut state.pending);
            pending
                .into_iter()
                .filter_map(|id| state.observers.get(&id).cloned())
                .collect()
        };
        for observer in observers {
            observer.deliver();
        }
    }

    pub(crate) fn gc_retain(self: &Arc<Self>) {
        let Some(gc) = &self.gc else {
            return;
        };
        let mut gc_ref = self.gc_ref.lock().unwrap();
        gc_ref.observers += 1;
        // retried by later gc observers if the tracking could not be started
        if gc_ref.handle.is_none() {
            let inner = Arc::downgrade(self);
            let origin = self.origin;
            let r = gc.enable(move |entry: GcEntry| {
                if let Some(inner) = inner.upgrade() {
                    inner.queue_entry(Arc::new(gc_performance_entry(origin, entry)), false);
                }
            });
            match r {
                Ok(handle) => {
                    gc_ref.handle = Some(handle);
                    debug!("timeline started observing gc");
                }
                Err(e) => warn!("timeline failed to observe gc: {e}"),
            }
        }
    }

    pub(crate) fn gc_release(&self) {
        let Some(gc) = &self.gc else {
            return;
        };
        let handle = {
            let mut gc_ref = self.gc_ref.lock().unwrap();
            gc_ref.observers = gc_ref.observers.saturating_sub(1);
            if gc_ref.observers == 0 {
                gc_ref.handle.take()
            } else {
                None
            }
        };
        if let Some(handle) = handle {
            gc.disable(handle);
            debug!("timeline stopped observing gc");
        }
    }
}

fn gc_performance_entry(origin: TimeOrigin, entry: GcEntry) -> PerformanceEntry {
    PerformanceEntry::new(
        "gc".to_string(),
        EntryType::Gc,
        origin.relative_millis(entry.start_time),
        entry.duration as f64 / NANOS_PER_MILLI,
        Some(json!({ "kind": entry.kind.as_str() })),
    )
}
