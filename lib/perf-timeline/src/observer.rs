/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use crate::{
    EntryType, ObserveOptions, PerformanceEntry, PerformanceEntryList, Timeline, TimelineError,
};

type ObserverCallback = Box<dyn FnMut(PerformanceEntryList) + Send>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ObserveMode {
    #[default]
    Undefined,
    Multiple,
    Single,
}

#[derive(Default)]
struct ObserverState {
    mode: ObserveMode,
    entry_types: BTreeSet<EntryType>,
    buffer: Vec<Arc<PerformanceEntry>>,
}

pub(crate) struct ObserverShared {
    pub(crate) id: u64,
    callback: Mutex<ObserverCallback>,
    state: Mutex<ObserverState>,
}

impl ObserverShared {
    /// Queue the entry if its type is observed.
    pub(crate) fn offer(&self, entry: &Arc<PerformanceEntry>) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.entry_types.contains(&entry.entry_type()) {
            state.buffer.push(Arc::clone(entry));
            true
        } else {
            false
        }
    }

    pub(crate) fn extend(&self, entries: Vec<Arc<PerformanceEntry>>) {
        self.state.lock().unwrap().buffer.extend(entries);
    }

    fn take_records(&self) -> Vec<Arc<PerformanceEntry>> {
        std::mem::take(&mut self.state.lock().unwrap().buffer)
    }

    pub(crate) fn deliver(&self) {
        let records = self.take_records();
        if records.is_empty() {
            return;
        }
        let mut callback = self.callback.lock().unwrap();
        (callback)(PerformanceEntryList::new(records));
    }
}

/// Receives batches of timeline entries of the types it observes.
///
/// Callbacks run on the timeline's runtime, one batch per observer for all
/// entries queued since the previous dispatch. Dropping the observer
/// disconnects it.
pub struct PerformanceObserver {
    timeline: Timeline,
    shared: Arc<ObserverShared>,
}

impl PerformanceObserver {
    pub fn new<F>(timeline: &Timeline, callback: F) -> Self
    where
        F: FnMut(PerformanceEntryList) + Send + 'static,
    {
        PerformanceObserver {
            timeline: timeline.clone(),
            shared: Arc::new(ObserverShared {
                id: timeline.inner.next_observer_id(),
                callback: Mutex::new(Box::new(callback)),
                state: Mutex::new(ObserverState::default()),
            }),
        }
    }

    /// Entry types this observer may be asked to observe.
    pub fn supported_entry_types() -> &'static [EntryType] {
        EntryType::SUPPORTED
    }

    /// Start or update observation.
    ///
    /// The first call fixes whether the observer takes a list of entry types
    /// or a single type, later calls must use the same form. Unsupported
    /// types are ignored, if none is left the observer is disconnected.
    pub fn observe(&self, options: ObserveOptions) -> Result<(), TimelineError> {
        let supports_gc = self.timeline.inner.supports_gc();
        let parse = |s: &str| {
            s.parse::<EntryType>()
                .ok()
                .filter(|t| *t != EntryType::Gc || supports_gc)
        };
        let (mode, entry_types, buffered) = match &options {
            ObserveOptions::EntryTypes(list) => (
                ObserveMode::Multiple,
                list.iter().filter_map(|s| parse(s)).collect::<BTreeSet<_>>(),
                None,
            ),
            ObserveOptions::Type {
                entry_type,
                buffered,
            } => {
                let t = parse(entry_type);
                (
                    ObserveMode::Single,
                    t.into_iter().collect(),
                    t.filter(|_| *buffered),
                )
            }
        };

        let (was_gc, is_gc) = {
            let mut state = self.shared.state.lock().unwrap();
            if state.mode != ObserveMode::Undefined && state.mode != mode {
                return Err(TimelineError::InvalidModification);
            }
            if entry_types.is_empty() {
                drop(state);
                self.disconnect();
                return Ok(());
            }
            let was_gc = state.entry_types.contains(&EntryType::Gc);
            state.mode = mode;
            state.entry_types = entry_types;
            (was_gc, state.entry_types.contains(&EntryType::Gc))
        };

        match (was_gc, is_gc) {
            (false, true) => self.timeline.inner.gc_retain(),
            (true, false) => self.timeline.inner.gc_release(),
            _ => {}
        }
        self.timeline.inner.register(&self.shared, buffered);
        Ok(())
    }

    /// Take the entries queued for this observer and not dispatched yet.
    pub fn take_records(&self) -> Vec<Arc<PerformanceEntry>> {
        self.shared.take_records()
    }

    /// Stop observing, queued entries are discarded.
    pub fn disconnect(&self) {
        self.timeline.inner.unregister(self.shared.id);
        let was_gc = {
            let mut state = self.shared.state.lock().unwrap();
            let was_gc = state.entry_types.contains(&EntryType::Gc);
            state.entry_types.clear();
            state.buffer.clear();
            state.mode = ObserveMode::Undefined;
            was_gc
        };
        if was_gc {
            self.timeline.inner.gc_release();
        }
    }

    pub fn observed_types(&self) -> Vec<EntryType> {
        let state = self.shared.state.lock().unwrap();
        state.entry_types.iter().copied().collect()
    }
}

impl Drop for PerformanceObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}
