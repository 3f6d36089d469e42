/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::{EventRelay, GcEntry, GcEntryConsumer, RelayError};

type ConsumerMap = BTreeMap<u64, Box<dyn GcEntryConsumer>>;

// a panicking consumer leaves the map itself intact
fn lock_consumers(consumers: &Mutex<ConsumerMap>) -> MutexGuard<'_, ConsumerMap> {
    consumers.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registration of one consumer with [`GcTracking`].
#[derive(Debug, PartialEq, Eq)]
pub struct GcTrackingHandle {
    id: u64,
}

/// Shares one [`EventRelay`] between any number of consumers.
///
/// The relay is enabled when the first consumer registers and disabled when
/// the last one leaves. Every entry is passed to all registered consumers in
/// registration order.
///
/// The relay must not be enabled by anything else while it is shared here.
pub struct GcTracking {
    relay: Arc<EventRelay>,
    consumers: Arc<Mutex<ConsumerMap>>,
    // serializes enable / disable, never taken on the delivery path
    ops: Mutex<()>,
    next_id: AtomicU64,
}

impl GcTracking {
    pub fn new(relay: Arc<EventRelay>) -> Self {
        GcTracking {
            relay,
            consumers: Arc::new(Mutex::new(BTreeMap::new())),
            ops: Mutex::new(()),
            next_id: AtomicU64::new(0),
        }
    }

    /// The relay whose hooks should be wired into the collector.
    #[inline]
    pub fn relay(&self) -> &Arc<EventRelay> {
        &self.relay
    }

    /// Register a consumer, the first one enables the relay.
    ///
    /// Fails without registering if the relay has been enabled by someone
    /// else.
    pub fn enable<C>(&self, consumer: C) -> Result<GcTrackingHandle, RelayError>
    where
        C: GcEntryConsumer,
    {
        let _ops = self.ops.lock().unwrap_or_else(PoisonError::into_inner);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let first = {
            let mut consumers = lock_consumers(&self.consumers);
            consumers.insert(id, Box::new(consumer));
            consumers.len() == 1
        };
        if first {
            let consumers = Arc::clone(&self.consumers);
            let armed = self.relay.enable(move |entry: GcEntry| {
                let mut consumers = lock_consumers(&consumers);
                for c in consumers.values_mut() {
                    c.consume(entry);
                }
            });
            if !armed {
                lock_consumers(&self.consumers).remove(&id);
                warn!("gc tracking not started, the relay is enabled elsewhere");
                return Err(RelayError::AlreadyEnabled);
            }
            debug!("gc tracking started");
        }
        Ok(GcTrackingHandle { id })
    }

    /// Unregister a consumer, returns false if it was already gone.
    ///
    /// Must not be called from inside a consumer.
    pub fn disable(&self, handle: GcTrackingHandle) -> bool {
        let _ops = self.ops.lock().unwrap_or_else(PoisonError::into_inner);
        let (found, last) = {
            let mut consumers = lock_consumers(&self.consumers);
            let found = consumers.remove(&handle.id).is_some();
            (found, consumers.is_empty())
        };
        if found && last {
            self.relay.disable();
            debug!("gc tracking stopped");
        }
        found
    }

    pub fn consumer_count(&self) -> usize {
        lock_consumers(&self.consumers).len()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.relay.is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perf_runtime::ManualClock;
    use std::time::Duration;

    #[tokio::test]
    async fn ref_counted() {
        let relay = Arc::new(EventRelay::new(Arc::new(ManualClock::new(0)), None));
        let tracking = GcTracking::new(relay);
        assert!(!tracking.is_active());

        let h1 = tracking.enable(|_: GcEntry| {}).unwrap();
        let h2 = tracking.enable(|_: GcEntry| {}).unwrap();
        assert!(tracking.is_active());
        assert_eq!(tracking.consumer_count(), 2);

        assert!(tracking.disable(h1));
        assert!(tracking.is_active());
        assert!(tracking.disable(h2));
        assert!(!tracking.is_active());
        assert_eq!(tracking.consumer_count(), 0);

        assert!(!tracking.disable(GcTrackingHandle { id: 0 }));
    }

    #[tokio::test]
    async fn fan_out() {
        let relay = Arc::new(EventRelay::new(Arc::new(ManualClock::new(0)), None));
        let tracking = GcTracking::new(Arc::clone(&relay));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s1 = Arc::clone(&seen);
        let s2 = Arc::clone(&seen);
        let _h1 = tracking
            .enable(move |e: GcEntry| s1.lock().unwrap().push((1, e.duration)))
            .unwrap();
        let _h2 = tracking
            .enable(move |e: GcEntry| s2.lock().unwrap().push((2, e.duration)))
            .unwrap();

        relay.on_gc_start(crate::GcKind::Generational, 10).unwrap();
        relay.on_gc_end(crate::GcKind::Generational, 30).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(seen.lock().unwrap().as_slice(), &[(1, 20), (2, 20)]);
    }

    #[tokio::test]
    async fn relay_taken_elsewhere() {
        let relay = Arc::new(EventRelay::new(Arc::new(ManualClock::new(0)), None));
        assert!(relay.enable(|_: GcEntry| {}));
        let tracking = GcTracking::new(Arc::clone(&relay));

        assert_eq!(
            tracking.enable(|_: GcEntry| {}),
            Err(RelayError::AlreadyEnabled)
        );
        assert_eq!(tracking.consumer_count(), 0);

        // usable once the other user lets go
        assert!(relay.disable());
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let handle = tracking
            .enable(move |_: GcEntry| *sink.lock().unwrap() += 1)
            .unwrap();
        relay.on_gc_start(crate::GcKind::MarkCompact, 1).unwrap();
        relay.on_gc_end(crate::GcKind::MarkCompact, 2).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(*seen.lock().unwrap(), 1);
        assert!(tracking.disable(handle));
    }

    #[tokio::test]
    async fn consumer_panic() {
        let relay = Arc::new(EventRelay::new(Arc::new(ManualClock::new(0)), None));
        let tracking = GcTracking::new(Arc::clone(&relay));
        let h1 = tracking
            .enable(|e: GcEntry| {
                if e.duration > 0 {
                    panic!("consumer failure");
                }
            })
            .unwrap();
        relay.on_gc_start(crate::GcKind::Generational, 1).unwrap();
        relay.on_gc_end(crate::GcKind::Generational, 2).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(tracking.consumer_count(), 1);
        assert!(tracking.disable(h1));
        assert!(!tracking.is_active());

        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let h2 = tracking
            .enable(move |_: GcEntry| *sink.lock().unwrap() += 1)
            .unwrap();
        relay.on_gc_start(crate::GcKind::Generational, 3).unwrap();
        relay.on_gc_end(crate::GcKind::Generational, 4).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(*seen.lock().unwrap(), 1);
        assert!(tracking.disable(h2));
    }
}
