/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use log::{debug, trace};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use perf_runtime::MonotonicClock;

use crate::{GcEntry, GcEntryConsumer, GcKind, RelayError};

/// Maximum number of entries waiting for delivery.
pub const RELAY_QUEUE_CAPACITY: usize = 64;

const NO_START: u64 = u64::MAX;

type ConsumerSlot = Arc<Mutex<Option<Box<dyn GcEntryConsumer>>>>;

/// Moves GC start/end notifications out of the collector's context and
/// hands complete entries to a consumer on a runtime task.
///
/// The hook methods never block on the consumer and never allocate beyond
/// the fixed queue. When the queue is full the new entry is dropped and
/// counted.
///
/// `disable` must not be called from inside the consumer.
pub struct EventRelay {
    clock: Arc<dyn MonotonicClock>,
    handle: Option<Handle>,
    sender: RwLock<Option<mpsc::Sender<GcEntry>>>,
    // replaced on every enable, a stale delivery task only sees its own slot
    consumer: Mutex<Option<ConsumerSlot>>,
    task: Mutex<Option<JoinHandle<()>>>,
    mark_compact_start: AtomicU64,
    generational_start: AtomicU64,
    dropped: AtomicU64,
    unmatched: AtomicU64,
}

impl EventRelay {
    pub fn new(clock: Arc<dyn MonotonicClock>, handle: Option<Handle>) -> Self {
        EventRelay {
            clock,
            handle,
            sender: RwLock::new(None),
            consumer: Mutex::new(None),
            task: Mutex::new(None),
            mark_compact_start: AtomicU64::new(NO_START),
            generational_start: AtomicU64::new(NO_START),
            dropped: AtomicU64::new(0),
            unmatched: AtomicU64::new(0),
        }
    }

    fn start_slot(&self, kind: GcKind) -> &AtomicU64 {
        match kind {
            GcKind::MarkCompact => &self.mark_compact_start,
            GcKind::Generational => &self.generational_start,
        }
    }

    /// Register the consumer, start the delivery task and arm the hooks.
    ///
    /// Returns false if already enabled, the given consumer is dropped then.
    ///
    /// # Panics
    ///
    /// Panics if no runtime handle was given to [`EventRelay::new`] and this
    /// is called outside of a tokio runtime.
    pub fn enable<C>(&self, consumer: C) -> bool
    where
        C: GcEntryConsumer,
    {
        let mut sender_slot = self.sender.write().unwrap();
        if sender_slot.is_some() {
            return false;
        }

        let (sender, receiver) = mpsc::channel(RELAY_QUEUE_CAPACITY);
        let consumer: Box<dyn GcEntryConsumer> = Box::new(consumer);
        let slot: ConsumerSlot = Arc::new(Mutex::new(Some(consumer)));
        let handle = self.handle.clone().unwrap_or_else(Handle::current);
        let task = handle.spawn(deliver(receiver, Arc::clone(&slot)));
        *self.consumer.lock().unwrap_or_else(PoisonError::into_inner) = Some(slot);
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);

        self.mark_compact_start.store(NO_START, Ordering::Relaxed);
        self.generational_start.store(NO_START, Ordering::Relaxed);
        *sender_slot = Some(sender);
        debug!("gc event relay enabled");
        true
    }

    /// Disarm the hooks and unregister the consumer.
    ///
    /// Once this returns the consumer will not be called again, even for
    /// entries that were still queued. Returns false if not enabled.
    ///
    /// A consumer that panicked earlier does not make this panic.
    pub fn disable(&self) -> bool {
        // waits for hooks that are enqueueing right now
        let Some(sender) = self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return false;
        };
        drop(sender);

        let slot = self
            .consumer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        // waits for an in-flight delivery batch
        let consumer = slot.and_then(|slot| {
            slot.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
        });
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        drop(consumer);
        debug!("gc event relay disabled");
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.read().unwrap().is_some()
    }

    /// Record the start time of a collection of the given kind.
    ///
    /// A later start of the same kind before its end replaces this one.
    pub fn on_gc_start(&self, kind: GcKind, timestamp: u64) -> Result<(), RelayError> {
        let sender = self.sender.read().unwrap();
        if sender.is_none() {
            return Err(RelayError::Disarmed);
        }
        self.start_slot(kind).store(timestamp, Ordering::Release);
        Ok(())
    }

    /// Complete the pending collection of the given kind and queue its entry.
    pub fn on_gc_end(&self, kind: GcKind, timestamp: u64) -> Result<(), RelayError> {
        let sender = self.sender.read().unwrap();
        let Some(sender) = sender.as_ref() else {
            return Err(RelayError::Disarmed);
        };

        let start = self.start_slot(kind).swap(NO_START, Ordering::AcqRel);
        if start == NO_START {
            self.unmatched.fetch_add(1, Ordering::Relaxed);
            return Err(RelayError::UnmatchedEnd(kind));
        }

        let entry = GcEntry {
            kind,
            start_time: start,
            duration: timestamp.saturating_sub(start),
        };
        match sender.try_send(entry) {
            Ok(_) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("gc event relay queue full, {kind} entry dropped");
                Err(RelayError::ChannelFull)
            }
            // the delivery task is gone, only possible if the runtime shut down
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(RelayError::ChannelFull)
            }
        }
    }

    /// Start hook which reads the relay's own clock.
    pub fn before_collection(&self, kind: GcKind) -> Result<(), RelayError> {
        self.on_gc_start(kind, self.clock.now_ns())
    }

    /// End hook which reads the relay's own clock.
    pub fn after_collection(&self, kind: GcKind) -> Result<(), RelayError> {
        self.on_gc_end(kind, self.clock.now_ns())
    }

    /// Entries lost to a full queue.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// End notifications that had no pending start.
    pub fn unmatched(&self) -> u64 {
        self.unmatched.load(Ordering::Relaxed)
    }
}

impl Drop for EventRelay {
    fn drop(&mut self) {
        self.disable();
    }
}

async fn deliver(mut receiver: mpsc::Receiver<GcEntry>, consumer: ConsumerSlot) {
    let mut buf = Vec::with_capacity(RELAY_QUEUE_CAPACITY);
    loop {
        let n = receiver.recv_many(&mut buf, RELAY_QUEUE_CAPACITY).await;
        if n == 0 {
            break;
        }

        let mut guard = consumer.lock().unwrap();
        let Some(c) = guard.as_mut() else {
            break;
        };
        for entry in buf.drain(..) {
            c.consume(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perf_runtime::ManualClock;
    use std::time::Duration;

    fn collected() -> (Arc<Mutex<Vec<GcEntry>>>, impl FnMut(GcEntry) + Send + 'static) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&entries);
        (entries, move |e| sink.lock().unwrap().push(e))
    }

    #[tokio::test]
    async fn enable_twice() {
        let relay = EventRelay::new(Arc::new(ManualClock::new(0)), None);
        assert!(!relay.is_enabled());
        assert!(relay.enable(|_: GcEntry| {}));
        assert!(!relay.enable(|_: GcEntry| {}));
        assert!(relay.is_enabled());
        assert!(relay.disable());
        assert!(!relay.disable());
        assert!(!relay.is_enabled());
    }

    #[tokio::test]
    async fn own_clock() {
        let clock = Arc::new(ManualClock::new(1_000));
        let relay = EventRelay::new(clock.clone(), None);
        let (entries, consumer) = collected();
        relay.enable(consumer);

        relay.before_collection(GcKind::MarkCompact).unwrap();
        clock.advance(2_500);
        relay.after_collection(GcKind::MarkCompact).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        let entries = entries.lock().unwrap();
        assert_eq!(
            entries.as_slice(),
            &[GcEntry {
                kind: GcKind::MarkCompact,
                start_time: 1_000,
                duration: 2_500,
            }]
        );
    }

    #[tokio::test]
    async fn disarmed() {
        let relay = EventRelay::new(Arc::new(ManualClock::new(0)), None);
        assert_eq!(
            relay.on_gc_start(GcKind::Generational, 1),
            Err(RelayError::Disarmed)
        );
        assert_eq!(
            relay.on_gc_end(GcKind::Generational, 2),
            Err(RelayError::Disarmed)
        );
        assert_eq!(relay.unmatched(), 0);
    }
}
