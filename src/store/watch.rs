//! Slot watchers: channel-based observation of store mutations.

use crate::types::SlotValue;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default buffered events per watcher before it is dropped.
pub const DEFAULT_WATCH_BUFFER: usize = 1024;

/// Unique identifier for a watcher.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(pub u64);

impl fmt::Debug for WatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WatcherId({})", self.0)
    }
}

/// Events delivered to a slot watcher.
#[derive(Clone, Debug)]
pub enum WatchEvent<K> {
    /// The watched slot received a new value.
    Update { key: K, value: SlotValue },

    /// The watcher was removed and will receive nothing further.
    Dropped { reason: DropReason },
}

/// Why a watcher was removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unwatched.
    Unwatched,
}

/// Receiving side of a slot watch.
pub struct SlotWatcher<K> {
    pub id: WatcherId,
    receiver: Receiver<WatchEvent<K>>,
}

impl<K> SlotWatcher<K> {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<WatchEvent<K>, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<WatchEvent<K>, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<WatchEvent<K>, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

struct Watcher<K> {
    key: K,
    sender: Sender<WatchEvent<K>>,
}

impl<K> Watcher<K> {
    fn try_send(&self, event: WatchEvent<K>) -> bool {
        self.sender.try_send(event).is_ok()
    }
}

/// Registry of slot watchers. Slow watchers are dropped, not blocked on.
pub(crate) struct WatcherRegistry<K> {
    watchers: RwLock<HashMap<WatcherId, Watcher<K>>>,
    next_id: AtomicU64,
}

impl<K: Copy + Eq> WatcherRegistry<K> {
    pub(crate) fn new() -> Self {
        Self {
            watchers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn watch(&self, key: K, buffer: usize) -> SlotWatcher<K> {
        let id = WatcherId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(buffer);

        self.watchers.write().insert(id, Watcher { key, sender });

        SlotWatcher { id, receiver }
    }

    pub(crate) fn unwatch(&self, id: WatcherId) {
        let mut watchers = self.watchers.write();
        if let Some(watcher) = watchers.remove(&id) {
            // Best effort
            let _ = watcher.try_send(WatchEvent::Dropped {
                reason: DropReason::Unwatched,
            });
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.watchers.read().len()
    }

    /// Deliver a slot update to every watcher of that key. Watchers whose
    /// buffer is full are removed.
    pub(crate) fn notify(&self, key: K, value: &SlotValue) {
        let mut to_remove = Vec::new();

        {
            let watchers = self.watchers.read();
            for (id, watcher) in watchers.iter() {
                if watcher.key == key {
                    let event = WatchEvent::Update {
                        key,
                        value: value.clone(),
                    };
                    if !watcher.try_send(event) {
                        to_remove.push(*id);
                    }
                }
            }
        }

        if !to_remove.is_empty() {
            let mut watchers = self.watchers.write();
            for id in to_remove {
                if let Some(watcher) = watchers.remove(&id) {
                    let _ = watcher.try_send(WatchEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}
