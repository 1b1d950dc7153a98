//! Reactive state store with typed slots.

use crate::types::{SlotValue, StoreId};
use parking_lot::RwLock;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use super::watch::{SlotWatcher, WatcherId, WatcherRegistry, DEFAULT_WATCH_BUFFER};

/// Shape of a store's state: a struct of named slots addressed by a typed key.
///
/// `Key` is normally a small `Copy` enum, one variant per slot, so only valid
/// slot names compile. There is no string-keyed access and therefore no way
/// to conjure a new slot with a typo.
///
/// ```ignore
/// #[derive(Default)]
/// struct AppState {
///     doc_data: SlotValue,
///     items: SlotValue,
/// }
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum AppKey {
///     DocData,
///     Items,
/// }
///
/// impl StateShape for AppState {
///     type Key = AppKey;
///
///     fn slot(&self, key: AppKey) -> &SlotValue {
///         match key {
///             AppKey::DocData => &self.doc_data,
///             AppKey::Items => &self.items,
///         }
///     }
///
///     fn slot_mut(&mut self, key: AppKey) -> &mut SlotValue {
///         match key {
///             AppKey::DocData => &mut self.doc_data,
///             AppKey::Items => &mut self.items,
///         }
///     }
/// }
/// ```
pub trait StateShape: Send + Sync + 'static {
    /// Typed slot name.
    type Key: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Borrow a slot.
    fn slot(&self, key: Self::Key) -> &SlotValue;

    /// Mutably borrow a slot.
    fn slot_mut(&mut self, key: Self::Key) -> &mut SlotValue;
}

struct StoreInner<S: StateShape> {
    id: StoreId,
    name: String,
    state: RwLock<S>,
    watchers: WatcherRegistry<S::Key>,
}

/// A store instance: named state container plus the mutation primitive.
///
/// Cheap to clone; all clones address the same state. Mutations go through
/// [`patch`](StateStore::patch), a single lock acquisition, so concurrent
/// readers never observe a partial write.
pub struct StateStore<S: StateShape> {
    inner: Arc<StoreInner<S>>,
}

impl<S: StateShape> Clone for StateStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: StateShape> StateStore<S> {
    /// Create a store with the given name and initial state.
    pub fn new(name: impl Into<String>, initial: S) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                id: StoreId::next(),
                name: name.into(),
                state: RwLock::new(initial),
                watchers: WatcherRegistry::new(),
            }),
        }
    }

    /// Opaque store identity.
    pub fn id(&self) -> StoreId {
        self.inner.id
    }

    /// Human-readable store name (used in logs).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Apply one atomic mutation to the state.
    ///
    /// Arbitrary mutations do not notify watchers - the store cannot know
    /// which slots a closure touched. Use [`set_slot`](StateStore::set_slot)
    /// for observed writes.
    pub fn patch(&self, mutate: impl FnOnce(&mut S)) {
        let mut state = self.inner.state.write();
        mutate(&mut state);
    }

    /// Write one slot atomically and notify its watchers.
    pub fn set_slot(&self, key: S::Key, value: SlotValue) {
        {
            let mut state = self.inner.state.write();
            *state.slot_mut(key) = value.clone();
        }
        self.inner.watchers.notify(key, &value);
    }

    /// Clone the current value of a slot.
    pub fn get(&self, key: S::Key) -> SlotValue {
        self.inner.state.read().slot(key).clone()
    }

    /// Read from the state without cloning.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.read())
    }

    /// Watch a slot: every [`set_slot`](StateStore::set_slot) on that key
    /// delivers an update. Slow watchers are dropped.
    pub fn watch(&self, key: S::Key) -> SlotWatcher<S::Key> {
        self.watch_bounded(key, DEFAULT_WATCH_BUFFER)
    }

    /// Watch a slot with a custom buffer size.
    pub fn watch_bounded(&self, key: S::Key, buffer: usize) -> SlotWatcher<S::Key> {
        self.inner.watchers.watch(key, buffer)
    }

    /// Remove a watcher explicitly.
    pub fn unwatch(&self, id: WatcherId) {
        self.inner.watchers.unwatch(id);
    }

    /// Number of live watchers.
    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.len()
    }
}
