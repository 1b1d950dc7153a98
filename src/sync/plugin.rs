//! The sync plugin: installer, target dispatch, and the `sync` call.

use crate::error::Result;
use crate::remote::{CancelHandle, CollectionRef, DocumentRef, QueryRef, RemoteDb};
use crate::store::{StateShape, StateStore};

use super::writer;

/// What a slot mirrors: the caller states the reference kind explicitly, so
/// dispatch never inspects an opaque reference at runtime.
#[derive(Clone, Debug)]
pub enum SyncTarget {
    /// One document; the slot mirrors its field map.
    Document(DocumentRef),

    /// A whole collection; the slot mirrors the ordered result set.
    Collection(CollectionRef),

    /// A filtered query; the slot mirrors the ordered result set.
    Query(QueryRef),
}

impl From<DocumentRef> for SyncTarget {
    fn from(doc: DocumentRef) -> Self {
        SyncTarget::Document(doc)
    }
}

impl From<CollectionRef> for SyncTarget {
    fn from(collection: CollectionRef) -> Self {
        SyncTarget::Collection(collection)
    }
}

impl From<QueryRef> for SyncTarget {
    fn from(query: QueryRef) -> Self {
        SyncTarget::Query(query)
    }
}

/// Installs the `sync` capability over store instances.
///
/// The plugin holds only the remote database handle. Installation composes a
/// [`SyncedStore`] decorator over the store instance; nothing on the store
/// itself is mutated, and the plugin keeps no registry of the subscriptions
/// it creates.
#[derive(Clone)]
pub struct SyncPlugin {
    db: RemoteDb,
}

impl SyncPlugin {
    pub fn new(db: RemoteDb) -> Self {
        Self { db }
    }

    /// Wrap a store instance with the `sync` capability.
    pub fn install<S: StateShape>(&self, store: StateStore<S>) -> SyncedStore<S> {
        tracing::debug!(store = store.name(), id = %store.id(), "sync installed");
        SyncedStore {
            store,
            db: self.db.clone(),
        }
    }
}

/// A store instance with the `sync` capability composed over it.
pub struct SyncedStore<S: StateShape> {
    store: StateStore<S>,
    db: RemoteDb,
}

impl<S: StateShape> Clone for SyncedStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            db: self.db.clone(),
        }
    }
}

impl<S: StateShape> SyncedStore<S> {
    /// The wrapped store instance.
    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    /// Keep a state slot mirrored to a remote target in real time.
    ///
    /// Subscribes to the target and returns the subscription's cancellation
    /// handle. The current remote value is delivered immediately, then one
    /// delivery per remote change, each applied to the slot as a single
    /// atomic patch:
    ///
    /// - Document target: the slot becomes the document's field map. A
    ///   delivery for a nonexistent document (including a remote deletion)
    ///   leaves the slot at its previous value; callers that want
    ///   clear-on-delete must observe deletions through
    ///   [`RemoteDb::listen_document`] themselves.
    /// - Collection/query target: the slot becomes the ordered sequence of
    ///   field maps in the result set, replaced wholesale on every delivery.
    ///
    /// Ownership of the handle transfers to the caller: the plugin keeps no
    /// registry, dropping the handle does not cancel, and only
    /// [`CancelHandle::cancel`] stops deliveries. Several syncs may target
    /// the same slot; the last delivery to arrive wins.
    ///
    /// # Errors
    ///
    /// Fails only if the subscription cannot be established (for example the
    /// remote database is closed). Delivery-path failures are not
    /// intercepted, retried, or logged here.
    pub fn sync(&self, key: S::Key, target: impl Into<SyncTarget>) -> Result<CancelHandle> {
        match target.into() {
            SyncTarget::Document(doc) => {
                tracing::debug!(
                    store = self.store.name(),
                    key = ?key,
                    path = %doc.path(),
                    "sync established (document)"
                );
                let store = self.store.clone();
                self.db.listen_document(&doc, move |snapshot| {
                    writer::apply_document(&store, key, &snapshot);
                })
            }
            SyncTarget::Collection(collection) => self.sync_query(key, collection.query()),
            SyncTarget::Query(query) => self.sync_query(key, query),
        }
    }

    fn sync_query(&self, key: S::Key, query: QueryRef) -> Result<CancelHandle> {
        tracing::debug!(
            store = self.store.name(),
            key = ?key,
            collection = query.collection_name(),
            "sync established (result set)"
        );
        let store = self.store.clone();
        self.db.listen_query(&query, move |snapshot| {
            writer::apply_query(&store, key, &snapshot);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SlotValue;

    #[derive(Default)]
    struct TestState {
        slot: SlotValue,
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum TestKey {
        Slot,
    }

    impl StateShape for TestState {
        type Key = TestKey;

        fn slot(&self, _key: TestKey) -> &SlotValue {
            &self.slot
        }

        fn slot_mut(&mut self, _key: TestKey) -> &mut SlotValue {
            &mut self.slot
        }
    }

    #[test]
    fn test_target_from_refs() {
        let db = RemoteDb::new();
        let animals = db.collection("animals").unwrap();

        assert!(matches!(
            SyncTarget::from(animals.doc("wombat").unwrap()),
            SyncTarget::Document(_)
        ));
        assert!(matches!(
            SyncTarget::from(animals.clone()),
            SyncTarget::Collection(_)
        ));
        assert!(matches!(
            SyncTarget::from(animals.query()),
            SyncTarget::Query(_)
        ));
    }

    #[test]
    fn test_install_leaves_store_usable() {
        let db = RemoteDb::new();
        let store = StateStore::new("app", TestState::default());
        let synced = SyncPlugin::new(db).install(store.clone());

        // Decorator and original address the same state
        synced
            .store()
            .set_slot(TestKey::Slot, SlotValue::Documents(vec![]));
        assert!(store.get(TestKey::Slot).as_documents().is_some());
    }

    #[test]
    fn test_sync_on_closed_database_fails() {
        let db = RemoteDb::new();
        let doc = db.collection("animals").unwrap().doc("wombat").unwrap();
        db.close();

        let synced = SyncPlugin::new(db).install(StateStore::new("app", TestState::default()));
        assert!(synced.sync(TestKey::Slot, doc).is_err());
    }
}
