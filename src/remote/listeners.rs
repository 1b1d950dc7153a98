//! Live listener registry and delivery snapshots.

use crate::types::{FieldMap, ListenerId, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::reference::{DocumentRef, QueryRef};

/// Point-in-time view of a single document.
///
/// `fields` is `None` when the document does not exist at delivery time.
#[derive(Clone, Debug)]
pub struct DocumentSnapshot {
    doc: DocumentRef,
    fields: Option<FieldMap>,
    read_time: Timestamp,
}

impl DocumentSnapshot {
    pub(crate) fn new(doc: DocumentRef, fields: Option<FieldMap>) -> Self {
        Self {
            doc,
            fields,
            read_time: Timestamp::now(),
        }
    }

    /// The reference this snapshot was taken from.
    pub fn reference(&self) -> &DocumentRef {
        &self.doc
    }

    /// Document id.
    pub fn id(&self) -> &str {
        self.doc.id()
    }

    /// Whether the document existed at delivery time.
    pub fn exists(&self) -> bool {
        self.fields.is_some()
    }

    /// The document's field map, if it exists.
    pub fn fields(&self) -> Option<&FieldMap> {
        self.fields.as_ref()
    }

    /// When this snapshot was taken.
    pub fn read_time(&self) -> Timestamp {
        self.read_time
    }
}

/// Point-in-time view of a query's result set, in result-set order.
#[derive(Clone, Debug)]
pub struct QuerySnapshot {
    docs: Vec<DocumentSnapshot>,
    read_time: Timestamp,
}

impl QuerySnapshot {
    pub(crate) fn new(docs: Vec<DocumentSnapshot>) -> Self {
        Self {
            docs,
            read_time: Timestamp::now(),
        }
    }

    /// When this snapshot was taken.
    pub fn read_time(&self) -> Timestamp {
        self.read_time
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// The matching documents, in result-set order.
    pub fn docs(&self) -> &[DocumentSnapshot] {
        &self.docs
    }

    /// Extract every document's field map, preserving order.
    pub fn field_maps(&self) -> Vec<FieldMap> {
        self.docs
            .iter()
            .filter_map(|d| d.fields().cloned())
            .collect()
    }
}

pub(crate) type DocumentCallback = Arc<dyn Fn(DocumentSnapshot) + Send + Sync>;
pub(crate) type QueryCallback = Arc<dyn Fn(QuerySnapshot) + Send + Sync>;

/// A registered listener: which shape it watches and where deliveries go.
pub(crate) enum Listener {
    Document {
        doc: DocumentRef,
        callback: DocumentCallback,
    },
    Query {
        query: QueryRef,
        callback: QueryCallback,
    },
}

/// Registry of live listeners.
///
/// Callbacks are cloned out under the read lock and invoked after it is
/// released, so a delivery extracted concurrently with cancellation may still
/// fire once.
pub(crate) struct ListenerRegistry {
    listeners: RwLock<HashMap<ListenerId, Listener>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn register(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().insert(id, listener);
        id
    }

    /// Remove a listener. Removing an already-removed id is a no-op.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        self.listeners.write().remove(&id).is_some()
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.listeners.read().contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub(crate) fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Collect document callbacks registered on this exact document.
    pub(crate) fn document_callbacks(&self, doc: &DocumentRef) -> Vec<DocumentCallback> {
        self.listeners
            .read()
            .values()
            .filter_map(|l| match l {
                Listener::Document { doc: d, callback } if d == doc => Some(Arc::clone(callback)),
                _ => None,
            })
            .collect()
    }

    /// Collect query callbacks registered on a collection, with their queries.
    pub(crate) fn query_callbacks(&self, collection: &str) -> Vec<(QueryRef, QueryCallback)> {
        self.listeners
            .read()
            .values()
            .filter_map(|l| match l {
                Listener::Query { query, callback } if query.collection_name() == collection => {
                    Some((query.clone(), Arc::clone(callback)))
                }
                _ => None,
            })
            .collect()
    }
}

/// Handle that terminates a live subscription.
///
/// Cancellation is idempotent: calling [`cancel`](CancelHandle::cancel) more
/// than once does nothing further. Dropping the handle does NOT cancel the
/// subscription - ownership of cancellation rests entirely with the caller.
#[derive(Clone)]
pub struct CancelHandle {
    registry: Arc<ListenerRegistry>,
    id: ListenerId,
}

impl CancelHandle {
    pub(crate) fn new(registry: Arc<ListenerRegistry>, id: ListenerId) -> Self {
        Self { registry, id }
    }

    /// Stop further deliveries for this subscription.
    pub fn cancel(&self) {
        if self.registry.remove(self.id) {
            tracing::debug!(listener = self.id.0, "subscription cancelled");
        }
    }

    /// Whether the subscription is still registered.
    pub fn is_active(&self) -> bool {
        self.registry.contains(self.id)
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CancelHandle({})", self.id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::CollectionRef;
    use parking_lot::Mutex;

    fn doc_ref(id: &str) -> DocumentRef {
        CollectionRef::new("animals").unwrap().doc(id).unwrap()
    }

    #[test]
    fn test_register_and_remove() {
        let registry = ListenerRegistry::new();

        let id = registry.register(Listener::Document {
            doc: doc_ref("wombat"),
            callback: Arc::new(|_| {}),
        });
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(id));

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let registry = Arc::new(ListenerRegistry::new());
        let id = registry.register(Listener::Document {
            doc: doc_ref("wombat"),
            callback: Arc::new(|_| {}),
        });

        let handle = CancelHandle::new(Arc::clone(&registry), id);
        assert!(handle.is_active());

        handle.cancel();
        assert!(!handle.is_active());

        // Second cancel is a no-op, not an error
        handle.cancel();
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_callbacks_filtered_by_target() {
        let registry = ListenerRegistry::new();
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&delivered);
        registry.register(Listener::Document {
            doc: doc_ref("wombat"),
            callback: Arc::new(move |s: DocumentSnapshot| sink.lock().push(s.id().to_string())),
        });

        assert_eq!(registry.document_callbacks(&doc_ref("wombat")).len(), 1);
        assert!(registry.document_callbacks(&doc_ref("quokka")).is_empty());

        registry.register(Listener::Query {
            query: CollectionRef::new("animals").unwrap().query(),
            callback: Arc::new(|_| {}),
        });
        assert_eq!(registry.query_callbacks("animals").len(), 1);
        assert!(registry.query_callbacks("plants").is_empty());
    }

    #[test]
    fn test_query_snapshot_field_maps_preserve_order() {
        let docs = vec![
            DocumentSnapshot::new(doc_ref("a"), Some(FieldMap::new())),
            DocumentSnapshot::new(doc_ref("b"), Some(FieldMap::new())),
        ];
        let snapshot = QuerySnapshot::new(docs);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.field_maps().len(), 2);
    }
}
