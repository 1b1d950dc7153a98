//! In-memory remote document database with live listeners.

use crate::error::{Result, SyncError};
use crate::types::FieldMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::listeners::{
    CancelHandle, DocumentSnapshot, Listener, ListenerRegistry, QuerySnapshot,
};
use super::reference::{CollectionRef, DocumentRef, QueryRef};

/// Documents keyed by id; iteration order is id order, which is also the
/// result-set order queries deliver in.
type Collection = BTreeMap<String, FieldMap>;

struct DbInner {
    collections: RwLock<BTreeMap<String, Collection>>,
    listeners: Arc<ListenerRegistry>,
    closed: AtomicBool,
}

/// Handle to the remote document database.
///
/// Cheap to clone; all clones share the same data and listener registry.
/// The write path (`set`/`merge`/`delete`) plays the role of the remote
/// producer: every change triggers one delivery to each affected listener.
#[derive(Clone)]
pub struct RemoteDb {
    inner: Arc<DbInner>,
}

impl RemoteDb {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DbInner {
                collections: RwLock::new(BTreeMap::new()),
                listeners: Arc::new(ListenerRegistry::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Reference a collection by name.
    pub fn collection(&self, name: &str) -> Result<CollectionRef> {
        CollectionRef::new(name)
    }

    /// Close the database: drops every listener and fails later operations.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.listeners.clear();
        tracing::debug!("remote database closed");
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            Err(SyncError::DatabaseClosed)
        } else {
            Ok(())
        }
    }

    // --- Write Path ---

    /// Create or fully replace a document.
    pub fn set(&self, doc: &DocumentRef, fields: FieldMap) -> Result<()> {
        self.ensure_open()?;

        let old = {
            let mut collections = self.inner.collections.write();
            collections
                .entry(doc.collection_name().to_string())
                .or_default()
                .insert(doc.id().to_string(), fields.clone())
        };

        self.notify(doc, old.as_ref(), Some(&fields));
        Ok(())
    }

    /// Merge fields into a document, creating it if missing.
    pub fn merge(&self, doc: &DocumentRef, fields: FieldMap) -> Result<()> {
        self.ensure_open()?;

        let (old, merged) = {
            let mut collections = self.inner.collections.write();
            let collection = collections
                .entry(doc.collection_name().to_string())
                .or_default();

            let old = collection.get(doc.id()).cloned();
            let mut merged = old.clone().unwrap_or_default();
            for (name, value) in fields {
                merged.insert(name, value);
            }
            collection.insert(doc.id().to_string(), merged.clone());
            (old, merged)
        };

        self.notify(doc, old.as_ref(), Some(&merged));
        Ok(())
    }

    /// Delete a document. Deleting a missing document is a no-op.
    pub fn delete(&self, doc: &DocumentRef) -> Result<()> {
        self.ensure_open()?;

        let old = {
            let mut collections = self.inner.collections.write();
            collections
                .get_mut(doc.collection_name())
                .and_then(|c| c.remove(doc.id()))
        };

        if let Some(old) = old {
            self.notify(doc, Some(&old), None);
        }
        Ok(())
    }

    // --- Read Path ---

    /// Current snapshot of a document.
    pub fn get(&self, doc: &DocumentRef) -> Result<DocumentSnapshot> {
        self.ensure_open()?;
        Ok(self.snapshot_document(doc))
    }

    /// Current snapshot of a query's result set.
    pub fn run_query(&self, query: &QueryRef) -> Result<QuerySnapshot> {
        self.ensure_open()?;
        Ok(self.snapshot_query(query))
    }

    // --- Listeners ---

    /// Subscribe to live updates of a single document.
    ///
    /// The current snapshot is delivered immediately, then one delivery per
    /// subsequent change to the document.
    pub fn listen_document(
        &self,
        doc: &DocumentRef,
        callback: impl Fn(DocumentSnapshot) + Send + Sync + 'static,
    ) -> Result<CancelHandle> {
        self.ensure_open()?;

        let callback: Arc<dyn Fn(DocumentSnapshot) + Send + Sync> = Arc::new(callback);
        let id = self.inner.listeners.register(Listener::Document {
            doc: doc.clone(),
            callback: Arc::clone(&callback),
        });
        tracing::debug!(listener = id.0, path = %doc.path(), "document listener registered");

        // Initial delivery of the current value
        callback(self.snapshot_document(doc));

        Ok(CancelHandle::new(Arc::clone(&self.inner.listeners), id))
    }

    /// Subscribe to live updates of a query's result set.
    ///
    /// The current result set is delivered immediately, then once per change
    /// to any document that belongs (or belonged) to the result set.
    pub fn listen_query(
        &self,
        query: &QueryRef,
        callback: impl Fn(QuerySnapshot) + Send + Sync + 'static,
    ) -> Result<CancelHandle> {
        self.ensure_open()?;

        let callback: Arc<dyn Fn(QuerySnapshot) + Send + Sync> = Arc::new(callback);
        let id = self.inner.listeners.register(Listener::Query {
            query: query.clone(),
            callback: Arc::clone(&callback),
        });
        tracing::debug!(
            listener = id.0,
            collection = query.collection_name(),
            "query listener registered"
        );

        callback(self.snapshot_query(query));

        Ok(CancelHandle::new(Arc::clone(&self.inner.listeners), id))
    }

    // --- Snapshots and Delivery ---

    fn snapshot_document(&self, doc: &DocumentRef) -> DocumentSnapshot {
        let collections = self.inner.collections.read();
        let fields = collections
            .get(doc.collection_name())
            .and_then(|c| c.get(doc.id()).cloned());
        DocumentSnapshot::new(doc.clone(), fields)
    }

    fn snapshot_query(&self, query: &QueryRef) -> QuerySnapshot {
        let collections = self.inner.collections.read();
        let docs = match collections.get(query.collection_name()) {
            Some(collection) => collection
                .iter()
                .filter(|(_, fields)| query.matches(fields))
                .map(|(id, fields)| {
                    // Ids in a stored collection are non-empty by construction
                    let doc = CollectionRef::new(query.collection_name())
                        .and_then(|c| c.doc(id))
                        .expect("stored document reference is valid");
                    DocumentSnapshot::new(doc, Some(fields.clone()))
                })
                .collect(),
            None => Vec::new(),
        };
        QuerySnapshot::new(docs)
    }

    /// Deliver one update to every listener affected by a document change.
    ///
    /// Callbacks are cloned out of the registry and invoked with no lock
    /// held, so a callback cancelled mid-delivery may still fire once.
    fn notify(&self, doc: &DocumentRef, old: Option<&FieldMap>, new: Option<&FieldMap>) {
        let doc_callbacks = self.inner.listeners.document_callbacks(doc);
        if !doc_callbacks.is_empty() {
            let snapshot = self.snapshot_document(doc);
            tracing::trace!(
                path = %doc.path(),
                listeners = doc_callbacks.len(),
                exists = snapshot.exists(),
                "delivering document change"
            );
            for callback in doc_callbacks {
                callback(snapshot.clone());
            }
        }

        for (query, callback) in self.inner.listeners.query_callbacks(doc.collection_name()) {
            let was_member = old.map_or(false, |f| query.matches(f));
            let is_member = new.map_or(false, |f| query.matches(f));
            if !was_member && !is_member {
                continue;
            }

            let snapshot = self.snapshot_query(&query);
            tracing::trace!(
                collection = query.collection_name(),
                size = snapshot.len(),
                "delivering result-set change"
            );
            callback(snapshot);
        }
    }
}

impl Default for RemoteDb {
    fn default() -> Self {
        Self::new()
    }
}
