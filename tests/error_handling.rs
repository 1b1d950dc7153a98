//! Error handling and edge case tests.

use live_mirror::{
    to_field_map, CollectionRef, FieldMap, RemoteDb, SlotValue, StateShape, StateStore,
    SyncError, SyncPlugin,
};
use serde_json::json;

#[derive(Default)]
struct OneSlot {
    slot: SlotValue,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum OneKey {
    Slot,
}

impl StateShape for OneSlot {
    type Key = OneKey;

    fn slot(&self, _key: OneKey) -> &SlotValue {
        &self.slot
    }

    fn slot_mut(&mut self, _key: OneKey) -> &mut SlotValue {
        &mut self.slot
    }
}

// --- Reference Validation ---

#[test]
fn test_empty_collection_name_rejected() {
    let db = RemoteDb::new();
    let result = db.collection("");
    assert!(matches!(result, Err(SyncError::InvalidReference(_))));
}

#[test]
fn test_empty_document_id_rejected() {
    let result = CollectionRef::new("animals").unwrap().doc("");
    assert!(matches!(result, Err(SyncError::InvalidReference(_))));
}

// --- Establishment Failures ---

#[test]
fn test_sync_after_close_fails_with_database_closed() {
    let db = RemoteDb::new();
    let doc = db.collection("animals").unwrap().doc("wombat").unwrap();

    let app = SyncPlugin::new(db.clone()).install(StateStore::new("app", OneSlot::default()));
    db.close();

    let result = app.sync(OneKey::Slot, doc);
    assert!(matches!(result, Err(SyncError::DatabaseClosed)));

    // Nothing was written to the slot
    assert!(app.store().get(OneKey::Slot).is_empty());
}

#[test]
fn test_close_drops_live_subscriptions() {
    let db = RemoteDb::new();
    let doc = db.collection("animals").unwrap().doc("wombat").unwrap();

    let app = SyncPlugin::new(db.clone()).install(StateStore::new("app", OneSlot::default()));
    let handle = app.sync(OneKey::Slot, doc).unwrap();
    assert!(handle.is_active());

    db.close();
    assert!(!handle.is_active());

    // Cancelling an already-dropped subscription is still a no-op
    handle.cancel();
}

// --- Missing Remote Data ---

#[test]
fn test_sync_to_absent_collection_succeeds() {
    let db = RemoteDb::new();
    let app = SyncPlugin::new(db.clone()).install(StateStore::new("app", OneSlot::default()));

    // The collection has never been written to
    let nothing = db.collection("nothing").unwrap();
    app.sync(OneKey::Slot, nothing).unwrap();

    let slot = app.store().get(OneKey::Slot);
    assert_eq!(slot.as_documents().unwrap().len(), 0);
}

// --- Typed Slot Access ---

#[test]
fn test_typed_access_on_wrong_slot_shape() {
    let db = RemoteDb::new();
    let app = SyncPlugin::new(db.clone()).install(StateStore::new("app", OneSlot::default()));
    let doc = db.collection("animals").unwrap().doc("wombat").unwrap();

    db.set(&doc, to_field_map(&json!({"name": "wombat"})).unwrap())
        .unwrap();
    app.sync(OneKey::Slot, doc).unwrap();

    // Slot mirrors a document; asking for a result set is a shape error
    let result: Result<Vec<FieldMap>, _> = app.store().get(OneKey::Slot).to_documents();
    assert!(matches!(result, Err(SyncError::Deserialization(_))));
}
