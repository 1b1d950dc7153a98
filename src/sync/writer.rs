//! State writer: normalizes remote deliveries into slot writes.

use crate::remote::{DocumentSnapshot, QuerySnapshot};
use crate::store::{StateShape, StateStore};
use crate::types::SlotValue;

/// Apply a document delivery to a slot.
///
/// A snapshot of a nonexistent document (never created, or deleted remotely)
/// applies no update: the slot keeps its previous value.
pub(crate) fn apply_document<S: StateShape>(
    store: &StateStore<S>,
    key: S::Key,
    snapshot: &DocumentSnapshot,
) {
    match snapshot.fields() {
        Some(fields) => {
            tracing::trace!(
                store = store.name(),
                key = ?key,
                path = %snapshot.reference().path(),
                "applying document delivery"
            );
            store.set_slot(key, SlotValue::Document(fields.clone()));
        }
        None => {
            tracing::trace!(
                store = store.name(),
                key = ?key,
                path = %snapshot.reference().path(),
                "document missing, slot unchanged"
            );
        }
    }
}

/// Apply a result-set delivery to a slot: a full replacement write.
pub(crate) fn apply_query<S: StateShape>(
    store: &StateStore<S>,
    key: S::Key,
    snapshot: &QuerySnapshot,
) {
    tracing::trace!(
        store = store.name(),
        key = ?key,
        size = snapshot.len(),
        "applying result-set delivery"
    );
    store.set_slot(key, SlotValue::Documents(snapshot.field_maps()));
}
