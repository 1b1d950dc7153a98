//! # Live Mirror
//!
//! A live, one-directional mirror from a remote document database into a
//! reactive state store. One call keeps a state slot synchronized with a
//! document, a collection, or a filtered query.
//!
//! ## Core Concepts
//!
//! - **Store**: a reactive state container with typed slots and an atomic
//!   patch primitive
//! - **Remote**: an in-memory document database with live listeners
//! - **Sync**: the plugin that binds the two - `sync(key, target)` returns a
//!   cancellation handle owned entirely by the caller
//!
//! ## Example
//!
//! ```ignore
//! use live_mirror::{RemoteDb, StateStore, SyncPlugin};
//!
//! let db = RemoteDb::new();
//! let plugin = SyncPlugin::new(db.clone());
//! let app = plugin.install(StateStore::new("app", AppState::default()));
//!
//! // Mirror one document into a slot
//! let doc = db.collection("animals")?.doc("wombat")?;
//! let handle = app.sync(AppKey::DocData, doc)?;
//!
//! // Mirror a filtered result set into another
//! let query = db.collection("animals")?.query()
//!     .with_filter(Filter::eq("kind", json!("marsupial")));
//! app.sync(AppKey::Marsupials, query)?;
//!
//! handle.cancel();
//! ```

pub mod error;
pub mod remote;
pub mod store;
pub mod sync;
pub mod types;

// Re-exports
pub use error::{Result, SyncError};
pub use remote::{
    CancelHandle, CollectionRef, DocumentRef, DocumentSnapshot, Filter, FilterOp, QueryRef,
    QuerySnapshot, RemoteDb,
};
pub use store::{
    DropReason, SlotWatcher, StateShape, StateStore, WatchEvent, WatcherId, DEFAULT_WATCH_BUFFER,
};
pub use sync::{SyncPlugin, SyncTarget, SyncedStore};
pub use types::{from_field_map, to_field_map, FieldMap, ListenerId, SlotValue, StoreId, Timestamp};
