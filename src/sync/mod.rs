//! The sync plugin: one call mirrors a state slot to a remote target.
//!
//! `sync(key, target)` subscribes to a document, collection, or filtered
//! query and keeps the named slot mirrored in real time, returning the
//! subscription's cancellation handle. The mirror is one-directional
//! (remote to local): no conflict resolution, no write-back, no retry.
//!
//! # Example
//!
//! ```ignore
//! let plugin = SyncPlugin::new(db.clone());
//! let app = plugin.install(StateStore::new("app", AppState::default()));
//!
//! let doc = db.collection("animals")?.doc("wombat")?;
//! let handle = app.sync(AppKey::DocData, doc)?;
//!
//! // ... remote changes flow into the slot ...
//!
//! handle.cancel();
//! ```

mod plugin;
mod writer;

pub use plugin::{SyncPlugin, SyncTarget, SyncedStore};
