//! Remote document database client: references, snapshots, live listeners.
//!
//! The database is in-memory and in-process. Its job here is to supply the
//! subscription primitive the mirror rides on:
//! - Typed references (document / collection / filtered query)
//! - `listen_document` / `listen_query` with an immediate initial delivery
//!   and one delivery per subsequent change
//! - Idempotent cancellation handles
//!
//! # Example
//!
//! ```ignore
//! let db = RemoteDb::new();
//! let animals = db.collection("animals")?;
//!
//! let handle = db.listen_query(&animals.query(), |snapshot| {
//!     println!("{} animals", snapshot.len());
//! })?;
//!
//! db.set(&animals.doc("wombat")?, fields)?;
//! handle.cancel();
//! ```

mod database;
mod listeners;
mod reference;

pub use database::RemoteDb;
pub use listeners::{CancelHandle, DocumentSnapshot, QuerySnapshot};
pub use reference::{CollectionRef, DocumentRef, Filter, FilterOp, QueryRef};
