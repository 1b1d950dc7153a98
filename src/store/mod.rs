//! Reactive state store: typed slots, atomic patches, slot watchers.

mod state;
mod watch;

pub use state::{StateShape, StateStore};
pub use watch::{
    DropReason, SlotWatcher, WatchEvent, WatcherId, DEFAULT_WATCH_BUFFER,
};
