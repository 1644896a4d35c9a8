//! Store implementations
//!
//! - `inmemory`: process-scoped in-memory stores

pub mod inmemory;

pub use inmemory::{InMemoryConnectionContextStore, InMemoryRoomStore, InMemorySessionTracker};
