//! In-memory store implementations.

mod connection_context;
mod room;
mod session;

pub use connection_context::InMemoryConnectionContextStore;
pub use room::InMemoryRoomStore;
pub use session::InMemorySessionTracker;
