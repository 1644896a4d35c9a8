//! Domain layer: entities, value objects and the interfaces the use cases
//! depend on.

pub mod entity;
pub mod error;
pub mod publisher;
pub mod repository;
pub mod value_object;

pub use entity::{ChatEvent, EventKind, Room, RoomSnapshot, RoomSummary, SessionContext};
pub use error::{PublishError, RoomStoreError, ValueObjectError};
pub use publisher::{MessagePublisher, Payload, Topic};
#[cfg(test)]
pub use publisher::MockMessagePublisher;
pub use repository::{ConnectionContextStore, RoomStore, SessionTracker};
pub use value_object::{ConnectionId, PUBLIC_ROOM_ID, Password, RoomId, Timestamp, Username};
