//! UseCase layer
//!
//! - `presence`: create / join / leave / disconnect（PresenceCoordinator）
//! - `send_message`: chat message routing（MessageRouter）

pub mod error;
pub mod presence;
pub mod send_message;

pub use error::{PresenceError, SendMessageError};
pub use presence::{DisconnectOutcome, PresenceCoordinator, RoomRequest};
pub use send_message::{MessageRouter, OutgoingMessage};
