//! UseCase error types.

use thiserror::Error;

/// Errors surfaced to the requester as an ERROR event on their private topic.
///
/// The `Display` text is the ERROR content sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    #[error("Room already exists!")]
    RoomAlreadyExists,

    #[error("Room not found!")]
    RoomNotFound,

    #[error("Invalid password!")]
    InvalidPassword,
}

/// Chat message routing errors (never reported back to the sender)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
}
