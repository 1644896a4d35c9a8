//! Domain error types.

use thiserror::Error;

/// Value object construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("username must not be empty")]
    UsernameEmpty,

    #[error("connection id must not be empty")]
    ConnectionIdEmpty,
}

/// RoomStore errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomStoreError {
    #[error("room '{0}' already exists")]
    AlreadyExists(String),
}

/// MessagePublisher errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("failed to serialize payload: {0}")]
    Serialization(String),

    #[error("failed to push payload: {0}")]
    PushFailed(String),
}
