//! Outbound broadcast primitive.

use std::fmt;

use async_trait::async_trait;

use super::{ChatEvent, PublishError, RoomId, RoomSnapshot, Username};

/// Broadcast topic
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// `/topic/room/{id}`: chat, join and leave events
    Room(RoomId),
    /// `/topic/room/{id}/sync`: full room snapshot after every membership change
    RoomSync(RoomId),
    /// `/topic/errors/{username}`: errors addressed to one user
    Errors(Username),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Room(room_id) => write!(f, "/topic/room/{}", room_id),
            Topic::RoomSync(room_id) => write!(f, "/topic/room/{}/sync", room_id),
            Topic::Errors(username) => write!(f, "/topic/errors/{}", username),
        }
    }
}

/// Payload published on a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Event(ChatEvent),
    Sync(RoomSnapshot),
}

/// MessagePublisher trait
///
/// The only way the registry reaches the transport layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, topic: &Topic, payload: Payload) -> Result<(), PublishError>;
}
