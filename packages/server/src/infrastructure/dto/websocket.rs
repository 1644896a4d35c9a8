//! WebSocket frame DTOs.
//!
//! Inbound frames are JSON objects tagged by `type`. Outbound frames wrap the
//! payload with the topic it was published on.

use serde::{Deserialize, Serialize};

/// Chat event type as seen on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Chat,
    Join,
    Leave,
    Error,
}

/// Chat event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEventDto {
    pub r#type: MessageType,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub timestamp: String,
}

/// Room snapshot (membership + history)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: String,
    pub users: Vec<String>,
    pub message_history: Vec<ChatEventDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadDto {
    Event(ChatEventDto),
    Room(RoomDto),
}

/// Server → client frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFrame {
    pub topic: String,
    pub payload: PayloadDto,
}

/// Create/join request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequestDto {
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub username: String,
}

/// Chat message body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageDto {
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub content: String,
}

/// Client → server frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    Subscribe { topic: String },
    Unsubscribe { topic: String },
    SendMessage(SendMessageDto),
    CreateRoom(RoomRequestDto),
    JoinRoom(RoomRequestDto),
    /// Identity and room come from the connection context, not the frame.
    LeaveRoom {},
}
