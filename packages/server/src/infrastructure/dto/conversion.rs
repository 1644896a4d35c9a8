//! Conversion logic between domain entities and DTOs.

use crate::domain::{ChatEvent, EventKind, Payload, RoomSnapshot, RoomSummary, Topic};
use crate::infrastructure::dto::{
    http::RoomSummaryDto,
    websocket::{ChatEventDto, MessageType, PayloadDto, RoomDto, ServerFrame},
};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<EventKind> for MessageType {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Chat => MessageType::Chat,
            EventKind::Join => MessageType::Join,
            EventKind::Leave => MessageType::Leave,
            EventKind::Error => MessageType::Error,
        }
    }
}

impl From<&ChatEvent> for ChatEventDto {
    fn from(event: &ChatEvent) -> Self {
        Self {
            r#type: event.kind.into(),
            content: event.content.clone(),
            sender: event.sender.as_ref().map(|s| s.as_str().to_string()),
            room_id: event.room_id.as_ref().map(|r| r.as_str().to_string()),
            timestamp: event.timestamp.to_iso8601(),
        }
    }
}

impl From<&RoomSnapshot> for RoomDto {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self {
            id: snapshot.id.as_str().to_string(),
            users: snapshot
                .users
                .iter()
                .map(|u| u.as_str().to_string())
                .collect(),
            message_history: snapshot
                .message_history
                .iter()
                .map(ChatEventDto::from)
                .collect(),
        }
    }
}

impl From<&Payload> for PayloadDto {
    fn from(payload: &Payload) -> Self {
        match payload {
            Payload::Event(event) => PayloadDto::Event(event.into()),
            Payload::Sync(snapshot) => PayloadDto::Room(snapshot.into()),
        }
    }
}

impl ServerFrame {
    pub fn new(topic: &Topic, payload: &Payload) -> Self {
        Self {
            topic: topic.to_string(),
            payload: payload.into(),
        }
    }
}

impl From<RoomSummary> for RoomSummaryDto {
    fn from(summary: RoomSummary) -> Self {
        Self {
            id: summary.id.into_string(),
            member_count: summary.member_count,
            message_count: summary.message_count,
            password_protected: summary.password_protected,
        }
    }
}
