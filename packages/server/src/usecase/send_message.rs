//! UseCase: メッセージ送信処理
//!
//! Room が存在すればサーバー時刻を付与して履歴に追加し、
//! `room/{id}` トピックへ配信する。Room が存在しなければ黙って破棄する
//! （送信者へのエラー通知はしない）。

use std::sync::Arc;

use relay_shared::time::Clock;

use crate::domain::{
    ChatEvent, MessagePublisher, Payload, RoomId, RoomStore, Timestamp, Topic, Username,
};

use super::error::SendMessageError;

/// 送信されたチャットメッセージ
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub room_id: RoomId,
    pub sender: Username,
    pub content: String,
}

/// メッセージ送信のユースケース
pub struct MessageRouter {
    rooms: Arc<dyn RoomStore>,
    publisher: Arc<dyn MessagePublisher>,
    clock: Arc<dyn Clock>,
}

impl MessageRouter {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        publisher: Arc<dyn MessagePublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            publisher,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(ChatEvent)` - 履歴に追加され配信されたイベント
    /// * `Err(SendMessageError)` - 破棄された（送信者には通知しない）
    pub async fn send_message(
        &self,
        message: OutgoingMessage,
    ) -> Result<ChatEvent, SendMessageError> {
        let OutgoingMessage {
            room_id,
            sender,
            content,
        } = message;

        if !self.rooms.exists(&room_id).await {
            tracing::warn!(room_id = %room_id, "Chat message rejected: room not found");
            return Err(SendMessageError::RoomNotFound(room_id.into_string()));
        }
        tracing::info!(room_id = %room_id, sender = %sender, "Chat message");

        let event = ChatEvent::chat(
            room_id.clone(),
            sender,
            content,
            Timestamp::new(self.clock.now()),
        );
        self.rooms.append_history(&room_id, event.clone()).await;

        let topic = Topic::Room(room_id);
        if let Err(e) = self
            .publisher
            .publish(&topic, Payload::Event(event.clone()))
            .await
        {
            tracing::warn!(topic = %topic, "Failed to publish chat message: {}", e);
        }

        Ok(event)
    }
}
