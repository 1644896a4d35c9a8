//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::RoomStore,
    infrastructure::message_publisher::WebSocketPublisher,
    usecase::{MessageRouter, PresenceCoordinator},
};

/// Shared application state
pub struct AppState {
    /// PresenceCoordinator（参加・退出・切断のユースケース）
    pub presence: Arc<PresenceCoordinator>,
    /// MessageRouter（メッセージ送信のユースケース）
    pub message_router: Arc<MessageRouter>,
    /// WebSocketPublisher（接続登録とトピック購読）
    pub publisher: Arc<WebSocketPublisher>,
    /// RoomStore（HTTP API の読み取り用）
    pub rooms: Arc<dyn RoomStore>,
}
