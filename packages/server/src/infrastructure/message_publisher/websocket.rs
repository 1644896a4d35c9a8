//! WebSocket を使った MessagePublisher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - トピック購読（subscribe / unsubscribe）を管理
//! - `publish` されたペイロードを JSON にしてトピックの購読者全員へ送信
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! ロックは `subscriptions` → `clients` の順に、同時には保持しません。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{ConnectionId, MessagePublisher, Payload, PublishError, Topic},
    infrastructure::dto::websocket::ServerFrame,
};

/// 接続へのメッセージ送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// WebSocket を使った MessagePublisher 実装
#[derive(Default)]
pub struct WebSocketPublisher {
    /// 接続中のクライアントの WebSocket sender
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
    /// トピック名 → 購読している接続 ID
    subscriptions: Mutex<HashMap<String, HashSet<ConnectionId>>>,
}

impl WebSocketPublisher {
    /// 新しい WebSocketPublisher を作成
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!(connection_id = %connection_id, "Client registered to publisher");
        clients.insert(connection_id, sender);
    }

    /// クライアントを登録解除し、全ての購読を削除する
    pub async fn unregister_client(&self, connection_id: &ConnectionId) {
        self.clients.lock().await.remove(connection_id);

        let mut subscriptions = self.subscriptions.lock().await;
        subscriptions.retain(|_, subscribers| {
            subscribers.remove(connection_id);
            !subscribers.is_empty()
        });
        tracing::debug!(connection_id = %connection_id, "Client unregistered from publisher");
    }

    pub async fn subscribe(&self, connection_id: &ConnectionId, topic: String) {
        tracing::debug!(connection_id = %connection_id, topic = %topic, "Subscribed");
        self.subscriptions
            .lock()
            .await
            .entry(topic)
            .or_default()
            .insert(connection_id.clone());
    }

    pub async fn unsubscribe(&self, connection_id: &ConnectionId, topic: &str) {
        let mut subscriptions = self.subscriptions.lock().await;
        if let Some(subscribers) = subscriptions.get_mut(topic) {
            subscribers.remove(connection_id);
            if subscribers.is_empty() {
                subscriptions.remove(topic);
            }
        }
        tracing::debug!(connection_id = %connection_id, topic = %topic, "Unsubscribed");
    }

    /// トピックの購読者数
    #[cfg(test)]
    pub(crate) async fn subscriber_count(&self, topic: &str) -> usize {
        self.subscriptions
            .lock()
            .await
            .get(topic)
            .map_or(0, HashSet::len)
    }
}

#[async_trait]
impl MessagePublisher for WebSocketPublisher {
    async fn publish(&self, topic: &Topic, payload: Payload) -> Result<(), PublishError> {
        let frame = ServerFrame::new(topic, &payload);
        let json = serde_json::to_string(&frame)
            .map_err(|e| PublishError::Serialization(e.to_string()))?;

        let targets: Vec<ConnectionId> = {
            let subscriptions = self.subscriptions.lock().await;
            subscriptions
                .get(&frame.topic)
                .map(|subscribers| subscribers.iter().cloned().collect())
                .unwrap_or_default()
        };

        let clients = self.clients.lock().await;
        for target in targets {
            match clients.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = sender.send(json.clone()) {
                        tracing::warn!(
                            connection_id = %target,
                            "Failed to push message: {}",
                            e
                        );
                    }
                }
                None => {
                    tracing::warn!(
                        connection_id = %target,
                        "Subscriber not registered during publish, skipping"
                    );
                }
            }
        }

        tracing::debug!(topic = %frame.topic, "Published");
        Ok(())
    }
}
