//! UseCase: プレゼンス管理（Room の作成・参加・退出・切断）
//!
//! ## 状態遷移
//!
//! (ユーザー, Room) の状態は保存せず、Room のメンバーシップと
//! SessionTracker のエントリから導出する。
//!
//! - create-room: Room が既に存在すれば ERROR、なければ作成して join へ
//! - join-room: 存在確認 → パスワード確認 → コンテキスト関連付け →
//!   アクティブ接続の設定 → メンバー追加 → JOIN + sync を配信
//! - leave-room: 接続コンテキストから (ユーザー, Room) を取り出して退出
//! - disconnect: アクティブな接続の切断のみメンバーから削除する。
//!   古い接続（ゴースト）の切断は何も変更しない
//!
//! ## テスト実装の作業記録
//!
//! ### どのような状況を想定しているか
//! - 正常系：公開ルームへの参加、Room 作成と自動参加、退出、切断
//! - 異常系：存在しない Room、誤ったパスワード、重複した Room 作成
//! - エッジケース：再接続後の古い接続の切断（ゴースト）、二重の退出

use std::sync::Arc;

use relay_shared::time::Clock;

use crate::domain::{
    ChatEvent, ConnectionContextStore, ConnectionId, MessagePublisher, Password, Payload, RoomId,
    RoomStore, SessionContext, SessionTracker, Timestamp, Topic, Username,
};

use super::error::PresenceError;

/// create-room / join-room リクエスト
#[derive(Debug, Clone)]
pub struct RoomRequest {
    pub room_id: RoomId,
    pub password: Password,
    pub username: Username,
}

/// 切断処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// 接続にコンテキストがない（参加前、または退出済み）
    NotJoined,
    /// 同じユーザーが新しい接続で参加済み。何も変更しない
    Ghost,
    /// アクティブな接続だったが、既にメンバーではなかった
    AlreadyAbsent,
    /// メンバーから削除し、LEAVE + sync を配信した
    Left,
}

/// プレゼンス管理のユースケース
pub struct PresenceCoordinator {
    rooms: Arc<dyn RoomStore>,
    sessions: Arc<dyn SessionTracker>,
    contexts: Arc<dyn ConnectionContextStore>,
    publisher: Arc<dyn MessagePublisher>,
    clock: Arc<dyn Clock>,
}

impl PresenceCoordinator {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        sessions: Arc<dyn SessionTracker>,
        contexts: Arc<dyn ConnectionContextStore>,
        publisher: Arc<dyn MessagePublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            sessions,
            contexts,
            publisher,
            clock,
        }
    }

    /// Room を作成し、作成者をそのまま参加させる
    ///
    /// # Returns
    ///
    /// * `Err(PresenceError)` - 要求者の ERROR トピックへ通知済みのエラー
    pub async fn create_room(
        &self,
        request: RoomRequest,
        connection_id: ConnectionId,
    ) -> Result<(), PresenceError> {
        tracing::info!(
            room_id = %request.room_id,
            username = %request.username,
            "Room create request"
        );

        if let Err(e) = self
            .rooms
            .create_room(request.room_id.clone(), request.password.clone())
            .await
        {
            tracing::warn!(room_id = %request.room_id, "Room create failed: {}", e);
            return self
                .reject(&request.username, PresenceError::RoomAlreadyExists)
                .await;
        }
        tracing::info!(room_id = %request.room_id, "Room created");

        self.join_room(request, connection_id).await
    }

    /// Room に参加する
    ///
    /// メンバー追加が完了してから JOIN と sync を配信するため、
    /// sync スナップショットには必ず新しいメンバーが含まれる。
    pub async fn join_room(
        &self,
        request: RoomRequest,
        connection_id: ConnectionId,
    ) -> Result<(), PresenceError> {
        let RoomRequest {
            room_id,
            password,
            username,
        } = request;
        tracing::info!(room_id = %room_id, username = %username, "Join request");

        let Some(accepted) = self.rooms.check_password(&room_id, &password).await else {
            tracing::warn!(room_id = %room_id, "Join failed: room not found");
            return self.reject(&username, PresenceError::RoomNotFound).await;
        };

        if !accepted {
            tracing::warn!(
                room_id = %room_id,
                username = %username,
                "Join failed: invalid password"
            );
            return self.reject(&username, PresenceError::InvalidPassword).await;
        }

        self.contexts.bind(
            connection_id.clone(),
            SessionContext {
                username: username.clone(),
                room_id: room_id.clone(),
            },
        );
        self.sessions.set_active(username.clone(), connection_id.clone());
        self.rooms.add_user(&room_id, username.clone()).await;
        tracing::info!(
            room_id = %room_id,
            username = %username,
            connection_id = %connection_id,
            "User joined room"
        );

        let joined = ChatEvent::joined(room_id.clone(), username, self.now());
        self.publish(Topic::Room(room_id.clone()), Payload::Event(joined))
            .await;
        self.publish_sync(&room_id).await;

        Ok(())
    }

    /// 明示的な退出
    ///
    /// ユーザーと Room は接続コンテキストから取り出す。コンテキストがなければ
    /// 何もしない（二度目の退出も同様）。
    ///
    /// # Returns
    ///
    /// * `true` - 退出処理を行い LEAVE + sync を配信した
    pub async fn leave_room(&self, connection_id: &ConnectionId) -> bool {
        let Some(SessionContext { username, room_id }) = self.contexts.take(connection_id) else {
            tracing::debug!(
                connection_id = %connection_id,
                "Leave request without a joined session, dropped"
            );
            return false;
        };
        tracing::info!(room_id = %room_id, username = %username, "Leave request");

        self.sessions.clear(&username);
        self.rooms.remove_user(&room_id, &username).await;

        let left = ChatEvent::left(room_id.clone(), username.clone(), self.now());
        self.publish(Topic::Room(room_id.clone()), Payload::Event(left))
            .await;
        self.publish_sync(&room_id).await;

        tracing::info!(room_id = %room_id, username = %username, "User left room");
        true
    }

    /// 接続の切断通知
    ///
    /// メンバーからの削除は、その時点で誰もユーザーのアクティブ接続を
    /// 持っていない場合に限り Room のロック内で行う。アクティブ接続の
    /// 解除と削除の間に新しい接続で再参加された場合はゴーストとして扱う。
    pub async fn disconnect(&self, connection_id: &ConnectionId) -> DisconnectOutcome {
        let Some(SessionContext { username, room_id }) = self.contexts.take(connection_id) else {
            return DisconnectOutcome::NotJoined;
        };

        if !self.sessions.clear_if_active(&username, connection_id) {
            tracing::info!(
                username = %username,
                connection_id = %connection_id,
                "Ghost session disconnected (ignored)"
            );
            return DisconnectOutcome::Ghost;
        }
        tracing::info!(
            room_id = %room_id,
            username = %username,
            "User disconnected (active session)"
        );

        let sessions = &self.sessions;
        let unclaimed = || sessions.get_active(&username).is_none();
        if !self
            .rooms
            .remove_user_if(&room_id, &username, &unclaimed)
            .await
        {
            if self.sessions.get_active(&username).is_some() {
                tracing::info!(
                    username = %username,
                    connection_id = %connection_id,
                    "User re-joined during disconnect (ignored)"
                );
                return DisconnectOutcome::Ghost;
            }
            return DisconnectOutcome::AlreadyAbsent;
        }

        let disconnected = ChatEvent::disconnected(room_id.clone(), username, self.now());
        self.publish(Topic::Room(room_id.clone()), Payload::Event(disconnected))
            .await;
        self.publish_sync(&room_id).await;

        DisconnectOutcome::Left
    }

    /// 要求者の ERROR トピックへエラーを通知し、そのエラーを返す
    async fn reject(&self, username: &Username, error: PresenceError) -> Result<(), PresenceError> {
        tracing::error!(username = %username, "Error for user: {}", error);
        let event = ChatEvent::error(error.to_string(), self.now());
        self.publish(Topic::Errors(username.clone()), Payload::Event(event))
            .await;
        Err(error)
    }

    async fn publish_sync(&self, room_id: &RoomId) {
        if let Some(snapshot) = self.rooms.snapshot(room_id).await {
            self.publish(Topic::RoomSync(room_id.clone()), Payload::Sync(snapshot))
                .await;
        }
    }

    async fn publish(&self, topic: Topic, payload: Payload) {
        if let Err(e) = self.publisher.publish(&topic, payload).await {
            tracing::warn!(topic = %topic, "Failed to publish: {}", e);
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now())
    }
}
