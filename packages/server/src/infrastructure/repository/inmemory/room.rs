//! InMemory RoomStore 実装
//!
//! ドメイン層が定義する RoomStore trait の具体的な実装。
//!
//! ## ロック設計
//!
//! - 索引: `DashMap<RoomId, Arc<Mutex<Room>>>`（作成時の insert-if-absent を原子的に行う）
//! - Room ごとに `tokio::sync::Mutex` を持ち、同じ Room への変更を直列化する
//! - 索引のシャードロックは `Arc` を複製する間だけ保持し、await を跨がない
//!
//! これにより異なる Room への操作は互いをブロックしない。

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::Mutex;

use crate::domain::{
    ChatEvent, Password, Room, RoomId, RoomSnapshot, RoomStore, RoomStoreError, RoomSummary,
    Username,
};

/// インメモリ RoomStore 実装
#[derive(Default)]
pub struct InMemoryRoomStore {
    rooms: DashMap<RoomId, Arc<Mutex<Room>>>,
}

impl InMemoryRoomStore {
    /// 空の RoomStore を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 公開ルーム（パスワードなし）を持つ RoomStore を作成
    pub fn with_public_lounge() -> Self {
        let store = Self::new();
        let public = RoomId::public_lounge();
        store.rooms.insert(
            public.clone(),
            Arc::new(Mutex::new(Room::new(public.clone(), Password::empty()))),
        );
        tracing::info!(room_id = %public, "Initialized public room");
        store
    }

    /// Room のハンドルを取得（シャードロックはここで解放される）
    fn room_handle(&self, id: &RoomId) -> Option<Arc<Mutex<Room>>> {
        self.rooms.get(id).map(|entry| Arc::clone(entry.value()))
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn create_room(&self, id: RoomId, password: Password) -> Result<Room, RoomStoreError> {
        match self.rooms.entry(id.clone()) {
            Entry::Occupied(_) => Err(RoomStoreError::AlreadyExists(id.into_string())),
            Entry::Vacant(vacant) => {
                let room = Room::new(id, password);
                vacant.insert(Arc::new(Mutex::new(room.clone())));
                Ok(room)
            }
        }
    }

    async fn get(&self, id: &RoomId) -> Option<Room> {
        let handle = self.room_handle(id)?;
        let room = handle.lock().await;
        Some(room.clone())
    }

    async fn check_password(&self, id: &RoomId, password: &Password) -> Option<bool> {
        let handle = self.room_handle(id)?;
        let room = handle.lock().await;
        Some(room.password.accepts(password))
    }

    async fn exists(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    async fn append_history(&self, id: &RoomId, event: ChatEvent) {
        if let Some(handle) = self.room_handle(id) {
            handle.lock().await.append(event);
        }
    }

    async fn add_user(&self, id: &RoomId, user: Username) -> bool {
        match self.room_handle(id) {
            Some(handle) => handle.lock().await.add_user(user),
            None => false,
        }
    }

    async fn remove_user(&self, id: &RoomId, user: &Username) -> bool {
        match self.room_handle(id) {
            Some(handle) => handle.lock().await.remove_user(user),
            None => false,
        }
    }

    async fn remove_user_if(
        &self,
        id: &RoomId,
        user: &Username,
        condition: &(dyn Fn() -> bool + Send + Sync),
    ) -> bool {
        let Some(handle) = self.room_handle(id) else {
            return false;
        };
        let mut room = handle.lock().await;
        if !condition() {
            return false;
        }
        room.remove_user(user)
    }

    async fn snapshot(&self, id: &RoomId) -> Option<RoomSnapshot> {
        let handle = self.room_handle(id)?;
        let room = handle.lock().await;
        Some(room.snapshot())
    }

    async fn list_rooms(&self) -> Vec<RoomSummary> {
        let handles: Vec<Arc<Mutex<Room>>> = self
            .rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.lock().await.summary());
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PUBLIC_ROOM_ID, Timestamp};
    use relay_shared::time::{Clock, SystemClock};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomStore の作成・取得・メンバー操作・履歴追加
    // - 重複作成が既存 Room を変更しないこと
    // - 並行操作でメンバー変更や履歴追加が失われないこと
    //
    // 【なぜこのテストが必要か】
    // - RoomStore はプレゼンス管理とメッセージルーティングの土台
    // - 同じ Room への変更は線形化可能でなければならない
    // ========================================

    fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn username(value: &str) -> Username {
        Username::new(value.to_string()).unwrap()
    }

    fn chat(room: &str, sender: &str, content: &str) -> ChatEvent {
        ChatEvent::chat(
            room_id(room),
            username(sender),
            content.to_string(),
            Timestamp::new(SystemClock.now()),
        )
    }

    #[tokio::test]
    async fn test_public_lounge_exists_at_start() {
        // テスト項目: 公開ルームが初期状態で空パスワードで存在する
        // given (前提条件):
        let store = InMemoryRoomStore::with_public_lounge();

        // when (操作):
        let accepted = store
            .check_password(&room_id(PUBLIC_ROOM_ID), &Password::new("x".to_string()))
            .await;
        let snapshot = store.snapshot(&room_id(PUBLIC_ROOM_ID)).await;

        // then (期待する結果):
        assert_eq!(accepted, Some(true));
        let snapshot = snapshot.expect("public room should exist");
        assert!(snapshot.users.is_empty());
        assert!(snapshot.message_history.is_empty());
    }

    #[tokio::test]
    async fn test_create_room_success() {
        // テスト項目: Room を作成すると空のメンバー・履歴で登録される
        // given (前提条件):
        let store = InMemoryRoomStore::new();

        // when (操作):
        let result = store
            .create_room(room_id("lobby"), Password::new("pw".to_string()))
            .await;

        // then (期待する結果):
        let room = result.unwrap();
        assert_eq!(room.id, room_id("lobby"));
        assert!(store.exists(&room_id("lobby")).await);
    }

    #[tokio::test]
    async fn test_create_duplicate_room_leaves_existing_unchanged() {
        // テスト項目: 既存 ID での作成は失敗し、既存 Room は変更されない
        // given (前提条件):
        let store = InMemoryRoomStore::new();
        store
            .create_room(room_id("lobby"), Password::new("original".to_string()))
            .await
            .unwrap();
        store.add_user(&room_id("lobby"), username("alice")).await;
        store
            .append_history(&room_id("lobby"), chat("lobby", "alice", "hi"))
            .await;

        // when (操作):
        let result = store
            .create_room(room_id("lobby"), Password::new("other".to_string()))
            .await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            RoomStoreError::AlreadyExists("lobby".to_string())
        );
        let lobby = room_id("lobby");
        assert_eq!(
            store
                .check_password(&lobby, &Password::new("original".to_string()))
                .await,
            Some(true)
        );
        assert_eq!(
            store
                .check_password(&lobby, &Password::new("other".to_string()))
                .await,
            Some(false)
        );
        let snapshot = store.snapshot(&lobby).await.unwrap();
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.message_history.len(), 1);
    }

    #[tokio::test]
    async fn test_check_password_missing_room() {
        // テスト項目: 存在しない Room のパスワード照合は None
        // given (前提条件):
        let store = InMemoryRoomStore::new();

        // when (操作):
        let accepted = store
            .check_password(&room_id("nowhere"), &Password::empty())
            .await;

        // then (期待する結果):
        assert_eq!(accepted, None);
        assert!(store.snapshot(&room_id("nowhere")).await.is_none());
    }

    #[tokio::test]
    async fn test_get_returns_room_copy() {
        // テスト項目: get は Room の複製を返し、存在しない Room は None
        // given (前提条件):
        let store = InMemoryRoomStore::with_public_lounge();
        let public = RoomId::public_lounge();
        store.add_user(&public, username("alice")).await;

        // when (操作):
        let room = store.get(&public).await;
        let missing = store.get(&room_id("nowhere")).await;

        // then (期待する結果):
        let room = room.expect("public room should exist");
        assert!(room.password.is_empty());
        assert!(room.users.contains(&username("alice")));
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_append_history_to_missing_room_is_noop() {
        // テスト項目: 存在しない Room への履歴追加は何もしない
        // given (前提条件):
        let store = InMemoryRoomStore::new();

        // when (操作):
        store
            .append_history(&room_id("nowhere"), chat("nowhere", "alice", "hi"))
            .await;

        // then (期待する結果):
        assert!(!store.exists(&room_id("nowhere")).await);
    }

    #[tokio::test]
    async fn test_remove_user_distinguishes_absent() {
        // テスト項目: remove_user は存在したユーザーの削除時のみ true を返す
        // given (前提条件):
        let store = InMemoryRoomStore::with_public_lounge();
        let public = RoomId::public_lounge();
        store.add_user(&public, username("alice")).await;

        // when (操作):
        let removed = store.remove_user(&public, &username("alice")).await;
        let removed_again = store.remove_user(&public, &username("alice")).await;

        // then (期待する結果):
        assert!(removed);
        assert!(!removed_again);
    }

    #[tokio::test]
    async fn test_remove_user_if_respects_condition() {
        // テスト項目: remove_user_if は条件が true の場合のみメンバーを削除する
        // given (前提条件):
        let store = InMemoryRoomStore::with_public_lounge();
        let public = RoomId::public_lounge();
        store.add_user(&public, username("alice")).await;

        // when (操作):
        let kept = store
            .remove_user_if(&public, &username("alice"), &|| false)
            .await;
        let removed = store
            .remove_user_if(&public, &username("alice"), &|| true)
            .await;

        // then (期待する結果):
        assert!(!kept);
        assert!(removed);
        assert!(store.snapshot(&public).await.unwrap().users.is_empty());
    }

    #[tokio::test]
    async fn test_remove_user_if_missing_room() {
        // テスト項目: 存在しない Room では条件を評価せず false を返す
        // given (前提条件):
        let store = InMemoryRoomStore::new();
        let evaluated = std::sync::atomic::AtomicBool::new(false);

        // when (操作):
        let removed = store
            .remove_user_if(&room_id("nowhere"), &username("alice"), &|| {
                evaluated.store(true, std::sync::atomic::Ordering::SeqCst);
                true
            })
            .await;

        // then (期待する結果):
        assert!(!removed);
        assert!(!evaluated.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_snapshot_reflects_membership() {
        // テスト項目: スナップショットに追加したメンバーが含まれる
        // given (前提条件):
        let store = InMemoryRoomStore::with_public_lounge();
        let public = RoomId::public_lounge();

        // when (操作):
        store.add_user(&public, username("bob")).await;
        store.add_user(&public, username("alice")).await;
        let snapshot = store.snapshot(&public).await.unwrap();

        // then (期待する結果):
        assert_eq!(snapshot.users, vec![username("alice"), username("bob")]);
    }

    #[tokio::test]
    async fn test_list_rooms_sorted() {
        // テスト項目: Room 一覧が ID 順で返される
        // given (前提条件):
        let store = InMemoryRoomStore::new();
        store
            .create_room(room_id("zeta"), Password::empty())
            .await
            .unwrap();
        store
            .create_room(room_id("alpha"), Password::new("pw".to_string()))
            .await
            .unwrap();

        // when (操作):
        let rooms = store.list_rooms().await;

        // then (期待する結果):
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].id, room_id("alpha"));
        assert!(rooms[0].password_protected);
        assert_eq!(rooms[1].id, room_id("zeta"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_not_lost() {
        // テスト項目: 並行した履歴追加とメンバー追加が失われない
        // given (前提条件):
        let store = Arc::new(InMemoryRoomStore::with_public_lounge());
        let public = RoomId::public_lounge();

        // when (操作):
        let mut tasks = Vec::new();
        for i in 0..50 {
            let store = Arc::clone(&store);
            let public = public.clone();
            tasks.push(tokio::spawn(async move {
                let user = format!("user-{}", i);
                store.add_user(&public, username(&user)).await;
                store
                    .append_history(&public, chat(PUBLIC_ROOM_ID, &user, "hello"))
                    .await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // then (期待する結果):
        let snapshot = store.snapshot(&public).await.unwrap();
        assert_eq!(snapshot.users.len(), 50);
        assert_eq!(snapshot.message_history.len(), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_has_single_winner() {
        // テスト項目: 同じ ID の並行作成はちょうど一つだけ成功する
        // given (前提条件):
        let store = Arc::new(InMemoryRoomStore::new());

        // when (操作):
        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store
                    .create_room(room_id("contested"), Password::new(format!("pw-{}", i)))
                    .await
                    .is_ok()
            }));
        }
        let mut successes = 0;
        for task in tasks {
            if task.await.unwrap() {
                successes += 1;
            }
        }

        // then (期待する結果):
        assert_eq!(successes, 1);
    }
}
