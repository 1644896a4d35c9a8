//! InMemory ConnectionContextStore 実装

use dashmap::DashMap;

use crate::domain::{ConnectionContextStore, ConnectionId, SessionContext};

/// 接続 ID → (ユーザー, Room) のサイドテーブル
#[derive(Default)]
pub struct InMemoryConnectionContextStore {
    contexts: DashMap<ConnectionId, SessionContext>,
}

impl InMemoryConnectionContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, connection_id: &ConnectionId) -> Option<SessionContext> {
        self.contexts
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }

    /// 保持しているコンテキスト数
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.contexts.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl ConnectionContextStore for InMemoryConnectionContextStore {
    fn bind(&self, connection_id: ConnectionId, context: SessionContext) {
        self.contexts.insert(connection_id, context);
    }

    fn take(&self, connection_id: &ConnectionId) -> Option<SessionContext> {
        self.contexts
            .remove(connection_id)
            .map(|(_, context)| context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoomId, Username};

    fn context(user: &str, room: &str) -> SessionContext {
        SessionContext {
            username: Username::new(user.to_string()).unwrap(),
            room_id: RoomId::new(room.to_string()).unwrap(),
        }
    }

    #[test]
    fn test_bind_then_get() {
        // テスト項目: 関連付けたコンテキストを取得できる
        // given (前提条件):
        let store = InMemoryConnectionContextStore::new();
        let conn = ConnectionId::generate();

        // when (操作):
        store.bind(conn.clone(), context("alice", "lobby"));

        // then (期待する結果):
        assert_eq!(store.get(&conn), Some(context("alice", "lobby")));
    }

    #[test]
    fn test_rebind_overwrites() {
        // テスト項目: 同じ接続への再関連付けは上書きされる
        // given (前提条件):
        let store = InMemoryConnectionContextStore::new();
        let conn = ConnectionId::generate();
        store.bind(conn.clone(), context("alice", "lobby"));

        // when (操作):
        store.bind(conn.clone(), context("alice", "garden"));

        // then (期待する結果):
        assert_eq!(store.get(&conn), Some(context("alice", "garden")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_take_removes_context() {
        // テスト項目: take はコンテキストを返して削除する
        // given (前提条件):
        let store = InMemoryConnectionContextStore::new();
        let conn = ConnectionId::generate();
        store.bind(conn.clone(), context("alice", "lobby"));

        // when (操作):
        let first = store.take(&conn);
        let second = store.take(&conn);

        // then (期待する結果):
        assert_eq!(first, Some(context("alice", "lobby")));
        assert_eq!(second, None);
        assert!(store.is_empty());
    }
}
