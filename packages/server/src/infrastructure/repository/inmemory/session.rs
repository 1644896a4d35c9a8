//! InMemory SessionTracker 実装
//!
//! ユーザー名 → アクティブな接続 ID のマップ。
//! `clear_if_active` は `DashMap::remove_if` を使い、比較と削除を
//! 同じシャードロックの中で行う（読み取り → 条件付き削除の競合を防ぐ）。

use dashmap::DashMap;

use crate::domain::{ConnectionId, SessionTracker, Username};

/// インメモリ SessionTracker 実装
#[derive(Default)]
pub struct InMemorySessionTracker {
    sessions: DashMap<Username, ConnectionId>,
}

impl InMemorySessionTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionTracker for InMemorySessionTracker {
    fn set_active(&self, user: Username, connection_id: ConnectionId) {
        if let Some(previous) = self.sessions.insert(user.clone(), connection_id.clone()) {
            if previous != connection_id {
                tracing::debug!(
                    username = %user,
                    previous = %previous,
                    current = %connection_id,
                    "Active session superseded"
                );
            }
        }
    }

    fn get_active(&self, user: &Username) -> Option<ConnectionId> {
        self.sessions.get(user).map(|entry| entry.value().clone())
    }

    fn clear_if_active(&self, user: &Username, connection_id: &ConnectionId) -> bool {
        self.sessions
            .remove_if(user, |_, active| active == connection_id)
            .is_some()
    }

    fn clear(&self, user: &Username) {
        self.sessions.remove(user);
    }
}
