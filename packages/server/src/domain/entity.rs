//! Domain entities.

use std::collections::HashSet;

use super::value_object::{Password, RoomId, Timestamp, Username};

/// Kind of a chat event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Chat,
    Join,
    Leave,
    Error,
}

/// Chat event broadcast to a room or addressed to a single user.
///
/// Immutable once constructed. `room_id` and `sender` are absent for
/// `EventKind::Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub kind: EventKind,
    pub room_id: Option<RoomId>,
    pub sender: Option<Username>,
    pub content: String,
    pub timestamp: Timestamp,
}

impl ChatEvent {
    pub fn chat(room_id: RoomId, sender: Username, content: String, timestamp: Timestamp) -> Self {
        Self {
            kind: EventKind::Chat,
            room_id: Some(room_id),
            sender: Some(sender),
            content,
            timestamp,
        }
    }

    pub fn joined(room_id: RoomId, user: Username, timestamp: Timestamp) -> Self {
        let content = format!("{} joined the room", user);
        Self {
            kind: EventKind::Join,
            room_id: Some(room_id),
            sender: Some(user),
            content,
            timestamp,
        }
    }

    /// Explicit leave
    pub fn left(room_id: RoomId, user: Username, timestamp: Timestamp) -> Self {
        let content = format!("{} left the room", user);
        Self {
            kind: EventKind::Leave,
            room_id: Some(room_id),
            sender: Some(user),
            content,
            timestamp,
        }
    }

    /// Leave caused by the active connection going away
    pub fn disconnected(room_id: RoomId, user: Username, timestamp: Timestamp) -> Self {
        let content = format!("{} disconnected", user);
        Self {
            kind: EventKind::Leave,
            room_id: Some(room_id),
            sender: Some(user),
            content,
            timestamp,
        }
    }

    pub fn error(content: String, timestamp: Timestamp) -> Self {
        Self {
            kind: EventKind::Error,
            room_id: None,
            sender: None,
            content,
            timestamp,
        }
    }
}

/// Room: password-gated membership + history container
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub password: Password,
    pub users: HashSet<Username>,
    /// Append-only, insertion order. Unbounded.
    pub history: Vec<ChatEvent>,
}

impl Room {
    pub fn new(id: RoomId, password: Password) -> Self {
        Self {
            id,
            password,
            users: HashSet::new(),
            history: Vec::new(),
        }
    }

    /// Returns `true` if the user was not yet a member
    pub fn add_user(&mut self, user: Username) -> bool {
        self.users.insert(user)
    }

    /// Returns `true` if the user was present
    pub fn remove_user(&mut self, user: &Username) -> bool {
        self.users.remove(user)
    }

    pub fn append(&mut self, event: ChatEvent) {
        self.history.push(event);
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        let mut users: Vec<Username> = self.users.iter().cloned().collect();
        users.sort();
        RoomSnapshot {
            id: self.id.clone(),
            users,
            message_history: self.history.clone(),
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            member_count: self.users.len(),
            message_count: self.history.len(),
            password_protected: !self.password.is_empty(),
        }
    }
}

/// Full room state sent on `room/{id}/sync`. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub id: RoomId,
    /// Sorted by username
    pub users: Vec<Username>,
    pub message_history: Vec<ChatEvent>,
}

/// Lightweight room listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub member_count: usize,
    pub message_count: usize,
    pub password_protected: bool,
}

/// (user, room) tag attached to a connection on join.
///
/// A back-reference only; the Room and the SessionTracker entry own the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub username: Username,
    pub room_id: RoomId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_shared::time::{Clock, FixedClock};

    fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn username(value: &str) -> Username {
        Username::new(value.to_string()).unwrap()
    }

    #[test]
    fn test_join_event_content() {
        // テスト項目: JOIN イベントの内容が正しく生成される
        // given (前提条件):
        let timestamp = Timestamp::new(FixedClock::from_millis(1000).now());

        // when (操作):
        let event = ChatEvent::joined(room_id("lobby"), username("alice"), timestamp);

        // then (期待する結果):
        assert_eq!(event.kind, EventKind::Join);
        assert_eq!(event.content, "alice joined the room");
        assert_eq!(event.sender, Some(username("alice")));
        assert_eq!(event.room_id, Some(room_id("lobby")));
    }

    #[test]
    fn test_error_event_has_no_room_or_sender() {
        // テスト項目: ERROR イベントは room_id と sender を持たない
        // given (前提条件):
        let timestamp = Timestamp::new(FixedClock::from_millis(1000).now());

        // when (操作):
        let event = ChatEvent::error("Room not found!".to_string(), timestamp);

        // then (期待する結果):
        assert_eq!(event.kind, EventKind::Error);
        assert!(event.room_id.is_none());
        assert!(event.sender.is_none());
    }

    #[test]
    fn test_room_membership_is_a_set() {
        // テスト項目: 同じユーザーを二重に追加してもメンバーは一人
        // given (前提条件):
        let mut room = Room::new(room_id("lobby"), Password::empty());

        // when (操作):
        let first = room.add_user(username("alice"));
        let second = room.add_user(username("alice"));

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(room.users.len(), 1);
    }

    #[test]
    fn test_remove_user_reports_presence() {
        // テスト項目: remove_user は削除の有無を返す
        // given (前提条件):
        let mut room = Room::new(room_id("lobby"), Password::empty());
        room.add_user(username("alice"));

        // when (操作):
        let removed = room.remove_user(&username("alice"));
        let removed_again = room.remove_user(&username("alice"));

        // then (期待する結果):
        assert!(removed);
        assert!(!removed_again);
    }

    #[test]
    fn test_snapshot_sorts_users_and_keeps_history_order() {
        // テスト項目: スナップショットのユーザーはソートされ、履歴は挿入順を保つ
        // given (前提条件):
        let clock = FixedClock::from_millis(1000);
        let mut room = Room::new(room_id("lobby"), Password::new("pw".to_string()));
        room.add_user(username("charlie"));
        room.add_user(username("alice"));
        room.append(ChatEvent::chat(
            room_id("lobby"),
            username("alice"),
            "first".to_string(),
            Timestamp::new(clock.now()),
        ));
        room.append(ChatEvent::chat(
            room_id("lobby"),
            username("charlie"),
            "second".to_string(),
            Timestamp::new(clock.now()),
        ));

        // when (操作):
        let snapshot = room.snapshot();

        // then (期待する結果):
        assert_eq!(snapshot.users, vec![username("alice"), username("charlie")]);
        assert_eq!(snapshot.message_history[0].content, "first");
        assert_eq!(snapshot.message_history[1].content, "second");
    }

    #[test]
    fn test_summary_reports_password_protection() {
        // テスト項目: サマリーはパスワード保護の有無を反映する
        // given (前提条件):
        let public = Room::new(room_id("public"), Password::empty());
        let private = Room::new(room_id("private"), Password::new("pw".to_string()));

        // when (操作):
        let public_summary = public.summary();
        let private_summary = private.summary();

        // then (期待する結果):
        assert!(!public_summary.password_protected);
        assert!(private_summary.password_protected);
        assert_eq!(public_summary.member_count, 0);
    }
}
