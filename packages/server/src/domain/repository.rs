//! Store trait 定義
//!
//! ユースケース層が必要とする状態ストアのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    ChatEvent, ConnectionId, Password, Room, RoomId, RoomSnapshot, RoomStoreError, RoomSummary,
    SessionContext, Username,
};

/// RoomStore trait
///
/// Room の存在・メンバーシップ・履歴を所有する。Room は一度作成されると削除されない。
///
/// 同じ Room に対する操作は互いに線形化可能でなければならず、
/// 異なる Room に対する操作は互いをブロックしてはならない。
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Room を作成（既に存在する場合は `AlreadyExists`）
    async fn create_room(&self, id: RoomId, password: Password) -> Result<Room, RoomStoreError>;

    /// Room を取得（副作用なし）
    async fn get(&self, id: &RoomId) -> Option<Room>;

    /// パスワードを照合する。Room が存在しない場合は `None`
    async fn check_password(&self, id: &RoomId, password: &Password) -> Option<bool>;

    /// Room が存在するか
    async fn exists(&self, id: &RoomId) -> bool;

    /// 履歴にイベントを追加（Room が存在しない場合は何もしない）
    async fn append_history(&self, id: &RoomId, event: ChatEvent);

    /// メンバーを追加。新規追加なら `true`
    async fn add_user(&self, id: &RoomId, user: Username) -> bool;

    /// メンバーを削除。実際に存在していた場合のみ `true`
    async fn remove_user(&self, id: &RoomId, user: &Username) -> bool;

    /// `condition` が `true` の場合のみメンバーを削除する。
    ///
    /// `condition` は Room のロックを保持したまま評価されるため、
    /// 同じ Room への `add_user` と判定・削除の間に割り込まれない。
    async fn remove_user_if(
        &self,
        id: &RoomId,
        user: &Username,
        condition: &(dyn Fn() -> bool + Send + Sync),
    ) -> bool;

    /// メンバー + 履歴のスナップショットを取得
    async fn snapshot(&self, id: &RoomId) -> Option<RoomSnapshot>;

    /// 全 Room のサマリーを ID 順で取得
    async fn list_rooms(&self) -> Vec<RoomSummary>;
}

/// SessionTracker trait
///
/// ユーザーごとに「アクティブ」とみなす接続 ID を一つだけ保持する。
/// 全ての操作は await を含まないため同期メソッドとして定義する。
pub trait SessionTracker: Send + Sync {
    /// 無条件に上書き（last-write-wins）
    fn set_active(&self, user: Username, connection_id: ConnectionId);

    fn get_active(&self, user: &Username) -> Option<ConnectionId>;

    /// 保持している値が `connection_id` と一致する場合のみ削除する。
    ///
    /// 比較と削除は単一のアトミック操作で行われなければならない。
    /// `false` はゴースト切断（既に新しい接続で再参加済み）を意味する。
    fn clear_if_active(&self, user: &Username, connection_id: &ConnectionId) -> bool;

    /// 無条件に削除（明示的な退出用）
    fn clear(&self, user: &Username);
}

/// ConnectionContextStore trait
///
/// 接続 ID → (ユーザー, Room) のサイドテーブル。参加時に設定され、
/// 退出・切断時に取り出される。
pub trait ConnectionContextStore: Send + Sync {
    /// 接続にコンテキストを関連付ける（既存の値は上書き）
    fn bind(&self, connection_id: ConnectionId, context: SessionContext);

    /// コンテキストを取り出して削除する
    fn take(&self, connection_id: &ConnectionId) -> Option<SessionContext>;
}
