//! Repository trait 定義
//!
//! ドメイン層が必要とする共有状態のインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! 共有状態は `ConnectionRegistry` と `MessageHistory` の 2 つだけで、
//! それぞれ独立したロックで守られます。両方のロックを同時に保持してはいけません。

use async_trait::async_trait;

use super::{
    ChatMessage, Connection, ConnectionHandle, ConnectionSummary, DisplayName, HistoryError,
    PusherChannel, RegistryError, SequenceId, StoredMessage, TransportError, Visit,
};

/// 接続レジストリ（容量固定）
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 空きスロットに接続を登録し、スロット番号を返す
    ///
    /// 登録直後は alive = true、表示名はプレースホルダーです。
    async fn acquire(
        &self,
        handle: ConnectionHandle,
        channel: PusherChannel,
    ) -> Result<usize, RegistryError>;

    /// 接続を解放する（存在しない場合は何もしない）
    ///
    /// 解放した場合は `true` を返します。
    async fn release(&self, handle: &ConnectionHandle) -> bool;

    /// alive フラグを更新（active でない場合は何もしない）
    async fn set_alive(&self, handle: &ConnectionHandle, alive: bool);

    /// 表示名を更新（active でない場合は何もしない）
    async fn rename(&self, handle: &ConnectionHandle, name: DisplayName);

    /// ロックを保持したまま全ての active な接続を訪問する
    ///
    /// visitor はブロックしない送信のみを行い、レジストリを再入してはいけません。
    /// `Visit::Release` を返すとその場でスロットを解放します。
    async fn for_each_active(
        &self,
        visitor: &mut (dyn for<'a> FnMut(&'a mut Connection) -> Visit + Send),
    );

    /// active な接続のスナップショット
    async fn snapshot(&self) -> Vec<ConnectionSummary>;

    /// active な接続数
    async fn count_active(&self) -> usize;

    /// スロット数
    fn capacity(&self) -> usize;
}

/// メッセージ履歴（容量固定のリングバッファ）
#[async_trait]
pub trait MessageHistory: Send + Sync {
    /// 次の ID を採番してメッセージを保存する
    ///
    /// ID の付与と正規化はロック内で行われ、返り値は保存したものと同じ内容です。
    async fn append(&self, message: ChatMessage) -> Result<StoredMessage, HistoryError>;

    /// 保持している全メッセージを古い順に `send` へ渡す
    ///
    /// 1 件の失敗で中断せず、成功した件数を返します。
    async fn replay(
        &self,
        send: &mut (dyn for<'a> FnMut(&'a StoredMessage) -> Result<(), TransportError> + Send),
    ) -> usize;

    /// 保持している全メッセージ（古い順）
    async fn snapshot(&self) -> Vec<StoredMessage>;

    /// 保持しているメッセージ数
    async fn count(&self) -> usize;

    /// 最後に採番した ID
    async fn last_id(&self) -> Option<SequenceId>;

    /// リングの容量
    fn capacity(&self) -> usize;
}
