//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - タイムスタンプの付与、履歴への保存、ブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - サーバーが ID と順序の唯一の決定者であることを保証
//! - クライアントが指定したタイムスタンプは上書きしない方針を検証
//! - 送信者自身にもブロードキャストされることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：タイムスタンプ無しのメッセージ（サーバー時刻を付与）
//! - 正常系：タイムスタンプ有りのメッセージ（そのまま保持）
//! - エッジケース：複数の送信者からの連続送信で ID が単調増加

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    BroadcastReport, ChatMessage, ConnectionHandle, ConnectionRegistry, MessageHistory,
    MessagePusher, StoredMessage, Timestamp,
};

use super::error::SendMessageError;

/// 送信結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// 保存したメッセージ
    pub stored: StoredMessage,
    /// ブロードキャストの結果
    pub report: BroadcastReport,
    /// サーバー時刻を付与したか
    pub stamped: bool,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// ConnectionRegistry（表示名の更新）
    registry: Arc<dyn ConnectionRegistry>,
    /// MessageHistory（履歴への保存）
    history: Arc<dyn MessageHistory>,
    /// MessagePusher（ブロードキャスト）
    message_pusher: Arc<dyn MessagePusher>,
    /// 時刻の取得
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        history: Arc<dyn MessageHistory>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            history,
            message_pusher,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `from` - 送信者の接続ハンドル
    /// * `message` - 受信したチャットメッセージ（Domain Model）
    ///
    /// # Returns
    ///
    /// * `Ok(SentMessage)` - 保存とブロードキャストの結果
    /// * `Err(SendMessageError)` - 保存に失敗（ブロードキャストもしない）
    pub async fn execute(
        &self,
        from: &ConnectionHandle,
        mut message: ChatMessage,
    ) -> Result<SentMessage, SendMessageError> {
        // 1. タイムスタンプが無い場合のみサーバー時刻を付与
        let stamped = message.stamp_if_missing(Timestamp::new(self.clock.now_unix_secs()));
        let display_name = message.display_name();

        // 2. 履歴に保存（ID の付与と正規化はロック内で行われる）
        let stored = self.history.append(message).await?;

        // 3. 送信者の表示名を更新
        if let Some(name) = display_name {
            self.registry.rename(from, name).await;
        }

        // 4. 送信者を含む全ての接続にブロードキャスト
        let report = self.message_pusher.broadcast(&stored).await;

        tracing::info!(
            "Message {} from '{}' stored and broadcast to {} connection(s)",
            stored.id,
            from,
            report.delivered
        );

        Ok(SentMessage {
            stored,
            report,
            stamped,
        })
    }
}
