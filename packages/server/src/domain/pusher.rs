//! MessagePusher trait 定義
//!
//! 接続中のクライアントへのメッセージ送信（ブロードキャスト）の
//! インターフェースを定義します。具体的な実装は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{SequenceId, StoredMessage};

/// 接続ごとの送信バッファに積まれるフレーム
///
/// 送信は常にこのバッファへの fire-and-forget で、リモートの応答は待ちません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// ブロードキャストされたチャットメッセージ
    Chat { id: SequenceId, payload: String },
    /// 接続時に再送される履歴
    Replay { id: SequenceId, payload: String },
    /// 履歴の再送が終わったことを示すマーカー（クライアントには送られない）
    ReplayComplete,
    /// ping などの制御メッセージ
    Control(String),
    /// トランスポートを閉じる
    Close,
}

/// トランスポートへの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<OutboundFrame>;

/// ブロードキャストの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    /// バッファに積めた接続数
    pub delivered: usize,
    /// 送信に失敗した接続数
    pub failed: usize,
}

/// MessagePusher trait
///
/// UseCase 層はこの trait に依存し、送信手段の具体的な実装には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 全ての active な接続（送信者を含む）にメッセージを送信
    ///
    /// 一部の接続への送信失敗はログに残し、残りの接続への送信を続けます。
    async fn broadcast(&self, message: &StoredMessage) -> BroadcastReport;
}
