//! UseCase: 接続処理（Connecting → Active）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::execute() メソッド
//! - スロットの確保と、新規接続への履歴の再送
//!
//! ### なぜこのテストが必要か
//! - 容量を超えた接続は即座に閉じ、履歴やブロードキャストに影響させない
//! - 新規接続は現在の履歴を元の順序・ID・タイムスタンプのまま受け取る
//!
//! ### どのような状況を想定しているか
//! - 正常系：空き有りでの接続と履歴の再送
//! - 異常系：容量超過
//! - エッジケース：履歴が空の場合

use std::sync::Arc;

use crate::domain::{
    ConnectionHandle, ConnectionRegistry, MessageHistory, OutboundFrame, PusherChannel,
    TransportError,
};

use super::error::ConnectError;

/// 接続成功時の情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedSession {
    /// 確保したスロット番号
    pub slot: usize,
    /// 再送した履歴の件数
    pub replayed: usize,
}

/// 接続のユースケース
pub struct ConnectSessionUseCase {
    /// ConnectionRegistry（接続の管理）
    registry: Arc<dyn ConnectionRegistry>,
    /// MessageHistory（履歴の管理）
    history: Arc<dyn MessageHistory>,
}

impl ConnectSessionUseCase {
    /// 新しい ConnectSessionUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, history: Arc<dyn MessageHistory>) -> Self {
        Self { registry, history }
    }

    /// 接続を実行
    ///
    /// 1. レジストリのスロットを確保（失敗したらトランスポートを閉じる）
    /// 2. 現在の履歴を `Replay` フレームとして積む
    /// 3. `ReplayComplete` マーカーを積む
    ///
    /// レジストリのロックを解放してから履歴のロックを取るため、
    /// 2 つのロックを同時に保持することはありません。
    ///
    /// # Arguments
    ///
    /// * `handle` - 接続ハンドル
    /// * `channel` - 接続への送信チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectedSession)` - 接続成功
    /// * `Err(ConnectError)` - 接続失敗（トランスポートには Close が積まれている）
    pub async fn execute(
        &self,
        handle: ConnectionHandle,
        channel: PusherChannel,
    ) -> Result<ConnectedSession, ConnectError> {
        // 1. スロットの確保
        let slot = match self.registry.acquire(handle, channel.clone()).await {
            Ok(slot) => slot,
            Err(e) => {
                let _ = channel.send(OutboundFrame::Close);
                return Err(e.into());
            }
        };

        // 2. 履歴の再送
        let replayed = self
            .history
            .replay(&mut |message| {
                channel
                    .send(OutboundFrame::Replay {
                        id: message.id,
                        payload: message.as_str().to_string(),
                    })
                    .map_err(|_| TransportError::ChannelClosed(handle))
            })
            .await;

        // 3. 再送完了のマーカー
        if channel.send(OutboundFrame::ReplayComplete).is_err() {
            tracing::debug!("Connection '{}' closed during replay", handle);
        }

        Ok(ConnectedSession { slot, replayed })
    }
}
