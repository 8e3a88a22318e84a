//! WebSocket を使った MessagePusher 実装（ブロードキャストエンジン）
//!
//! ## 責務
//!
//! - レジストリのロックを保持したまま、全ての active な接続に送信する
//!
//! ## 設計ノート
//!
//! 送信は接続ごとの `PusherChannel` に積むだけで、WebSocket への書き込みは
//! UI 層の writer タスクが行います。そのためロック内でネットワーク I/O を待ちません。
//! 一部の接続への送信失敗はログに残し、再送はしません。

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    BroadcastReport, ConnectionRegistry, MessagePusher, OutboundFrame, StoredMessage, Visit,
};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// 送信先を保持するレジストリ
    registry: Arc<dyn ConnectionRegistry>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn broadcast(&self, message: &StoredMessage) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        self.registry
            .for_each_active(&mut |connection| {
                let frame = OutboundFrame::Chat {
                    id: message.id,
                    payload: message.as_str().to_string(),
                };
                // ブロードキャストでは一部の送信失敗を許容
                match connection.send(frame) {
                    Ok(()) => {
                        report.delivered += 1;
                        tracing::debug!(
                            "Broadcasted message {} to connection '{}'",
                            message.id,
                            connection.handle
                        );
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!("Failed to broadcast message {}: {}", message.id, e);
                    }
                }
                Visit::Keep
            })
            .await;

        tracing::info!(
            "Broadcast of message {} finished: {} delivered, {} failed",
            message.id,
            report.delivered,
            report.failed
        );
        report
    }
}
