//! UseCase: ハートビートによる生存確認
//!
//! 周期 T ごとに全ての active な接続を走査します。
//!
//! ```text
//! ResponsiveWindow --tick--> AwaitingPong --pong--> ResponsiveWindow
//!                                   |
//!                                 tick
//!                                   v
//!                                Evicted
//! ```
//!
//! - tick 時点で alive = false の接続はトランスポートを閉じてスロットを解放する
//! - それ以外は alive = false にして ping を送る
//! - pong を受信したら alive = true に戻す
//!
//! 生き残るには 2 周期ごとに少なくとも 1 回の応答が必要です。

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::domain::{ConnectionHandle, ConnectionRegistry, OutboundFrame, Visit};

/// 1 回の tick の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartbeatReport {
    /// ping を送った接続数
    pub pinged: usize,
    /// 退去させた接続
    pub evicted: Vec<ConnectionHandle>,
}

/// ハートビートのユースケース
pub struct HeartbeatUseCase {
    /// ConnectionRegistry（接続の管理）
    registry: Arc<dyn ConnectionRegistry>,
    /// ping メッセージ（DTO 層で生成されたもの）
    ping_message: String,
}

impl HeartbeatUseCase {
    /// 新しい HeartbeatUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, ping_message: impl Into<String>) -> Self {
        Self {
            registry,
            ping_message: ping_message.into(),
        }
    }

    /// 1 周期分の生存確認
    ///
    /// レジストリのロックを保持したまま走査し、退去もその場で行います。
    pub async fn tick(&self) -> HeartbeatReport {
        let mut report = HeartbeatReport::default();
        let ping = &self.ping_message;

        self.registry
            .for_each_active(&mut |connection| {
                if !connection.alive {
                    connection.force_close();
                    report.evicted.push(connection.handle);
                    return Visit::Release;
                }

                connection.alive = false;
                if let Err(e) = connection.send(OutboundFrame::Control(ping.clone())) {
                    tracing::warn!("Failed to send ping: {}", e);
                }
                report.pinged += 1;
                Visit::Keep
            })
            .await;

        for handle in &report.evicted {
            tracing::info!("Connection '{}' evicted: no pong since last heartbeat", handle);
        }
        report
    }

    /// pong を受信した接続を ResponsiveWindow に戻す
    pub async fn record_pong(&self, handle: &ConnectionHandle) {
        self.registry.set_alive(handle, true).await;
        tracing::debug!("Pong received from '{}'", handle);
    }

    /// 周期 `period` で tick を実行するタスクを起動
    ///
    /// `interval` の最初の tick は即座に完了するため読み飛ばします。
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let report = self.tick().await;
                tracing::debug!(
                    "Heartbeat: pinged {}, evicted {}",
                    report.pinged,
                    report.evicted.len()
                );
            }
        })
    }
}
