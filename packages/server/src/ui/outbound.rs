//! 接続ごとの送信フレームの順序制御
//!
//! 接続は履歴の再送より先にレジストリに登録されるため、ライブのブロードキャストが
//! 再送メッセージより前（または途中）に積まれることがあります。
//! writer タスク内のゲートで、クライアントが観測すべき順序に並べ直します。
//! 再送メッセージが先、その後にライブのメッセージで、同じ ID は一度だけ送ります。

use std::collections::VecDeque;

use crate::domain::{OutboundFrame, SequenceId};

/// トランスポートに書き込むフレーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireFrame {
    Text(String),
    Close,
}

/// 接続ごとの順序制御ゲート
#[derive(Debug)]
pub struct OutboundGate {
    replaying: bool,
    last_replayed: Option<SequenceId>,
    held: VecDeque<(SequenceId, String)>,
}

impl Default for OutboundGate {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboundGate {
    pub fn new() -> Self {
        Self {
            replaying: true,
            last_replayed: None,
            held: VecDeque::new(),
        }
    }

    /// 送信バッファのフレームを 1 つ受け取り、今書き込むべきフレームを返す
    ///
    /// - ライブのチャットは `ReplayComplete` まで保留する
    /// - 再送済みの ID のチャットは捨てる
    /// - 制御フレームと Close はそのまま通す
    pub fn push(&mut self, frame: OutboundFrame) -> Vec<WireFrame> {
        match frame {
            OutboundFrame::Replay { id, payload } => {
                self.last_replayed = Some(id);
                vec![WireFrame::Text(payload)]
            }
            OutboundFrame::ReplayComplete => {
                self.replaying = false;
                let held = std::mem::take(&mut self.held);
                held.into_iter()
                    .filter(|(id, _)| !self.is_replayed(*id))
                    .map(|(_, payload)| WireFrame::Text(payload))
                    .collect()
            }
            OutboundFrame::Chat { id, payload } => {
                if self.is_replayed(id) {
                    return Vec::new();
                }
                if self.replaying {
                    self.held.push_back((id, payload));
                    return Vec::new();
                }
                vec![WireFrame::Text(payload)]
            }
            OutboundFrame::Control(payload) => vec![WireFrame::Text(payload)],
            OutboundFrame::Close => vec![WireFrame::Close],
        }
    }

    fn is_replayed(&self, id: SequenceId) -> bool {
        self.last_replayed.is_some_and(|last| id <= last)
    }
}
