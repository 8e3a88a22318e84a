//! InMemory MessageHistory 実装
//!
//! 容量 M のリングバッファ。`head` は次に書き込むスロットを指し、
//! 満杯のときは最も古いメッセージを上書きします。
//!
//! `append` と `replay` は 1 つの Mutex で全体を守ります。
//! `replay` 中の送信は接続ごとのバッファへの積み込みだけなので、
//! ロック内でネットワーク I/O を待つことはありません。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, HistoryError, MessageHistory, SequenceId, StoredMessage, TransportError,
};

struct Ring {
    slots: Vec<Option<StoredMessage>>,
    /// 次に書き込むスロット
    head: usize,
    /// 次に採番する ID
    next_id: SequenceId,
    /// 最後に採番した ID
    last_id: Option<SequenceId>,
}

impl Ring {
    /// 古い順のスロット
    fn chronological(&self) -> impl Iterator<Item = &StoredMessage> {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter()).flatten()
    }
}

/// インメモリ MessageHistory 実装
pub struct InMemoryMessageHistory {
    ring: Mutex<Ring>,
    capacity: usize,
}

impl InMemoryMessageHistory {
    /// 容量 `capacity` の履歴を作成
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            ring: Mutex::new(Ring {
                slots,
                head: 0,
                next_id: SequenceId::default(),
                last_id: None,
            }),
            capacity,
        }
    }
}

#[async_trait]
impl MessageHistory for InMemoryMessageHistory {
    async fn append(&self, mut message: ChatMessage) -> Result<StoredMessage, HistoryError> {
        let mut ring = self.ring.lock().await;

        let id = ring.next_id;
        message.assign_id(id);
        let payload: Arc<str> = message
            .to_canonical_json()
            .map_err(|e| HistoryError::Encode(e.to_string()))?
            .into();
        let stored = StoredMessage::new(id, message.timestamp(), payload);

        if ring.slots.is_empty() {
            // 容量 0 の場合は採番だけ進めて何も保持しない
            ring.next_id = id.next();
            ring.last_id = Some(id);
            return Ok(stored);
        }

        let head = ring.head;
        // 上書きされる古いペイロードはここで解放される
        ring.slots[head] = Some(stored.clone());
        ring.head = (head + 1) % ring.slots.len();
        ring.next_id = id.next();
        ring.last_id = Some(id);

        tracing::debug!("Stored message {} in history slot {}", id, head);
        Ok(stored)
    }

    async fn replay(
        &self,
        send: &mut (dyn for<'a> FnMut(&'a StoredMessage) -> Result<(), TransportError> + Send),
    ) -> usize {
        let ring = self.ring.lock().await;
        let mut sent = 0;
        for message in ring.chronological() {
            match send(message) {
                Ok(()) => sent += 1,
                Err(e) => {
                    tracing::warn!("Failed to replay message {}: {}", message.id, e);
                }
            }
        }
        sent
    }

    async fn snapshot(&self) -> Vec<StoredMessage> {
        let ring = self.ring.lock().await;
        ring.chronological().cloned().collect()
    }

    async fn count(&self) -> usize {
        let ring = self.ring.lock().await;
        ring.slots.iter().flatten().count()
    }

    async fn last_id(&self) -> Option<SequenceId> {
        self.ring.lock().await.last_id
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
