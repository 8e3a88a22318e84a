//! エンティティ
//!
//! - `Connection`: レジストリが排他的に所有する接続
//! - `ChatMessage`: クライアントから受信したチャットメッセージ（任意フィールドを保持）
//! - `StoredMessage`: 履歴に保存されたメッセージ（ID 付与・正規化済み）

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{
    ConnectionHandle, DisplayName, OutboundFrame, PusherChannel, SequenceId, Timestamp,
    TransportError,
};

/// 識別子フィールド名
pub const FIELD_TYPE: &str = "type";
/// サーバーが付与する ID のフィールド名
pub const FIELD_ID: &str = "id";
/// タイムスタンプのフィールド名
pub const FIELD_TIMESTAMP: &str = "timestamp";
/// 表示名のフィールド名
pub const FIELD_NAME: &str = "name";

// ========================================
// Connection
// ========================================

/// 接続
///
/// レジストリのスロットに格納されている間だけ active です。
/// `alive` はハートビートが毎 tick で false にし、pong 受信で true に戻ります。
#[derive(Debug)]
pub struct Connection {
    pub handle: ConnectionHandle,
    pub alive: bool,
    pub name: DisplayName,
    channel: PusherChannel,
}

impl Connection {
    /// ハンドシェイク完了直後の接続を作成（alive = true, 表示名はプレースホルダー）
    pub fn new(handle: ConnectionHandle, channel: PusherChannel) -> Self {
        Self {
            handle,
            alive: true,
            name: DisplayName::placeholder(),
            channel,
        }
    }

    /// フレームをトランスポートのバッファに積む（ブロックしない）
    pub fn send(&self, frame: OutboundFrame) -> Result<(), TransportError> {
        self.channel
            .send(frame)
            .map_err(|_| TransportError::ChannelClosed(self.handle))
    }

    /// トランスポートを強制的に閉じる
    ///
    /// 書き込み側が既に終了している場合は何もしません。
    pub fn force_close(&self) {
        if self.channel.send(OutboundFrame::Close).is_err() {
            tracing::debug!("Connection '{}' already closed", self.handle);
        }
    }

    pub fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            handle: self.handle,
            name: self.name.clone(),
            alive: self.alive,
        }
    }
}

/// レジストリ外に持ち出せる接続のスナップショット
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSummary {
    pub handle: ConnectionHandle,
    pub name: DisplayName,
    pub alive: bool,
}

/// `for_each_active` の visitor が返す指示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// スロットをそのまま維持
    Keep,
    /// スロットを解放
    Release,
}

// ========================================
// ChatMessage
// ========================================

/// クライアントから受信したチャットメッセージ
///
/// クライアントが送った任意のフィールドをそのまま保持します。
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    fields: Map<String, Value>,
}

impl ChatMessage {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn has_timestamp(&self) -> bool {
        self.fields.contains_key(FIELD_TIMESTAMP)
    }

    /// `timestamp` が無い場合のみ付与する
    ///
    /// クライアントが指定したタイムスタンプは上書きしません。
    /// 付与した場合は `true` を返します。
    pub fn stamp_if_missing(&mut self, now: Timestamp) -> bool {
        if self.has_timestamp() {
            return false;
        }
        self.fields
            .insert(FIELD_TIMESTAMP.to_string(), Value::from(now.value()));
        true
    }

    /// 整数として解釈できるタイムスタンプ
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.fields
            .get(FIELD_TIMESTAMP)
            .and_then(Value::as_i64)
            .map(Timestamp::new)
    }

    /// `name` フィールドが文字列の場合の表示名
    pub fn display_name(&self) -> Option<DisplayName> {
        self.fields
            .get(FIELD_NAME)
            .and_then(Value::as_str)
            .and_then(DisplayName::new)
    }

    /// サーバーが採番した ID を付与（クライアントが送った `id` は置き換える）
    pub fn assign_id(&mut self, id: SequenceId) {
        self.fields
            .insert(FIELD_ID.to_string(), Value::from(id.value()));
    }

    /// 正規化された JSON 文字列に変換
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.fields)
    }
}

// ========================================
// StoredMessage
// ========================================

/// 履歴に保存されたメッセージ
///
/// `payload` は ID とタイムスタンプを含む正規化済み JSON です。
/// 長期間保持される参照はリングのスロットが持つ 1 つだけで、
/// 送信やリプレイ時には一時的な clone を渡します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: SequenceId,
    pub timestamp: Option<Timestamp>,
    pub payload: Arc<str>,
}

impl StoredMessage {
    pub fn new(id: SequenceId, timestamp: Option<Timestamp>, payload: Arc<str>) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.payload
    }
}
