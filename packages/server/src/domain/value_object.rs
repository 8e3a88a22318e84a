//! 値オブジェクト
//!
//! 接続ハンドル・表示名・シーケンス ID・タイムスタンプなど、
//! ドメインで使う小さな不変の値を定義します。

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// 表示名の最大バイト数
pub const DISPLAY_NAME_MAX_BYTES: usize = 31;

/// 接続直後に割り当てられる表示名
pub const DISPLAY_NAME_PLACEHOLDER: &str = "New User";

// ========================================
// ConnectionHandle
// ========================================

/// 接続ハンドル（トランスポートを識別する不透明な ID）
///
/// 受け付けたトランスポートごとに一意です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionHandle(Uuid);

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// ConnectionHandle の生成
pub struct ConnectionHandleFactory;

impl ConnectionHandleFactory {
    /// 新しい ConnectionHandle を生成（UUID v4）
    pub fn generate() -> ConnectionHandle {
        ConnectionHandle(Uuid::new_v4())
    }
}

// ========================================
// DisplayName
// ========================================

/// 表示名（最大 31 バイトの文字列）
///
/// 上限を超える入力は文字境界で切り詰められます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    /// 文字列から DisplayName を作成（上限を超える部分は切り詰める）
    ///
    /// 前後の空白を除いた結果が空の場合は `None` を返します。
    pub fn new(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut end = trimmed.len().min(DISPLAY_NAME_MAX_BYTES);
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        Some(Self(trimmed[..end].to_string()))
    }

    /// 接続直後のプレースホルダー名
    pub fn placeholder() -> Self {
        Self(DISPLAY_NAME_PLACEHOLDER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DisplayName {
    fn default() -> Self {
        Self::placeholder()
    }
}

// ========================================
// SequenceId
// ========================================

/// メッセージのシーケンス ID
///
/// 0 から始まり、保存されたチャットメッセージごとに 1 ずつ増えます。
/// オーバーフロー時のみ折り返します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct SequenceId(u64);

impl SequenceId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// 次の ID
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ========================================
// Timestamp
// ========================================

/// Unix タイムスタンプ（秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
