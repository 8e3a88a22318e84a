//! ドメイン層のエラー定義

use thiserror::Error;

use super::ConnectionHandle;

/// ConnectionRegistry のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// 空きスロットが無い
    #[error("Connection registry is full ({capacity} slots)")]
    Full { capacity: usize },

    /// 同じハンドルが既に active
    #[error("Connection '{0}' is already registered")]
    DuplicateHandle(ConnectionHandle),
}

/// MessageHistory のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// ペイロードの複製（シリアライズ）に失敗
    #[error("Failed to encode message: {0}")]
    Encode(String),
}

/// トランスポートのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// 書き込み側が既に終了している
    #[error("Transport for connection '{0}' is closed")]
    ChannelClosed(ConnectionHandle),
}
