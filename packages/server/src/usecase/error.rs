//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{ConnectionHandle, HistoryError, RegistryError};

/// 接続処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// 空きスロットが無い
    #[error("Connection capacity exceeded ({capacity} slots)")]
    CapacityExceeded { capacity: usize },

    /// 同じハンドルが既に接続中
    #[error("Connection '{0}' is already registered")]
    DuplicateHandle(ConnectionHandle),
}

impl From<RegistryError> for ConnectError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Full { capacity } => Self::CapacityExceeded { capacity },
            RegistryError::DuplicateHandle(handle) => Self::DuplicateHandle(handle),
        }
    }
}

/// メッセージ送信処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// 履歴への保存に失敗（保存もブロードキャストもしない）
    #[error("Failed to store message: {0}")]
    Store(#[from] HistoryError),
}
