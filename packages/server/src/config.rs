//! Server configuration.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MAX_CONNECTIONS: usize = 10;
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4096;

/// トランスポートが受け付けるメッセージの下限（これを超えると接続が切れる）
pub const MIN_TRANSPORT_LIMIT_BYTES: usize = 1 << 20;

/// 設定値の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max connections must be at least 1")]
    ZeroConnections,

    #[error("history capacity must be at least 1")]
    ZeroHistoryCapacity,

    #[error("heartbeat interval must be greater than zero")]
    ZeroHeartbeatInterval,

    #[error("max frame size must be at least 1 byte")]
    ZeroFrameSize,
}

/// Validated server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// 同時接続数の上限 N
    pub max_connections: usize,
    /// 履歴の容量 M
    pub history_capacity: usize,
    /// ハートビートの周期 T
    pub heartbeat_interval: Duration,
    /// 受信フレームの最大サイズ（バイト）
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn new(
        max_connections: usize,
        history_capacity: usize,
        heartbeat_interval: Duration,
        max_frame_bytes: usize,
    ) -> Result<Self, ConfigError> {
        if max_connections == 0 {
            return Err(ConfigError::ZeroConnections);
        }
        if history_capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        if heartbeat_interval.is_zero() {
            return Err(ConfigError::ZeroHeartbeatInterval);
        }
        if max_frame_bytes == 0 {
            return Err(ConfigError::ZeroFrameSize);
        }

        Ok(Self {
            max_connections,
            history_capacity,
            heartbeat_interval,
            max_frame_bytes,
        })
    }

    /// WebSocket 層のメッセージサイズ上限
    ///
    /// `max_frame_bytes` を超えるフレームはセッションが捨てるため、
    /// トランスポートにはそれより十分大きい上限を設定します。
    pub fn transport_limit_bytes(&self) -> usize {
        self.max_frame_bytes
            .saturating_mul(16)
            .max(MIN_TRANSPORT_LIMIT_BYTES)
    }
}
