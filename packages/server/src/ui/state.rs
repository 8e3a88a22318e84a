//! Shared application state.

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::usecase::GetServerStateUseCase;

use super::session::SessionHandler;

/// Shared application state
pub struct AppState {
    /// SessionHandler（接続ごとの状態遷移）
    pub session_handler: Arc<SessionHandler>,
    /// GetServerStateUseCase（診断用の状態取得）
    pub get_server_state_usecase: Arc<GetServerStateUseCase>,
    /// 時刻の取得
    pub clock: Arc<dyn Clock>,
    /// WebSocket 層のメッセージサイズ上限（バイト）
    pub transport_limit_bytes: usize,
}
