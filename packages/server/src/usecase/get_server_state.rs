//! UseCase: サーバー状態の取得（診断用）

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, ConnectionSummary, MessageHistory, SequenceId};

/// レジストリと履歴のスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerState {
    pub capacity: usize,
    pub connections: Vec<ConnectionSummary>,
    pub history_count: usize,
    pub history_capacity: usize,
    pub last_id: Option<SequenceId>,
}

/// サーバー状態取得のユースケース
pub struct GetServerStateUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    history: Arc<dyn MessageHistory>,
}

impl GetServerStateUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>, history: Arc<dyn MessageHistory>) -> Self {
        Self { registry, history }
    }

    /// レジストリと履歴を順にロックしてスナップショットを作る（同時には保持しない）
    pub async fn execute(&self) -> ServerState {
        let connections = self.registry.snapshot().await;
        let history_count = self.history.count().await;
        let last_id = self.history.last_id().await;

        ServerState {
            capacity: self.registry.capacity(),
            connections,
            history_count,
            history_capacity: self.history.capacity(),
            last_id,
        }
    }
}
