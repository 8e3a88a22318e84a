//! UseCase: 切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectSessionUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 切断した接続のスロットが解放され、次の接続で再利用できることを保証
//! - ハートビートが先に解放した場合でも二重解放にならないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：接続中のスロットの解放
//! - エッジケース：既に解放済みの接続の切断（冪等性）

use std::sync::Arc;

use crate::domain::{ConnectionHandle, ConnectionRegistry};

/// 切断のユースケース
pub struct DisconnectSessionUseCase {
    /// ConnectionRegistry（接続の管理）
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectSessionUseCase {
    /// 新しい DisconnectSessionUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// スロットを解放した場合は `true`、既に解放済みの場合は `false`
    pub async fn execute(&self, handle: &ConnectionHandle) -> bool {
        let released = self.registry.release(handle).await;
        if released {
            tracing::info!("Connection '{}' released its slot", handle);
        } else {
            tracing::debug!("Connection '{}' was already released", handle);
        }
        released
    }
}
