//! InMemory ConnectionRegistry 実装
//!
//! 容量固定のアリーナ（`Vec<Option<Connection>>`）で接続を管理します。
//! 生成時に容量分のスロットを確保し、以降は伸長しません。
//! `acquire` は先頭から線形に走査して最初の空きスロットを使います。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionHandle, ConnectionRegistry, ConnectionSummary, DisplayName,
    PusherChannel, RegistryError, Visit,
};

/// インメモリ ConnectionRegistry 実装
pub struct InMemoryConnectionRegistry {
    /// スロット（`Some` が active な接続）
    slots: Mutex<Vec<Option<Connection>>>,
    capacity: usize,
}

impl InMemoryConnectionRegistry {
    /// 容量 `capacity` のレジストリを作成
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots: Mutex::new(slots),
            capacity,
        }
    }
}

fn position_of(slots: &[Option<Connection>], handle: &ConnectionHandle) -> Option<usize> {
    slots
        .iter()
        .position(|slot| matches!(slot, Some(c) if &c.handle == handle))
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn acquire(
        &self,
        handle: ConnectionHandle,
        channel: PusherChannel,
    ) -> Result<usize, RegistryError> {
        let mut slots = self.slots.lock().await;

        if position_of(&slots, &handle).is_some() {
            return Err(RegistryError::DuplicateHandle(handle));
        }

        let index = slots
            .iter()
            .position(Option::is_none)
            .ok_or(RegistryError::Full {
                capacity: self.capacity,
            })?;

        slots[index] = Some(Connection::new(handle, channel));
        tracing::debug!("Connection '{}' acquired slot {}", handle, index);
        Ok(index)
    }

    async fn release(&self, handle: &ConnectionHandle) -> bool {
        let mut slots = self.slots.lock().await;
        match position_of(&slots, handle) {
            Some(index) => {
                slots[index] = None;
                tracing::debug!("Connection '{}' released slot {}", handle, index);
                true
            }
            None => false,
        }
    }

    async fn set_alive(&self, handle: &ConnectionHandle, alive: bool) {
        let mut slots = self.slots.lock().await;
        if let Some(connection) = slots.iter_mut().flatten().find(|c| &c.handle == handle) {
            connection.alive = alive;
        }
    }

    async fn rename(&self, handle: &ConnectionHandle, name: DisplayName) {
        let mut slots = self.slots.lock().await;
        if let Some(connection) = slots.iter_mut().flatten().find(|c| &c.handle == handle) {
            connection.name = name;
        }
    }

    async fn for_each_active(
        &self,
        visitor: &mut (dyn for<'a> FnMut(&'a mut Connection) -> Visit + Send),
    ) {
        let mut slots = self.slots.lock().await;
        for slot in slots.iter_mut() {
            let release = match slot {
                Some(connection) => visitor(connection) == Visit::Release,
                None => false,
            };
            if release {
                *slot = None;
            }
        }
    }

    async fn snapshot(&self) -> Vec<ConnectionSummary> {
        let slots = self.slots.lock().await;
        slots.iter().flatten().map(Connection::summary).collect()
    }

    async fn count_active(&self) -> usize {
        let slots = self.slots.lock().await;
        slots.iter().flatten().count()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
