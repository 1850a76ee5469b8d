//! 群组房间订阅
//!
//! 连接级别的临时订阅：随连接存活，断开即失效，重连后需重新订阅。
//! 不做任何持久化。

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::infrastructure::presence::ConnectionHandle;

/// 房间成员表
pub struct RoomMembership {
    rooms: DashMap<i64, Vec<Arc<ConnectionHandle>>>,
}

impl RoomMembership {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// 订阅群组房间，重复订阅为空操作
    pub fn subscribe(&self, group_id: i64, handle: Arc<ConnectionHandle>) {
        let mut members = self.rooms.entry(group_id).or_default();
        if members
            .iter()
            .any(|conn| conn.connection_id == handle.connection_id)
        {
            return;
        }
        debug!(
            group_id = group_id,
            connection_id = %handle.connection_id,
            "Connection subscribed to room"
        );
        members.push(handle);
    }

    /// 取消订阅
    pub fn unsubscribe(&self, group_id: i64, connection_id: &str) {
        if let Some(mut members) = self.rooms.get_mut(&group_id) {
            members.retain(|conn| conn.connection_id != connection_id);
        }
        self.rooms.remove_if(&group_id, |_, members| members.is_empty());
    }

    /// 移除连接在所有房间的订阅（连接断开时调用）
    pub fn leave_all(&self, connection_id: &str) {
        self.rooms.retain(|_, members| {
            members.retain(|conn| conn.connection_id != connection_id);
            !members.is_empty()
        });
    }

    /// 房间当前订阅的连接
    pub fn members(&self, group_id: i64) -> Vec<Arc<ConnectionHandle>> {
        self.rooms
            .get(&group_id)
            .map(|members| members.clone())
            .unwrap_or_default()
    }
}

impl Default for RoomMembership {
    fn default() -> Self {
        Self::new()
    }
}
