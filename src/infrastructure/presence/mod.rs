//! 在线状态基础设施
//!
//! 连接句柄、在线注册表、群组房间订阅与状态广播

pub mod broadcaster;
pub mod registry;
pub mod rooms;

#[cfg(test)]
mod rooms_test;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::interface::events::ServerEvent;

pub use broadcaster::PresenceBroadcaster;
pub use registry::{PresenceRegistry, RegisterOutcome, UnregisterOutcome};
pub use rooms::RoomMembership;

/// 连接句柄
///
/// 代表一条已认证的长连接，生命周期由网关独占管理。
/// 出站事件通过无界通道异步下发，慢接收端不会阻塞发送方。
#[derive(Debug)]
pub struct ConnectionHandle {
    pub connection_id: String,
    pub user_id: i64,
    pub name: String,
    pub connected_at: DateTime<Utc>,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(user_id: i64, name: String, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            connection_id: Uuid::new_v4().to_string(),
            user_id,
            name,
            connected_at: Utc::now(),
            sender,
        }
    }

    /// 尽力而为地推送一个事件
    ///
    /// 通道已关闭（连接正在注销）时返回 false，视为接收端不存在
    pub fn push(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}
