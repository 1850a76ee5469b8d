//! 输入状态中继服务
//!
//! 输入指示器是瞬时信号：不落盘、不确认、不重试，
//! 接收方不在线时直接丢弃

use std::sync::Arc;

use tracing::debug;

use crate::domain::model::TypingPhase;
use crate::infrastructure::presence::{PresenceRegistry, RoomMembership};
use crate::interface::events::ServerEvent;
use crate::metrics::GatewayMetrics;

/// 输入状态中继服务
pub struct TypingService {
    registry: Arc<PresenceRegistry>,
    rooms: Arc<RoomMembership>,
    metrics: Arc<GatewayMetrics>,
}

impl TypingService {
    pub fn new(
        registry: Arc<PresenceRegistry>,
        rooms: Arc<RoomMembership>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            registry,
            rooms,
            metrics,
        }
    }

    /// 中继私聊输入状态到接收方的所有连接
    pub fn relay_direct(&self, sender_id: i64, receiver_id: i64, phase: TypingPhase) {
        let event = match phase {
            TypingPhase::Start => ServerEvent::TypingStart { user_id: sender_id },
            TypingPhase::Stop => ServerEvent::TypingStop { user_id: sender_id },
        };

        let connections = self.registry.connections(receiver_id);
        if connections.is_empty() {
            debug!(
                sender_id = sender_id,
                receiver_id = receiver_id,
                "Typing recipient offline, dropping indicator"
            );
            return;
        }

        for conn in connections {
            if conn.push(event.clone()) {
                self.metrics.typing_relayed_total.inc();
            }
        }
    }

    /// 中继群聊输入状态到房间内除发送方连接外的所有成员
    ///
    /// 停止事件不携带用户名，只需用户 ID 即可清除指示器
    pub fn relay_group(
        &self,
        sender_id: i64,
        sender_name: &str,
        group_id: i64,
        phase: TypingPhase,
        sender_connection_id: &str,
    ) {
        let event = match phase {
            TypingPhase::Start => ServerEvent::TypingGroupStart {
                user_id: sender_id,
                name: sender_name.to_string(),
            },
            TypingPhase::Stop => ServerEvent::TypingGroupStop { user_id: sender_id },
        };

        for conn in self.rooms.members(group_id) {
            if conn.connection_id == sender_connection_id {
                continue;
            }
            if conn.push(event.clone()) {
                self.metrics.typing_relayed_total.inc();
            }
        }
    }
}
