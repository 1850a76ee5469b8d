//! 连接管理应用服务
//!
//! 编排连接生命周期：注册、房间订阅、注销与在线状态广播

use std::sync::Arc;

use tracing::{info, instrument};

use crate::infrastructure::presence::{
    ConnectionHandle, PresenceBroadcaster, PresenceRegistry, RoomMembership,
};
use crate::metrics::GatewayMetrics;

/// 连接管理应用服务
///
/// 职责：
/// - 连接准入后的注册与上线广播
/// - 连接断开后的注销与下线广播
/// - 房间订阅的挂载与清理
pub struct ConnectionService {
    registry: Arc<PresenceRegistry>,
    rooms: Arc<RoomMembership>,
    broadcaster: Arc<PresenceBroadcaster>,
    metrics: Arc<GatewayMetrics>,
}

impl ConnectionService {
    pub fn new(
        registry: Arc<PresenceRegistry>,
        rooms: Arc<RoomMembership>,
        broadcaster: Arc<PresenceBroadcaster>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            registry,
            rooms,
            broadcaster,
            metrics,
        }
    }

    /// 处理连接建立
    ///
    /// 注册与上线广播在准入路径上同步完成：连接一旦可被观测到，
    /// 必然同时可在注册表中被发现
    #[instrument(skip(self, handle), fields(user_id = handle.user_id, connection_id = %handle.connection_id))]
    pub fn handle_connect(&self, handle: Arc<ConnectionHandle>) {
        let user_id = handle.user_id;
        let outcome = self.registry.register(handle);

        self.metrics.connections_total.inc();
        self.metrics
            .connections_active
            .set(self.registry.connection_count() as i64);

        info!(
            user_id = user_id,
            active_connections = self.registry.connection_count(),
            "Connection established"
        );

        // 仅该用户的首条连接触发上线广播
        if outcome.first_for_user {
            self.broadcaster.announce_online(user_id);
        }
    }

    /// 处理连接断开
    ///
    /// 底层传输重复上报关闭时只生效一次（注册表幂等注销）
    #[instrument(skip(self), fields(user_id, connection_id = %connection_id))]
    pub fn handle_disconnect(&self, user_id: i64, connection_id: &str) {
        self.rooms.leave_all(connection_id);

        let outcome = self.registry.unregister(user_id, connection_id);
        if !outcome.removed {
            return;
        }

        self.metrics
            .connections_active
            .set(self.registry.connection_count() as i64);

        info!(
            user_id = user_id,
            active_connections = self.registry.connection_count(),
            "Connection disconnected"
        );

        // 仅最后一条连接消失时触发下线广播
        if outcome.last_for_user {
            self.broadcaster.announce_offline(user_id);
        }
    }

    /// 订阅群组房间
    pub fn join_room(&self, group_id: i64, handle: Arc<ConnectionHandle>) {
        self.rooms.subscribe(group_id, handle);
    }

    /// 退出群组房间
    pub fn leave_room(&self, group_id: i64, connection_id: &str) {
        self.rooms.unsubscribe(group_id, connection_id);
    }

    /// 当前活跃连接数（准入限流使用）
    pub fn active_connections(&self) -> usize {
        self.registry.connection_count()
    }
}
