//! 在线连接注册表
//!
//! 用户身份到活跃连接集合的并发安全映射。
//! 同一用户允许多条连接（多端登录）：首条连接插入视为上线，
//! 最后一条移除视为下线。

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::infrastructure::presence::ConnectionHandle;
use crate::interface::events::ServerEvent;

/// 注册结果
#[derive(Debug, Clone, Copy)]
pub struct RegisterOutcome {
    /// 是否为该用户的首条连接（需要广播上线）
    pub first_for_user: bool,
}

/// 注销结果
#[derive(Debug, Clone, Copy)]
pub struct UnregisterOutcome {
    /// 给定连接此前是否确实在注册表中
    pub removed: bool,
    /// 移除后该用户是否不再有任何连接（需要广播下线）
    pub last_for_user: bool,
}

/// 在线连接注册表
///
/// 在网关启动时构建并注入各服务，不作为全局状态访问
pub struct PresenceRegistry {
    connections: DashMap<i64, Vec<Arc<ConnectionHandle>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// 注册一条已认证连接
    pub fn register(&self, handle: Arc<ConnectionHandle>) -> RegisterOutcome {
        let mut entry = self.connections.entry(handle.user_id).or_default();
        let first_for_user = entry.is_empty();
        entry.push(handle);
        RegisterOutcome { first_for_user }
    }

    /// 注销一条连接
    ///
    /// 幂等：给定连接不在注册表中时为空操作，
    /// 防止迟到的断连事件误伤同一用户的新连接
    pub fn unregister(&self, user_id: i64, connection_id: &str) -> UnregisterOutcome {
        let Some(mut entry) = self.connections.get_mut(&user_id) else {
            return UnregisterOutcome {
                removed: false,
                last_for_user: false,
            };
        };

        let before = entry.len();
        entry.retain(|conn| conn.connection_id != connection_id);
        let removed = entry.len() < before;
        let last_for_user = removed && entry.is_empty();
        drop(entry);

        if last_for_user {
            self.connections.remove_if(&user_id, |_, conns| conns.is_empty());
        }

        if !removed {
            debug!(
                user_id = user_id,
                connection_id = %connection_id,
                "Stale unregister ignored"
            );
        }

        UnregisterOutcome {
            removed,
            last_for_user,
        }
    }

    /// 用户当前是否在线
    pub fn is_online(&self, user_id: i64) -> bool {
        self.connections
            .get(&user_id)
            .map(|conns| !conns.is_empty())
            .unwrap_or(false)
    }

    /// 用户当前的活跃连接
    pub fn connections(&self, user_id: i64) -> Vec<Arc<ConnectionHandle>> {
        self.connections
            .get(&user_id)
            .map(|conns| conns.clone())
            .unwrap_or_default()
    }

    /// 向所有已注册连接广播一个事件
    pub fn broadcast(&self, event: &ServerEvent) {
        for entry in self.connections.iter() {
            for conn in entry.value() {
                conn.push(event.clone());
            }
        }
    }

    /// 当前活跃连接总数
    pub fn connection_count(&self) -> usize {
        self.connections.iter().map(|entry| entry.value().len()).sum()
    }

    /// 当前在线用户数
    pub fn online_user_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
