//! 在线状态广播
//!
//! 上线/下线事件向全部已注册连接扇出，
//! 并以尽力而为的方式异步持久化在线状态

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::model::PresenceStatus;
use crate::domain::repository::MessageStore;
use crate::infrastructure::presence::PresenceRegistry;
use crate::interface::events::ServerEvent;

/// 在线状态广播器
pub struct PresenceBroadcaster {
    registry: Arc<PresenceRegistry>,
    store: Arc<dyn MessageStore>,
}

impl PresenceBroadcaster {
    pub fn new(registry: Arc<PresenceRegistry>, store: Arc<dyn MessageStore>) -> Self {
        Self { registry, store }
    }

    /// 广播用户上线
    ///
    /// 扇出对象包含刚注册的新连接本身；
    /// 持久化失败只记录日志，不影响连接
    pub fn announce_online(&self, user_id: i64) {
        self.registry.broadcast(&ServerEvent::UserStatus {
            user_id,
            status: PresenceStatus::Online,
        });
        info!(user_id = user_id, "User online");

        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(err) = store.update_user_presence(user_id, true, None).await {
                warn!(?err, user_id = user_id, "Failed to persist online status");
            }
        });
    }

    /// 广播用户下线并记录最后在线时间
    pub fn announce_offline(&self, user_id: i64) {
        let last_seen = Utc::now();
        self.registry.broadcast(&ServerEvent::UserStatus {
            user_id,
            status: PresenceStatus::Offline,
        });
        info!(user_id = user_id, "User offline");

        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(err) = store
                .update_user_presence(user_id, false, Some(last_seen))
                .await
            {
                warn!(?err, user_id = user_id, "Failed to persist offline status");
            }
        });
    }
}
