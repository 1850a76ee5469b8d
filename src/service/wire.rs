//! Wire 风格的依赖注入模块
//!
//! 类似 Go 的 Wire 框架，按依赖顺序构建所有组件

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::services::{ConnectionService, MessageService, TypingService};
use crate::config::GatewayConfig;
use crate::domain::repository::{MessageStore, TokenVerifier};
use crate::infrastructure::auth::JwtTokenVerifier;
use crate::infrastructure::persistence::{InMemoryMessageStore, PostgresMessageStore};
use crate::infrastructure::presence::{PresenceBroadcaster, PresenceRegistry, RoomMembership};
use crate::interface::connection::EventDispatcher;
use crate::interface::gateway::ChatGateway;
use crate::metrics::GatewayMetrics;

/// 应用上下文 - 包含所有已初始化的服务
pub struct ApplicationContext {
    pub gateway: Arc<ChatGateway>,
}

/// 构建应用上下文
///
/// 按照依赖顺序构建所有组件：存储、在线状态、应用服务、网关
pub async fn initialize(config: Arc<GatewayConfig>) -> Result<ApplicationContext> {
    // 1. 指标
    let metrics = Arc::new(GatewayMetrics::new());

    // 2. 消息存储：配置了数据库用 PostgreSQL，否则退回内存存储
    let store: Arc<dyn MessageStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresMessageStore::connect(url)
                .await
                .context("Failed to initialize PostgreSQL message store")?;
            info!("Using PostgreSQL message store");
            Arc::new(store)
        }
        None => {
            warn!("No database configured, messages will not survive restarts");
            Arc::new(InMemoryMessageStore::new())
        }
    };

    // 3. 在线状态基础设施
    let registry = Arc::new(PresenceRegistry::new());
    let rooms = Arc::new(RoomMembership::new());
    let broadcaster = Arc::new(PresenceBroadcaster::new(registry.clone(), store.clone()));

    // 4. 应用服务
    let connection_service = Arc::new(ConnectionService::new(
        registry.clone(),
        rooms.clone(),
        broadcaster,
        metrics.clone(),
    ));
    let message_service = Arc::new(MessageService::new(
        store.clone(),
        registry.clone(),
        metrics.clone(),
    ));
    let typing_service = Arc::new(TypingService::new(registry, rooms, metrics.clone()));

    // 5. 准入与事件分发
    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtTokenVerifier::new(
        &config.token_secret,
        config.token_issuer.as_deref(),
    ));
    let dispatcher = Arc::new(EventDispatcher::new(
        connection_service.clone(),
        message_service,
        typing_service,
    ));

    // 6. 接入网关
    let gateway = Arc::new(ChatGateway::new(
        verifier,
        connection_service,
        dispatcher,
        metrics,
        config,
    ));

    Ok(ApplicationContext { gateway })
}
