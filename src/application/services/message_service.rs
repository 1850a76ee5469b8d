//! 消息路由应用服务
//!
//! 先落盘、后投递：消息持久化成功才会尝试实时推送，
//! 推送本身是一次性的尽力而为，失败不回滚、不上报发送方

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::domain::model::{ConversationMessage, Message, NewMessage, SendMessageRequest};
use crate::domain::repository::MessageStore;
use crate::error::{GatewayError, GatewayResult};
use crate::infrastructure::presence::PresenceRegistry;
use crate::interface::events::ServerEvent;
use crate::metrics::GatewayMetrics;

/// 消息路由服务
pub struct MessageService {
    store: Arc<dyn MessageStore>,
    registry: Arc<PresenceRegistry>,
    metrics: Arc<GatewayMetrics>,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        registry: Arc<PresenceRegistry>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            store,
            registry,
            metrics,
        }
    }

    /// 发送消息
    ///
    /// 流程：
    /// 1. 校验载荷（任何 I/O 之前）
    /// 2. 解析接收方是否存在
    /// 3. 持久化消息记录（失败对本次调用致命）
    /// 4. 向在线接收方推送（尽力而为）
    /// 5. 返回已持久化的记录
    #[instrument(skip(self, request), fields(sender_id = sender_id, receiver_id = request.receiver_id))]
    pub async fn send_message(
        &self,
        sender_id: i64,
        request: SendMessageRequest,
    ) -> GatewayResult<Message> {
        request.validate()?;

        let receiver = self
            .store
            .find_user(request.receiver_id)
            .await
            .map_err(|err| GatewayError::Persistence(err.to_string()))?
            .ok_or_else(|| {
                GatewayError::NotFound(format!("Receiver not found: {}", request.receiver_id))
            })?;

        let message = self
            .store
            .create_message(NewMessage {
                sender_id,
                receiver_id: receiver.id,
                content: request.content,
                message_type: request.message_type,
            })
            .await
            .map_err(|err| {
                warn!(?err, sender_id = sender_id, "Failed to persist message");
                GatewayError::Persistence(err.to_string())
            })?;

        self.metrics.messages_routed_total.inc();

        // 记录已落盘，推送失败与否都向发送方确认成功
        self.deliver_live(receiver.id, &message);

        Ok(message)
    }

    /// 实时投递给接收方的所有活跃连接
    ///
    /// 接收方不在线或连接恰好在注销中都静默跳过
    fn deliver_live(&self, receiver_id: i64, message: &Message) {
        let connections = self.registry.connections(receiver_id);
        if connections.is_empty() {
            debug!(
                receiver_id = receiver_id,
                message_id = message.id,
                "Recipient offline, skipping live delivery"
            );
            return;
        }

        for conn in connections {
            if !conn.push(ServerEvent::MessageReceive(message.clone())) {
                self.metrics.pushes_dropped_total.inc();
                debug!(
                    receiver_id = receiver_id,
                    connection_id = %conn.connection_id,
                    message_id = message.id,
                    "Recipient connection closed during delivery"
                );
            }
        }
    }

    /// 查询两个用户之间的会话消息，按创建时间升序
    pub async fn get_conversation(
        &self,
        user_id: i64,
        other_user_id: i64,
    ) -> GatewayResult<Vec<ConversationMessage>> {
        self.store
            .list_messages_between(user_id, other_user_id)
            .await
            .map_err(|err| GatewayError::Persistence(err.to_string()))
    }

    /// 标记消息已读
    ///
    /// 仅接收方可标记；不向原发送方推送已读回执
    #[instrument(skip(self), fields(message_id = message_id, user_id = requesting_user_id))]
    pub async fn mark_as_read(
        &self,
        message_id: i64,
        requesting_user_id: i64,
    ) -> GatewayResult<Message> {
        let message = self
            .store
            .find_message(message_id)
            .await
            .map_err(|err| GatewayError::Persistence(err.to_string()))?
            .ok_or_else(|| GatewayError::NotFound(format!("Message not found: {}", message_id)))?;

        if message.receiver_id != Some(requesting_user_id) {
            return Err(GatewayError::Forbidden(
                "You are not authorized to mark this message as read".to_string(),
            ));
        }

        self.store
            .update_read_status(message_id, Utc::now())
            .await
            .map_err(|err| GatewayError::Persistence(err.to_string()))
    }
}
