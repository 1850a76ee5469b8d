//! 入站事件分发
//!
//! 把一条连接上的文本帧解析为客户端事件并路由到对应服务。
//! 单个事件的失败只影响该事件：错误通过 message:error 回推给
//! 发起连接，连接本身保持存活。

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::application::services::{ConnectionService, MessageService, TypingService};
use crate::domain::model::TypingPhase;
use crate::infrastructure::presence::ConnectionHandle;
use crate::interface::events::{ClientEvent, ServerEvent};

/// 入站事件分发器
pub struct EventDispatcher {
    connections: Arc<ConnectionService>,
    messages: Arc<MessageService>,
    typing: Arc<TypingService>,
}

impl EventDispatcher {
    pub fn new(
        connections: Arc<ConnectionService>,
        messages: Arc<MessageService>,
        typing: Arc<TypingService>,
    ) -> Self {
        Self {
            connections,
            messages,
            typing,
        }
    }

    /// 分发一条文本帧
    ///
    /// 解析失败回推 message:error 并回显原始载荷；
    /// message:send 在独立任务中处理，不阻塞读循环
    pub fn dispatch(&self, handle: &Arc<ConnectionHandle>, raw: &str) {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                debug!(
                    connection_id = %handle.connection_id,
                    ?err,
                    "Dropping unparseable frame"
                );
                handle.push(ServerEvent::MessageError {
                    error: "Invalid message format".to_string(),
                    original_message: Value::String(raw.to_string()),
                });
                return;
            }
        };

        let payload = value.get("data").cloned().unwrap_or(Value::Null);
        let event: ClientEvent = match serde_json::from_value(value) {
            Ok(event) => event,
            Err(err) => {
                debug!(
                    connection_id = %handle.connection_id,
                    ?err,
                    "Dropping unrecognized event"
                );
                handle.push(ServerEvent::MessageError {
                    error: "Invalid message format".to_string(),
                    original_message: payload,
                });
                return;
            }
        };

        match event {
            ClientEvent::MessageSend(request) => {
                let messages = self.messages.clone();
                let handle = handle.clone();
                tokio::spawn(async move {
                    match messages.send_message(handle.user_id, request).await {
                        Ok(message) => {
                            handle.push(ServerEvent::MessageSent(message));
                        }
                        Err(err) => {
                            warn!(
                                user_id = handle.user_id,
                                ?err,
                                "Message send failed"
                            );
                            handle.push(ServerEvent::MessageError {
                                error: err.client_message(),
                                original_message: payload,
                            });
                        }
                    }
                });
            }
            ClientEvent::TypingStart { receiver_id } => {
                self.typing
                    .relay_direct(handle.user_id, receiver_id, TypingPhase::Start);
            }
            ClientEvent::TypingStop { receiver_id } => {
                self.typing
                    .relay_direct(handle.user_id, receiver_id, TypingPhase::Stop);
            }
            ClientEvent::TypingGroupStart { group_id } => {
                self.typing.relay_group(
                    handle.user_id,
                    &handle.name,
                    group_id,
                    TypingPhase::Start,
                    &handle.connection_id,
                );
            }
            ClientEvent::TypingGroupStop { group_id } => {
                self.typing.relay_group(
                    handle.user_id,
                    &handle.name,
                    group_id,
                    TypingPhase::Stop,
                    &handle.connection_id,
                );
            }
            ClientEvent::RoomJoin { group_id } => {
                self.connections.join_room(group_id, handle.clone());
            }
            ClientEvent::RoomLeave { group_id } => {
                self.connections.leave_room(group_id, &handle.connection_id);
            }
        }
    }
}
