//! 网关共享数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};

/// 消息类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    #[default]
    #[serde(rename = "TEXT")]
    Text,
    #[serde(rename = "FILE")]
    File,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "TEXT",
            MessageType::File => "FILE",
        }
    }
}

/// 聊天消息（持久化记录）
///
/// 仅由消息路由创建；已读标记仅由 mark_as_read 更新
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub sender_id: i64,
    /// 单聊接收方
    pub receiver_id: Option<i64>,
    /// 群聊目标
    pub group_id: Option<i64>,
    pub is_read: bool,
    /// 已读时间，未读时为 None
    pub read_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 会话消息（附带发送方昵称）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    #[serde(flatten)]
    pub message: Message,
    pub sender_name: String,
}

/// 用户记录（只读视图，由持久化协作方拥有）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub is_online: bool,
    /// 最后在线时间，从未离线过时为 None
    pub last_seen: Option<DateTime<Utc>>,
}

/// 新建消息参数
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub message_type: MessageType,
}

/// 附件元数据（文件内容存储不在网关职责内）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequest {
    pub file_name: Option<String>,
    pub path: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
}

/// 发送消息请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: i64,
    pub content: String,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileRequest>,
}

impl SendMessageRequest {
    /// 校验请求载荷，任何 I/O 之前执行
    pub fn validate(&self) -> GatewayResult<()> {
        if self.content.trim().is_empty() {
            return Err(GatewayError::Validation("Content cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// 在线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// 输入状态阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingPhase {
    Start,
    Stop,
}

/// 认证通过的用户身份
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub name: String,
}
