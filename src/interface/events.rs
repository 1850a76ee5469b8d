//! 线路事件定义
//!
//! 每个帧是 `{"event": <名称>, "data": {...}}` 形式的 JSON 文本

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::model::{Message, PresenceStatus, SendMessageRequest};

/// 客户端入站事件
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "message:send")]
    MessageSend(SendMessageRequest),

    #[serde(rename = "typing:start")]
    #[serde(rename_all = "camelCase")]
    TypingStart { receiver_id: i64 },

    #[serde(rename = "typing:stop")]
    #[serde(rename_all = "camelCase")]
    TypingStop { receiver_id: i64 },

    #[serde(rename = "typing:group:start")]
    #[serde(rename_all = "camelCase")]
    TypingGroupStart { group_id: i64 },

    #[serde(rename = "typing:group:stop")]
    #[serde(rename_all = "camelCase")]
    TypingGroupStop { group_id: i64 },

    #[serde(rename = "room:join")]
    #[serde(rename_all = "camelCase")]
    RoomJoin { group_id: i64 },

    #[serde(rename = "room:leave")]
    #[serde(rename_all = "camelCase")]
    RoomLeave { group_id: i64 },
}

/// 服务端出站事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "user:status")]
    #[serde(rename_all = "camelCase")]
    UserStatus { user_id: i64, status: PresenceStatus },

    #[serde(rename = "message:sent")]
    MessageSent(Message),

    #[serde(rename = "message:receive")]
    MessageReceive(Message),

    #[serde(rename = "message:error")]
    #[serde(rename_all = "camelCase")]
    MessageError { error: String, original_message: Value },

    #[serde(rename = "typing:start")]
    #[serde(rename_all = "camelCase")]
    TypingStart { user_id: i64 },

    #[serde(rename = "typing:stop")]
    #[serde(rename_all = "camelCase")]
    TypingStop { user_id: i64 },

    #[serde(rename = "typing:group:start")]
    #[serde(rename_all = "camelCase")]
    TypingGroupStart { user_id: i64, name: String },

    #[serde(rename = "typing:group:stop")]
    #[serde(rename_all = "camelCase")]
    TypingGroupStop { user_id: i64 },
}
