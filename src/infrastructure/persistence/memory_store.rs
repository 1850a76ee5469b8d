//! 内存消息存储
//!
//! 用于测试与未配置数据库时的本地运行，进程退出即丢失

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::model::{ConversationMessage, Message, NewMessage, UserRecord};
use crate::domain::repository::MessageStore;

/// 内存消息存储
pub struct InMemoryMessageStore {
    users: RwLock<HashMap<i64, UserRecord>>,
    messages: RwLock<Vec<Message>>,
    next_id: AtomicI64,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            messages: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// 写入用户记录（测试与本地运行的种子数据）
    pub async fn insert_user(&self, id: i64, name: &str) {
        let mut users = self.users.write().await;
        users.insert(
            id,
            UserRecord {
                id,
                name: name.to_string(),
                is_online: false,
                last_seen: None,
            },
        );
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message> {
        let now = Utc::now();
        let record = Message {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            content: message.content,
            message_type: message.message_type,
            sender_id: message.sender_id,
            receiver_id: Some(message.receiver_id),
            group_id: None,
            is_read: false,
            read_at: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let mut messages = self.messages.write().await;
        messages.push(record.clone());
        Ok(record)
    }

    async fn find_message(&self, message_id: i64) -> Result<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|m| m.id == message_id).cloned())
    }

    async fn update_read_status(&self, message_id: i64, read_at: DateTime<Utc>) -> Result<Message> {
        let mut messages = self.messages.write().await;
        let record = messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| anyhow!("Message not found: {}", message_id))?;

        record.is_read = true;
        record.read_at = Some(read_at);
        record.updated_at = read_at;
        Ok(record.clone())
    }

    async fn list_messages_between(
        &self,
        user_a: i64,
        user_b: i64,
    ) -> Result<Vec<ConversationMessage>> {
        let users = self.users.read().await;
        let messages = self.messages.read().await;

        let mut result: Vec<ConversationMessage> = messages
            .iter()
            .filter(|m| {
                (m.sender_id == user_a && m.receiver_id == Some(user_b))
                    || (m.sender_id == user_b && m.receiver_id == Some(user_a))
            })
            .map(|m| ConversationMessage {
                sender_name: users
                    .get(&m.sender_id)
                    .map(|u| u.name.clone())
                    .unwrap_or_else(|| format!("user-{}", m.sender_id)),
                message: m.clone(),
            })
            .collect();

        result.sort_by(|a, b| {
            a.message
                .created_at
                .cmp(&b.message.created_at)
                .then(a.message.id.cmp(&b.message.id))
        });
        Ok(result)
    }

    async fn update_user_presence(
        &self,
        user_id: i64,
        is_online: bool,
        last_seen: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&user_id) {
            user.is_online = is_online;
            if last_seen.is_some() {
                user.last_seen = last_seen;
            }
        }
        Ok(())
    }
}
