//! PostgreSQL 消息存储

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, Pool, Postgres};

use crate::domain::model::{
    ConversationMessage, Message, MessageType, NewMessage, UserRecord,
};
use crate::domain::repository::MessageStore;

const MESSAGE_COLUMNS: &str =
    "id, content, message_type, sender_id, receiver_id, group_id, is_read, read_at, \
     is_deleted, created_at, updated_at";

/// PostgreSQL 消息存储
pub struct PostgresMessageStore {
    pool: Pool<Postgres>,
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: i64,
    content: String,
    message_type: String,
    sender_id: i64,
    receiver_id: Option<i64>,
    group_id: Option<i64>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        let message_type = match row.message_type.as_str() {
            "FILE" => MessageType::File,
            _ => MessageType::Text,
        };
        Message {
            id: row.id,
            content: row.content,
            message_type,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            group_id: row.group_id,
            is_read: row.is_read,
            read_at: row.read_at,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ConversationRow {
    #[sqlx(flatten)]
    message: MessageRow,
    sender_name: String,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    is_online: bool,
    last_seen: Option<DateTime<Utc>>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            name: row.name,
            is_online: row.is_online,
            last_seen: row.last_seen,
        }
    }
}

impl PostgresMessageStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        let store = Self { pool };
        store
            .init_schema()
            .await
            .context("Failed to initialize PostgreSQL schema")?;
        Ok(store)
    }

    /// 初始化数据库表结构（如果不存在）
    ///
    /// 用户表由账号系统拥有；网关侧只保证最小结构存在，
    /// 已有表不会被修改
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                is_online BOOLEAN NOT NULL DEFAULT FALSE,
                last_seen TIMESTAMP WITH TIME ZONE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id BIGSERIAL PRIMARY KEY,
                content TEXT NOT NULL,
                message_type TEXT NOT NULL DEFAULT 'TEXT',
                sender_id BIGINT NOT NULL,
                receiver_id BIGINT,
                group_id BIGINT,
                is_read BOOLEAN NOT NULL DEFAULT FALSE,
                read_at TIMESTAMP WITH TIME ZONE,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_sender_receiver
            ON messages(sender_id, receiver_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_created_at
            ON messages(created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, is_online, last_seen FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message> {
        let query = format!(
            "INSERT INTO messages (content, message_type, sender_id, receiver_id) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            MESSAGE_COLUMNS
        );
        let row = sqlx::query_as::<_, MessageRow>(&query)
            .bind(&message.content)
            .bind(message.message_type.as_str())
            .bind(message.sender_id)
            .bind(message.receiver_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn find_message(&self, message_id: i64) -> Result<Option<Message>> {
        let query = format!("SELECT {} FROM messages WHERE id = $1", MESSAGE_COLUMNS);
        let row = sqlx::query_as::<_, MessageRow>(&query)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Message::from))
    }

    async fn update_read_status(&self, message_id: i64, read_at: DateTime<Utc>) -> Result<Message> {
        let query = format!(
            "UPDATE messages SET is_read = TRUE, read_at = $2, updated_at = $2 \
             WHERE id = $1 RETURNING {}",
            MESSAGE_COLUMNS
        );
        let row = sqlx::query_as::<_, MessageRow>(&query)
            .bind(message_id)
            .bind(read_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| anyhow!("Message not found: {}", message_id))?;

        Ok(row.into())
    }

    async fn list_messages_between(
        &self,
        user_a: i64,
        user_b: i64,
    ) -> Result<Vec<ConversationMessage>> {
        let query = format!(
            "SELECT m.{}, u.name AS sender_name \
             FROM messages m JOIN users u ON u.id = m.sender_id \
             WHERE (m.sender_id = $1 AND m.receiver_id = $2) \
                OR (m.sender_id = $2 AND m.receiver_id = $1) \
             ORDER BY m.created_at ASC, m.id ASC",
            MESSAGE_COLUMNS.replace(", ", ", m.")
        );
        let rows = sqlx::query_as::<_, ConversationRow>(&query)
            .bind(user_a)
            .bind(user_b)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| ConversationMessage {
                message: row.message.into(),
                sender_name: row.sender_name,
            })
            .collect())
    }

    async fn update_user_presence(
        &self,
        user_id: i64,
        is_online: bool,
        last_seen: Option<DateTime<Utc>>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET is_online = $2, \
             last_seen = CASE WHEN $3::timestamptz IS NULL THEN last_seen ELSE $3 END \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(is_online)
        .bind(last_seen)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
