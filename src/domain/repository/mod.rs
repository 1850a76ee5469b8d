//! 仓储接口定义
//!
//! 网关消费的外部协作方：令牌校验与持久化存储

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::model::{
    AuthenticatedUser, ConversationMessage, Message, NewMessage, UserRecord,
};
use crate::error::GatewayResult;

/// 访问令牌校验接口
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// 校验凭证，返回认证身份；失败返回 `Unauthorized`
    async fn verify(&self, token: &str) -> GatewayResult<AuthenticatedUser>;
}

/// 持久化存储接口
///
/// 消息与用户记录由存储方拥有，网关只发起创建/变更并消费结果
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// 查询用户
    async fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>>;

    /// 创建消息记录，成功即代表已落盘
    async fn create_message(&self, message: NewMessage) -> Result<Message>;

    /// 查询消息
    async fn find_message(&self, message_id: i64) -> Result<Option<Message>>;

    /// 更新已读标记与已读时间，返回更新后的记录
    async fn update_read_status(&self, message_id: i64, read_at: DateTime<Utc>) -> Result<Message>;

    /// 查询两个用户之间的全部消息，按创建时间升序，附带发送方昵称
    async fn list_messages_between(
        &self,
        user_a: i64,
        user_b: i64,
    ) -> Result<Vec<ConversationMessage>>;

    /// 更新用户在线状态（尽力而为路径使用）
    async fn update_user_presence(
        &self,
        user_id: i64,
        is_online: bool,
        last_seen: Option<DateTime<Utc>>,
    ) -> Result<()>;
}
