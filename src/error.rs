//! 网关错误类型定义

use thiserror::Error;

/// 网关错误类型
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 连接准入失败（凭证缺失、格式错误或校验失败）
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 请求载荷校验失败
    #[error("Validation failed: {0}")]
    Validation(String),

    /// 目标资源不存在（接收方或消息）
    #[error("Not found: {0}")]
    NotFound(String),

    /// 请求方无权执行该操作
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 持久化存储错误
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// 其他内部错误
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// 网关结果类型
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// 返回可下发给客户端的错误文案
    ///
    /// 持久化与内部错误对客户端保持不透明，不泄露内部细节
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::Persistence(_) | GatewayError::Internal(_) => {
                "Failed to send message".to_string()
            }
            other => other.to_string(),
        }
    }
}
