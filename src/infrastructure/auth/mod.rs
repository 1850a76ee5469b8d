//! 认证模块
//!
//! 提供访问令牌校验功能。连接准入前必须完成校验，
//! 失败即终止该次连接尝试，不重试。

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::model::AuthenticatedUser;
use crate::domain::repository::TokenVerifier;
use crate::error::{GatewayError, GatewayResult};

/// 访问令牌声明
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// 用户ID
    pub id: i64,
    /// 用户昵称
    pub name: String,
    /// 过期时间（秒级时间戳）
    pub exp: i64,
    /// 签发方（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// JWT 令牌校验器
///
/// 校验客户端在连接建立时提供的 HS256 访问令牌
pub struct JwtTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// 获取 token 预览（用于日志记录）
    fn token_preview(token: &str) -> String {
        if token.len() > 12 {
            format!("{}...", &token[..12])
        } else {
            token.to_string()
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> GatewayResult<AuthenticatedUser> {
        match decode::<AccessClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => {
                debug!(user_id = data.claims.id, "Token verified");
                Ok(AuthenticatedUser {
                    id: data.claims.id,
                    name: data.claims.name,
                })
            }
            Err(err) => {
                warn!(
                    ?err,
                    token_preview = %Self::token_preview(token),
                    "Token validation failed"
                );
                Err(GatewayError::Unauthorized(
                    "Invalid or expired authentication token".to_string(),
                ))
            }
        }
    }
}
