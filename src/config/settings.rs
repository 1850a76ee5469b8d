//! 网关配置
//!
//! 从 TOML 配置文件加载，环境变量可覆盖

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// 默认配置文件路径
const DEFAULT_CONFIG_PATH: &str = "config/gateway.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// WebSocket 监听地址
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// 访问令牌签名密钥
    #[serde(default = "default_token_secret")]
    pub token_secret: String,
    /// 访问令牌签发方（可选，配置后校验 iss）
    #[serde(default)]
    pub token_issuer: Option<String>,
    /// 认证握手超时（秒），避免半开连接耗尽资源
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
    /// 最大并发连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// PostgreSQL 连接串，未配置时使用内存存储
    #[serde(default)]
    pub database_url: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8085".to_string()
}

fn default_token_secret() -> String {
    "insecure-secret".to_string()
}

fn default_auth_timeout_secs() -> u64 {
    30
}

fn default_max_connections() -> usize {
    10000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            token_secret: default_token_secret(),
            token_issuer: None,
            auth_timeout_secs: default_auth_timeout_secs(),
            max_connections: default_max_connections(),
            database_url: None,
        }
    }
}

impl GatewayConfig {
    /// 加载配置
    ///
    /// 优先级：环境变量 > 配置文件 > 默认值
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            let config: GatewayConfig = toml::from_str(&raw)
                .with_context(|| format!("Failed to parse config file: {}", path))?;
            info!(path = %path, "Loaded gateway config");
            config
        } else {
            info!(path = %path, "Config file not found, using defaults");
            GatewayConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("CHAT_GATEWAY_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Ok(secret) = std::env::var("CHAT_GATEWAY_TOKEN_SECRET") {
            self.token_secret = secret;
        }
        if let Ok(issuer) = std::env::var("CHAT_GATEWAY_TOKEN_ISSUER") {
            self.token_issuer = Some(issuer);
        }
        if let Ok(timeout) = std::env::var("CHAT_GATEWAY_AUTH_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.auth_timeout_secs = timeout;
            }
        }
        if let Ok(max) = std::env::var("CHAT_GATEWAY_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<usize>() {
                self.max_connections = max;
            }
        }
        if let Ok(url) = std::env::var("CHAT_GATEWAY_DATABASE_URL") {
            self.database_url = Some(url);
        }
    }
}
