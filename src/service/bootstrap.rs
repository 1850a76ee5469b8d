//! 应用启动器 - 负责依赖注入和服务启动

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::GatewayConfig;
use crate::service::wire;

/// 应用启动器
pub struct ApplicationBootstrap;

impl ApplicationBootstrap {
    /// 运行应用的主入口点
    pub async fn run(config: GatewayConfig) -> Result<()> {
        let config = Arc::new(config);
        let context = wire::initialize(config.clone()).await?;

        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
        info!(bind_addr = %config.bind_addr, "Chat gateway listening");

        // 等待接入循环退出或接收到停止信号
        tokio::select! {
            result = context.gateway.run(listener) => {
                if let Err(err) = &result {
                    tracing::error!(?err, "Chat gateway failed");
                }
                result
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                Ok(())
            }
        }
    }
}
