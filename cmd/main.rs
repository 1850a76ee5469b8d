use anyhow::Result;
use chat_gateway::{ApplicationBootstrap, GatewayConfig};
use tracing_subscriber::EnvFilter;

/// 初始化日志系统
fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    // 加载配置
    let config_path = std::env::args().nth(1);
    let config = GatewayConfig::load(config_path.as_deref())?;

    // 创建应用上下文并启动网关
    ApplicationBootstrap::run(config).await
}
