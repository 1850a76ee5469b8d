//! # Prometheus 指标收集模块
//!
//! 为网关提供统一的 Prometheus 指标收集能力。

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntGauge, Opts, Registry};

/// 全局指标注册表
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// 网关指标
pub struct GatewayMetrics {
    /// 当前活跃连接数
    pub connections_active: IntGauge,
    /// 累计建立连接数
    pub connections_total: IntCounter,
    /// 认证失败次数
    pub auth_failures_total: IntCounter,
    /// 成功路由（持久化）的消息总数
    pub messages_routed_total: IntCounter,
    /// 实时推送失败（接收端连接已关闭）次数
    pub pushes_dropped_total: IntCounter,
    /// 输入状态转发总数
    pub typing_relayed_total: IntCounter,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        let connections_active = IntGauge::with_opts(Opts::new(
            "gateway_connections_active",
            "Number of currently registered connections",
        ))
        .expect("Failed to create gateway_connections_active metric");

        let connections_total = IntCounter::with_opts(Opts::new(
            "gateway_connections_total",
            "Total number of admitted connections",
        ))
        .expect("Failed to create gateway_connections_total metric");

        let auth_failures_total = IntCounter::with_opts(Opts::new(
            "gateway_auth_failures_total",
            "Total number of rejected connection attempts",
        ))
        .expect("Failed to create gateway_auth_failures_total metric");

        let messages_routed_total = IntCounter::with_opts(Opts::new(
            "gateway_messages_routed_total",
            "Total number of durably persisted messages",
        ))
        .expect("Failed to create gateway_messages_routed_total metric");

        let pushes_dropped_total = IntCounter::with_opts(Opts::new(
            "gateway_pushes_dropped_total",
            "Total number of live delivery attempts against closed connections",
        ))
        .expect("Failed to create gateway_pushes_dropped_total metric");

        let typing_relayed_total = IntCounter::with_opts(Opts::new(
            "gateway_typing_relayed_total",
            "Total number of relayed typing signals",
        ))
        .expect("Failed to create gateway_typing_relayed_total metric");

        let metrics = Self {
            connections_active,
            connections_total,
            auth_failures_total,
            messages_routed_total,
            pushes_dropped_total,
            typing_relayed_total,
        };

        // 重复注册（例如测试中多次构建）不视为致命错误
        let _ = REGISTRY.register(Box::new(metrics.connections_active.clone()));
        let _ = REGISTRY.register(Box::new(metrics.connections_total.clone()));
        let _ = REGISTRY.register(Box::new(metrics.auth_failures_total.clone()));
        let _ = REGISTRY.register(Box::new(metrics.messages_routed_total.clone()));
        let _ = REGISTRY.register(Box::new(metrics.pushes_dropped_total.clone()));
        let _ = REGISTRY.register(Box::new(metrics.typing_relayed_total.clone()));

        metrics
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}
