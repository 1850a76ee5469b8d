//! 实时聊天网关核心库
//!
//! 负责长连接认证、在线状态管理、消息路由与输入状态转发

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interface;
pub mod metrics;
pub mod service;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use service::ApplicationBootstrap;
