//! 服务装配与启动

pub mod bootstrap;
pub mod wire;

pub use bootstrap::ApplicationBootstrap;
pub use wire::ApplicationContext;
