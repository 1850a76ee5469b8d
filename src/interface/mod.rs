pub mod connection;
pub mod events;
pub mod gateway;

pub use gateway::ChatGateway;
