pub mod connection_service;
pub mod message_service;
pub mod typing_service;

#[cfg(test)]
mod typing_service_test;

pub use connection_service::ConnectionService;
pub use message_service::MessageService;
pub use typing_service::TypingService;
