pub mod auth;
pub mod persistence;
pub mod presence;

pub use presence::{ConnectionHandle, PresenceBroadcaster, PresenceRegistry, RoomMembership};
