//! 房间订阅行为测试

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::infrastructure::presence::{ConnectionHandle, RoomMembership};
use crate::interface::events::ServerEvent;

fn handle(user_id: i64) -> (Arc<ConnectionHandle>, mpsc::UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = Arc::new(ConnectionHandle::new(user_id, format!("user-{}", user_id), tx));
    (handle, rx)
}

#[tokio::test]
async fn subscribe_and_unsubscribe() {
    let rooms = RoomMembership::new();
    let (conn, _rx) = handle(1);

    rooms.subscribe(10, conn.clone());
    rooms.subscribe(10, conn.clone());
    assert_eq!(rooms.members(10).len(), 1, "Duplicate subscribe must be a no-op");

    rooms.unsubscribe(10, &conn.connection_id);
    assert!(rooms.members(10).is_empty());
}

#[tokio::test]
async fn leave_all_removes_connection_from_every_room() {
    let rooms = RoomMembership::new();
    let (conn, _rx1) = handle(1);
    let (other, _rx2) = handle(2);

    rooms.subscribe(10, conn.clone());
    rooms.subscribe(20, conn.clone());
    rooms.subscribe(10, other.clone());

    rooms.leave_all(&conn.connection_id);

    assert_eq!(rooms.members(10).len(), 1);
    assert_eq!(rooms.members(10)[0].connection_id, other.connection_id);
    assert!(rooms.members(20).is_empty());
}
