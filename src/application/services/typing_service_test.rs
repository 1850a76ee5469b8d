//! 输入状态中继行为测试

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::TypingService;
use crate::domain::model::TypingPhase;
use crate::infrastructure::presence::{ConnectionHandle, PresenceRegistry, RoomMembership};
use crate::interface::events::ServerEvent;
use crate::metrics::GatewayMetrics;

fn handle(user_id: i64) -> (Arc<ConnectionHandle>, mpsc::UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = Arc::new(ConnectionHandle::new(user_id, format!("user-{}", user_id), tx));
    (handle, rx)
}

fn service() -> (TypingService, Arc<PresenceRegistry>, Arc<RoomMembership>) {
    let registry = Arc::new(PresenceRegistry::new());
    let rooms = Arc::new(RoomMembership::new());
    let service = TypingService::new(
        registry.clone(),
        rooms.clone(),
        Arc::new(GatewayMetrics::new()),
    );
    (service, registry, rooms)
}

#[tokio::test]
async fn direct_indicator_reaches_receiver_connections() {
    let (service, registry, _rooms) = service();
    let (conn, mut rx) = handle(2);
    registry.register(conn);

    service.relay_direct(1, 2, TypingPhase::Start);
    match rx.try_recv().unwrap() {
        ServerEvent::TypingStart { user_id } => assert_eq!(user_id, 1),
        other => panic!("unexpected event: {:?}", other),
    }

    service.relay_direct(1, 2, TypingPhase::Stop);
    match rx.try_recv().unwrap() {
        ServerEvent::TypingStop { user_id } => assert_eq!(user_id, 1),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn direct_indicator_to_offline_receiver_is_dropped() {
    let (service, _registry, _rooms) = service();

    // 无接收端：不报错也不重试
    service.relay_direct(1, 2, TypingPhase::Start);
}

#[tokio::test]
async fn group_indicator_excludes_sender_connection() {
    let (service, _registry, rooms) = service();
    let (sender, mut sender_rx) = handle(1);
    let (member, mut member_rx) = handle(2);
    rooms.subscribe(7, sender.clone());
    rooms.subscribe(7, member);

    service.relay_group(1, "alice", 7, TypingPhase::Start, &sender.connection_id);

    match member_rx.try_recv().unwrap() {
        ServerEvent::TypingGroupStart { user_id, name } => {
            assert_eq!(user_id, 1);
            assert_eq!(name, "alice");
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(sender_rx.try_recv().is_err(), "Sender must not see their own indicator");
}

#[tokio::test]
async fn group_stop_carries_only_user_id() {
    let (service, _registry, rooms) = service();
    let (sender, _sender_rx) = handle(1);
    let (member, mut member_rx) = handle(2);
    rooms.subscribe(7, sender.clone());
    rooms.subscribe(7, member);

    service.relay_group(1, "alice", 7, TypingPhase::Stop, &sender.connection_id);

    match member_rx.try_recv().unwrap() {
        ServerEvent::TypingGroupStop { user_id } => assert_eq!(user_id, 1),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn same_user_other_device_still_receives_group_indicator() {
    let (service, _registry, rooms) = service();
    let (phone, _phone_rx) = handle(1);
    let (laptop, mut laptop_rx) = handle(1);
    rooms.subscribe(7, phone.clone());
    rooms.subscribe(7, laptop);

    // 排除的是发起连接，不是发起用户
    service.relay_group(1, "alice", 7, TypingPhase::Start, &phone.connection_id);

    assert!(matches!(
        laptop_rx.try_recv().unwrap(),
        ServerEvent::TypingGroupStart { user_id: 1, .. }
    ));
}
