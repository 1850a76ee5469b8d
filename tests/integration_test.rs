// 集成测试套件 - 通过应用服务与内存存储走完整事件流

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use chat_gateway::application::services::{ConnectionService, MessageService, TypingService};
use chat_gateway::domain::model::PresenceStatus;
use chat_gateway::domain::repository::MessageStore;
use chat_gateway::infrastructure::persistence::InMemoryMessageStore;
use chat_gateway::infrastructure::presence::{
    ConnectionHandle, PresenceBroadcaster, PresenceRegistry, RoomMembership,
};
use chat_gateway::interface::connection::EventDispatcher;
use chat_gateway::interface::events::ServerEvent;
use chat_gateway::metrics::GatewayMetrics;

struct Harness {
    store: Arc<InMemoryMessageStore>,
    connections: Arc<ConnectionService>,
    dispatcher: EventDispatcher,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryMessageStore::new());
        let registry = Arc::new(PresenceRegistry::new());
        let rooms = Arc::new(RoomMembership::new());
        let metrics = Arc::new(GatewayMetrics::new());
        let broadcaster = Arc::new(PresenceBroadcaster::new(registry.clone(), store.clone()));

        let connections = Arc::new(ConnectionService::new(
            registry.clone(),
            rooms.clone(),
            broadcaster,
            metrics.clone(),
        ));
        let messages = Arc::new(MessageService::new(
            store.clone(),
            registry.clone(),
            metrics.clone(),
        ));
        let typing = Arc::new(TypingService::new(registry, rooms, metrics));
        let dispatcher = EventDispatcher::new(connections.clone(), messages, typing);

        Self {
            store,
            connections,
            dispatcher,
        }
    }

    /// 建立一条已认证连接并注册到网关
    async fn connect(
        &self,
        user_id: i64,
        name: &str,
    ) -> (Arc<ConnectionHandle>, mpsc::UnboundedReceiver<ServerEvent>) {
        self.store.insert_user(user_id, name).await;
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Arc::new(ConnectionHandle::new(user_id, name.to_string(), tx));
        self.connections.handle_connect(handle.clone());
        (handle, rx)
    }

    fn disconnect(&self, handle: &ConnectionHandle) {
        self.connections
            .handle_disconnect(handle.user_id, &handle.connection_id);
    }
}

/// 等待直到收到满足条件的事件，其余事件跳过
async fn expect_event<F>(
    rx: &mut mpsc::UnboundedReceiver<ServerEvent>,
    mut matches: F,
) -> ServerEvent
where
    F: FnMut(&ServerEvent) -> bool,
{
    loop {
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");
        if matches(&event) {
            return event;
        }
    }
}

fn assert_no_event(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) {
    if let Ok(event) = rx.try_recv() {
        panic!("unexpected event: {:?}", event);
    }
}

#[tokio::test]
async fn first_connection_announces_online_to_all_peers() {
    let harness = Harness::new();
    let (_alice, mut alice_rx) = harness.connect(1, "alice").await;

    let (_bob_phone, _rx1) = harness.connect(2, "bob").await;
    expect_event(&mut alice_rx, |event| {
        matches!(
            event,
            ServerEvent::UserStatus {
                user_id: 2,
                status: PresenceStatus::Online,
            }
        )
    })
    .await;

    // 第二台设备上线不再重复广播
    let (_bob_laptop, _rx2) = harness.connect(2, "bob").await;
    assert_no_event(&mut alice_rx);
}

#[tokio::test]
async fn offline_is_announced_only_when_last_connection_drops() {
    let harness = Harness::new();
    let (_alice, mut alice_rx) = harness.connect(1, "alice").await;
    let (bob_phone, _rx1) = harness.connect(2, "bob").await;
    let (bob_laptop, _rx2) = harness.connect(2, "bob").await;

    expect_event(&mut alice_rx, |event| {
        matches!(event, ServerEvent::UserStatus { user_id: 2, .. })
    })
    .await;

    harness.disconnect(&bob_phone);
    assert_no_event(&mut alice_rx);

    harness.disconnect(&bob_laptop);
    expect_event(&mut alice_rx, |event| {
        matches!(
            event,
            ServerEvent::UserStatus {
                user_id: 2,
                status: PresenceStatus::Offline,
            }
        )
    })
    .await;

    // 下线持久化是异步的，等它落地
    tokio::time::sleep(Duration::from_millis(100)).await;
    let bob = harness.store.find_user(2).await.unwrap().unwrap();
    assert!(!bob.is_online);
    assert!(bob.last_seen.is_some(), "Offline must record last seen time");
}

#[tokio::test]
async fn message_send_reaches_receiver_and_confirms_sender() {
    let harness = Harness::new();
    let (alice, mut alice_rx) = harness.connect(1, "alice").await;
    let (_bob, mut bob_rx) = harness.connect(2, "bob").await;

    harness.dispatcher.dispatch(
        &alice,
        r#"{"event":"message:send","data":{"receiverId":2,"content":"hello bob"}}"#,
    );

    let received = expect_event(&mut bob_rx, |event| {
        matches!(event, ServerEvent::MessageReceive(_))
    })
    .await;
    let ServerEvent::MessageReceive(message) = received else {
        unreachable!()
    };
    assert_eq!(message.content, "hello bob");
    assert_eq!(message.sender_id, 1);

    let confirmed = expect_event(&mut alice_rx, |event| {
        matches!(event, ServerEvent::MessageSent(_))
    })
    .await;
    let ServerEvent::MessageSent(echo) = confirmed else {
        unreachable!()
    };
    assert_eq!(echo.id, message.id);

    assert!(harness.store.find_message(message.id).await.unwrap().is_some());
}

#[tokio::test]
async fn failed_send_reports_error_only_to_sender() {
    let harness = Harness::new();
    let (alice, mut alice_rx) = harness.connect(1, "alice").await;

    harness.dispatcher.dispatch(
        &alice,
        r#"{"event":"message:send","data":{"receiverId":99,"content":"hello"}}"#,
    );

    let event = expect_event(&mut alice_rx, |event| {
        matches!(event, ServerEvent::MessageError { .. })
    })
    .await;
    let ServerEvent::MessageError { original_message, .. } = event else {
        unreachable!()
    };
    assert_eq!(original_message["receiverId"], 99);

    // 连接仍然可用
    harness.dispatcher.dispatch(
        &alice,
        r#"{"event":"typing:start","data":{"receiverId":2}}"#,
    );
}

#[tokio::test]
async fn direct_typing_indicator_is_relayed() {
    let harness = Harness::new();
    let (alice, _alice_rx) = harness.connect(1, "alice").await;
    let (_bob, mut bob_rx) = harness.connect(2, "bob").await;

    harness.dispatcher.dispatch(
        &alice,
        r#"{"event":"typing:start","data":{"receiverId":2}}"#,
    );
    expect_event(&mut bob_rx, |event| {
        matches!(event, ServerEvent::TypingStart { user_id: 1 })
    })
    .await;

    harness.dispatcher.dispatch(
        &alice,
        r#"{"event":"typing:stop","data":{"receiverId":2}}"#,
    );
    expect_event(&mut bob_rx, |event| {
        matches!(event, ServerEvent::TypingStop { user_id: 1 })
    })
    .await;
}

#[tokio::test]
async fn group_typing_goes_to_room_members_except_sender() {
    let harness = Harness::new();
    let (alice, mut alice_rx) = harness.connect(1, "alice").await;
    let (bob, mut bob_rx) = harness.connect(2, "bob").await;

    harness
        .dispatcher
        .dispatch(&alice, r#"{"event":"room:join","data":{"groupId":7}}"#);
    harness
        .dispatcher
        .dispatch(&bob, r#"{"event":"room:join","data":{"groupId":7}}"#);

    harness.dispatcher.dispatch(
        &alice,
        r#"{"event":"typing:group:start","data":{"groupId":7}}"#,
    );

    let event = expect_event(&mut bob_rx, |event| {
        matches!(event, ServerEvent::TypingGroupStart { .. })
    })
    .await;
    let ServerEvent::TypingGroupStart { user_id, name } = event else {
        unreachable!()
    };
    assert_eq!(user_id, 1);
    assert_eq!(name, "alice");

    // 发起方自己的连接不会收到
    while let Ok(event) = alice_rx.try_recv() {
        assert!(
            !matches!(event, ServerEvent::TypingGroupStart { .. }),
            "Sender must not see their own group indicator"
        );
    }
}

#[tokio::test]
async fn room_subscription_does_not_survive_reconnect() {
    let harness = Harness::new();
    let (alice, _alice_rx) = harness.connect(1, "alice").await;
    let (bob, _bob_rx) = harness.connect(2, "bob").await;

    harness
        .dispatcher
        .dispatch(&alice, r#"{"event":"room:join","data":{"groupId":7}}"#);
    harness
        .dispatcher
        .dispatch(&bob, r#"{"event":"room:join","data":{"groupId":7}}"#);

    // 重连后房间订阅随旧连接消失
    harness.disconnect(&bob);
    let (bob_again, mut bob_rx) = harness.connect(2, "bob").await;

    harness.dispatcher.dispatch(
        &alice,
        r#"{"event":"typing:group:start","data":{"groupId":7}}"#,
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    while let Ok(event) = bob_rx.try_recv() {
        assert!(
            !matches!(event, ServerEvent::TypingGroupStart { .. }),
            "Room membership must not survive reconnect"
        );
    }

    harness
        .dispatcher
        .dispatch(&bob_again, r#"{"event":"room:join","data":{"groupId":7}}"#);
    harness.dispatcher.dispatch(
        &alice,
        r#"{"event":"typing:group:start","data":{"groupId":7}}"#,
    );
    expect_event(&mut bob_rx, |event| {
        matches!(event, ServerEvent::TypingGroupStart { .. })
    })
    .await;
}
