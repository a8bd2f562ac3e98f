//! Integration tests for the loopback transport
//!
//! Run with: cargo test --package doorlink-network --test loopback_transport

use doorlink_core::{DoorId, RequestId, RequestKind};
use doorlink_network::{LoopbackTransport, Publisher, TransportError};
use doorlink_protocol::{OpenDoorCommand, Topic, UnauthorizedKind, UnauthorizedNotice};
use std::sync::Arc;
use tokio::sync::mpsc;

fn door() -> DoorId {
    DoorId::new("Puerta Principal").unwrap()
}

#[tokio::test]
async fn test_open_command_is_recorded_not_echoed() {
    let (tx, mut rx) = mpsc::channel(8);
    let transport = LoopbackTransport::new(tx).recording();

    let id = RequestId::generate(RequestKind::CodeAccess);
    let cmd = OpenDoorCommand::new(id.clone(), door(), "1", "Admin", false);
    transport.publish(&cmd.into()).unwrap();

    let published = transport.published_on(Topic::OpenRequest);
    assert_eq!(published.len(), 1);
    let json: serde_json::Value = serde_json::from_str(published[0].text()).unwrap();
    assert_eq!(json["requestId"], id.as_str());

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_unauthorized_notice_echoes_like_a_broker() {
    let (tx, mut rx) = mpsc::channel(8);
    let transport = LoopbackTransport::new(tx);

    let notice = UnauthorizedNotice::rejected_code(
        RequestId::generate(RequestKind::CodeAccess),
        &door(),
        UnauthorizedKind::InvalidCode,
        "Invalid access code",
    );
    transport.publish(&notice.into()).unwrap();

    let echoed = rx.recv().await.unwrap();
    assert_eq!(echoed.topic, Topic::Unauthorized.as_str());
}

#[tokio::test]
async fn test_echo_can_be_disabled() {
    let (tx, mut rx) = mpsc::channel(8);
    let transport = LoopbackTransport::new(tx).recording().without_echo();

    transport
        .publish(&UnauthorizedNotice::door_left_open(None).into())
        .unwrap();

    assert_eq!(transport.published().len(), 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_publishes_not_kept_without_recording() {
    let (tx, mut rx) = mpsc::channel(8);
    let transport = LoopbackTransport::new(tx);

    for _ in 0..100 {
        let id = RequestId::generate(RequestKind::CodeAccess);
        let cmd = OpenDoorCommand::new(id, door(), "1", "Admin", false);
        transport.publish(&cmd.into()).unwrap();
    }
    transport
        .publish(&UnauthorizedNotice::door_left_open(None).into())
        .unwrap();

    assert!(transport.published().is_empty());
    assert!(transport.published_on(Topic::OpenRequest).is_empty());
    // Echo still works with recording off
    assert_eq!(rx.recv().await.unwrap().topic, Topic::Unauthorized.as_str());
}

#[tokio::test]
async fn test_inject_preserves_order() {
    let (tx, mut rx) = mpsc::channel(8);
    let transport = Arc::new(LoopbackTransport::new(tx));

    for i in 0..3 {
        transport
            .inject(
                Topic::SensorStatus.as_str(),
                format!(r#"{{"requestId":"req_{i}","doorOpened":true}}"#),
            )
            .await
            .unwrap();
    }

    for i in 0..3 {
        let msg = rx.recv().await.unwrap();
        assert!(String::from_utf8_lossy(&msg.payload).contains(&format!("req_{i}")));
    }
}

#[tokio::test]
async fn test_inject_after_consumer_dropped() {
    let (tx, rx) = mpsc::channel(1);
    let transport = LoopbackTransport::new(tx);
    drop(rx);

    let err = transport
        .inject(Topic::SensorStatus.as_str(), "{}".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::ChannelClosed));
}
