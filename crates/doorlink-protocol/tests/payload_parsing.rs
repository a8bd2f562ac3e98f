//! Property-based tests for inbound payload decoding.
//!
//! The router feeds every broker message through `InboundMessage::parse`, so
//! decoding must never panic and must agree with the sensor flag semantics
//! for every combination the firmware could send.

use doorlink_protocol::{InboundMessage, ProtocolError, SensorObservation, Topic};
use proptest::prelude::*;

/// Strategy for request ids as the firmware echoes them.
fn request_id() -> impl Strategy<Value = String> {
    prop::string::string_regex("req(_manual)?_[0-9]{13}_[0-9a-z]{9}")
        .expect("Failed to create request id regex strategy")
}

/// Strategy for an optional boolean sensor flag.
fn flag() -> impl Strategy<Value = Option<bool>> {
    prop_oneof![Just(None), Just(Some(true)), Just(Some(false))]
}

/// Strategy for inbound topic names.
fn inbound_topic() -> impl Strategy<Value = Topic> {
    prop_oneof![
        Just(Topic::OpenResponse),
        Just(Topic::SensorStatus),
        Just(Topic::Unauthorized),
    ]
}

fn sensor_json(id: Option<&str>, opened: Option<bool>, closed: Option<bool>) -> String {
    let mut obj = serde_json::Map::new();
    if let Some(id) = id {
        obj.insert("requestId".into(), id.into());
    }
    if let Some(opened) = opened {
        obj.insert("doorOpened".into(), opened.into());
    }
    if let Some(closed) = closed {
        obj.insert("doorClosed".into(), closed.into());
    }
    serde_json::Value::Object(obj).to_string()
}

proptest! {
    /// Property: arbitrary bytes on any inbound topic either decode or yield
    /// a malformed-payload error; they never panic.
    #[test]
    fn prop_parse_never_panics(
        topic in inbound_topic(),
        payload in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        match InboundMessage::parse(topic.as_str(), &payload) {
            Ok(msg) => prop_assert_eq!(msg.topic(), topic),
            Err(err) => {
                let is_malformed = matches!(err, ProtocolError::MalformedPayload { .. });
                prop_assert!(is_malformed);
            }
        }
    }

    /// Property: the observation depends only on which flags are `true`.
    #[test]
    fn prop_sensor_observation_matches_flags(
        id in prop::option::of(request_id()),
        opened in flag(),
        closed in flag(),
    ) {
        let json = sensor_json(id.as_deref(), opened, closed);
        let msg = InboundMessage::parse(Topic::SensorStatus.as_str(), json.as_bytes()).unwrap();
        let InboundMessage::Sensor(status) = msg else {
            return Err(TestCaseError::fail("expected sensor message"));
        };

        let expected = match (opened == Some(true), closed == Some(true)) {
            (true, true) => SensorObservation::Ambiguous,
            (true, false) => SensorObservation::Opened,
            (false, true) => SensorObservation::Closed,
            (false, false) => SensorObservation::Silent,
        };
        prop_assert_eq!(status.observation(), expected);
        prop_assert_eq!(status.request_id.map(String::from), id);
    }

    /// Property: an acknowledgment keeps its request id and success flag.
    #[test]
    fn prop_ack_preserves_fields(id in request_id(), success in any::<bool>()) {
        let json = format!(r#"{{"requestId":"{id}","success":{success}}}"#);
        let msg = InboundMessage::parse(Topic::OpenResponse.as_str(), json.as_bytes()).unwrap();
        let InboundMessage::Acknowledgment(ack) = msg else {
            return Err(TestCaseError::fail("expected acknowledgment"));
        };
        prop_assert_eq!(ack.request_id.as_str(), id.as_str());
        prop_assert_eq!(ack.success, success);
    }
}

#[test]
fn test_wrong_flag_type_is_malformed() {
    let err = InboundMessage::parse(
        Topic::SensorStatus.as_str(),
        br#"{"requestId":"req_1","doorOpened":1}"#,
    )
    .unwrap_err();
    assert!(matches!(err, ProtocolError::MalformedPayload { .. }));
}
