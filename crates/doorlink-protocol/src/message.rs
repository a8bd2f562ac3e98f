use crate::{
    error::{ProtocolError, ProtocolResult},
    payload::{OpenAcknowledgment, OpenDoorCommand, SensorStatus, UnauthorizedNotice},
    topic::Topic,
};
use serde::{Serialize, de::DeserializeOwned};

/// A decoded message received from the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Acknowledgment(OpenAcknowledgment),
    Sensor(SensorStatus),
    Unauthorized(UnauthorizedNotice),
}

impl InboundMessage {
    /// Decode a raw payload received on `topic`.
    ///
    /// # Errors
    /// - `ProtocolError::UnknownTopic` for topics outside the protocol
    /// - `ProtocolError::OutboundTopic` for the open-request topic
    /// - `ProtocolError::MalformedPayload` for invalid JSON or mistyped fields
    pub fn parse(topic: &str, payload: &[u8]) -> ProtocolResult<Self> {
        match topic.parse::<Topic>()? {
            Topic::OpenResponse => decode(topic, payload).map(InboundMessage::Acknowledgment),
            Topic::SensorStatus => decode(topic, payload).map(InboundMessage::Sensor),
            Topic::Unauthorized => decode(topic, payload).map(InboundMessage::Unauthorized),
            Topic::OpenRequest => Err(ProtocolError::OutboundTopic(topic.to_string())),
        }
    }

    /// Topic the message arrived on.
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            InboundMessage::Acknowledgment(_) => Topic::OpenResponse,
            InboundMessage::Sensor(_) => Topic::SensorStatus,
            InboundMessage::Unauthorized(_) => Topic::Unauthorized,
        }
    }
}

fn decode<T: DeserializeOwned>(topic: &str, payload: &[u8]) -> ProtocolResult<T> {
    serde_json::from_slice(payload).map_err(|source| ProtocolError::MalformedPayload {
        topic: topic.to_string(),
        source,
    })
}

/// A message the backend publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    OpenDoor(OpenDoorCommand),
    Unauthorized(UnauthorizedNotice),
}

impl OutboundMessage {
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            OutboundMessage::OpenDoor(_) => Topic::OpenRequest,
            OutboundMessage::Unauthorized(_) => Topic::Unauthorized,
        }
    }

    /// Serialize the payload to JSON bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        match self {
            OutboundMessage::OpenDoor(cmd) => encode(cmd),
            OutboundMessage::Unauthorized(notice) => encode(notice),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> ProtocolResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

impl From<OpenDoorCommand> for OutboundMessage {
    fn from(cmd: OpenDoorCommand) -> Self {
        OutboundMessage::OpenDoor(cmd)
    }
}

impl From<UnauthorizedNotice> for OutboundMessage {
    fn from(notice: UnauthorizedNotice) -> Self {
        OutboundMessage::Unauthorized(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dispatches_by_topic() {
        let msg = InboundMessage::parse(
            "access/door/open/response",
            br#"{"requestId":"req_1","success":true}"#,
        )
        .unwrap();
        assert!(matches!(msg, InboundMessage::Acknowledgment(ref ack) if ack.success));
        assert_eq!(msg.topic(), Topic::OpenResponse);

        let msg =
            InboundMessage::parse("access/door/sensor/status", br#"{"doorClosed":true}"#).unwrap();
        assert!(matches!(msg, InboundMessage::Sensor(_)));

        let msg = InboundMessage::parse("access/door/unauthorized", b"{}").unwrap();
        assert!(matches!(msg, InboundMessage::Unauthorized(_)));
    }

    #[test]
    fn test_parse_rejects_outbound_and_unknown_topics() {
        assert!(matches!(
            InboundMessage::parse("access/door/open/request", b"{}"),
            Err(ProtocolError::OutboundTopic(_))
        ));
        assert!(matches!(
            InboundMessage::parse("elsewhere", b"{}"),
            Err(ProtocolError::UnknownTopic(_))
        ));
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = InboundMessage::parse("access/door/sensor/status", b"{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload { .. }));
        assert!(err.to_string().contains("access/door/sensor/status"));
    }

    #[test]
    fn test_outbound_encode() {
        let notice = UnauthorizedNotice::door_left_open(None);
        let msg = OutboundMessage::from(notice);
        assert_eq!(msg.topic(), Topic::Unauthorized);

        let bytes = msg.encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["event"], "door_left_open");
    }
}
