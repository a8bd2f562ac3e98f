use crate::error::ProtocolError;
use std::fmt;

/// Pub/sub topics shared with the door controller firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Backend asks the controller to open the door.
    OpenRequest,
    /// Controller acknowledges (or rejects) an open request.
    OpenResponse,
    /// Door sensor reports.
    SensorStatus,
    /// Unauthorized-access alerts; published by both sides.
    Unauthorized,
}

impl Topic {
    /// Topics the backend subscribes to.
    pub const INBOUND: [Topic; 3] = [Topic::OpenResponse, Topic::SensorStatus, Topic::Unauthorized];

    /// Topic name on the broker.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::OpenRequest => "access/door/open/request",
            Topic::OpenResponse => "access/door/open/response",
            Topic::SensorStatus => "access/door/sensor/status",
            Topic::Unauthorized => "access/door/unauthorized",
        }
    }

    /// Returns `true` if the backend consumes messages from this topic.
    #[must_use]
    pub fn is_inbound(self) -> bool {
        Topic::INBOUND.contains(&self)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Topic {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access/door/open/request" => Ok(Topic::OpenRequest),
            "access/door/open/response" => Ok(Topic::OpenResponse),
            "access/door/sensor/status" => Ok(Topic::SensorStatus),
            "access/door/unauthorized" => Ok(Topic::Unauthorized),
            other => Err(ProtocolError::UnknownTopic(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names_parse_back() {
        for topic in [
            Topic::OpenRequest,
            Topic::OpenResponse,
            Topic::SensorStatus,
            Topic::Unauthorized,
        ] {
            assert_eq!(topic.as_str().parse::<Topic>().unwrap(), topic);
        }
    }

    #[test]
    fn test_inbound_topics() {
        assert!(!Topic::OpenRequest.is_inbound());
        assert!(Topic::OpenResponse.is_inbound());
        assert!(Topic::SensorStatus.is_inbound());
        assert!(Topic::Unauthorized.is_inbound());
    }

    #[test]
    fn test_unknown_topic() {
        assert!(matches!(
            "access/door/denied".parse::<Topic>(),
            Err(ProtocolError::UnknownTopic(_))
        ));
    }
}
