//! Reasons recorded on audit entries and returned to HTTP clients.
//!
//! ```
//! use doorlink_storage::reasons::AccessReasons;
//!
//! assert_eq!(AccessReasons::door_error("jammed"), "Door error: jammed");
//! ```

/// Human-readable outcome reasons.
pub struct AccessReasons;

impl AccessReasons {
    /// No user owns the presented code.
    pub const INVALID_CODE: &'static str = "Invalid access code";

    /// The code belongs to a deactivated user.
    pub const INACTIVE_USER: &'static str = "Inactive user";

    /// Controller did not confirm the opening in time.
    pub const TIMEOUT: &'static str = "Timeout - no response from door controller";

    /// Sensor reported the door closed without it having opened.
    pub const DOOR_DID_NOT_OPEN: &'static str = "door did not open";

    /// Sensor asserted both flags at once.
    pub const AMBIGUOUS_SENSOR: &'static str = "ambiguous sensor reading";

    /// Door closed with no request id while requests were pending.
    pub const CLOSED_WITHOUT_OPENING: &'static str = "door closed before confirming the opening";

    /// Successful manual opening.
    pub const MANUAL_OPEN: &'static str = "Manual opening from dashboard";

    /// Physical opening nobody requested.
    pub const UNAUTHORIZED_PHYSICAL: &'static str = "Physical opening without authorization";

    /// Reason for a negative acknowledgment from the controller.
    #[must_use]
    pub fn door_error(error: &str) -> String {
        format!("Door error: {error}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_reasons_are_non_empty() {
        assert!(!AccessReasons::INVALID_CODE.is_empty());
        assert!(!AccessReasons::INACTIVE_USER.is_empty());
        assert!(!AccessReasons::TIMEOUT.is_empty());
        assert!(!AccessReasons::DOOR_DID_NOT_OPEN.is_empty());
        assert!(!AccessReasons::AMBIGUOUS_SENSOR.is_empty());
        assert!(!AccessReasons::CLOSED_WITHOUT_OPENING.is_empty());
        assert!(!AccessReasons::MANUAL_OPEN.is_empty());
        assert!(!AccessReasons::UNAUTHORIZED_PHYSICAL.is_empty());
    }

    #[test]
    fn test_door_error_embeds_device_error() {
        assert_eq!(AccessReasons::door_error("motor fault"), "Door error: motor fault");
    }
}
