use doorlink_core::constants::{
    DEFAULT_DEDUP_BUCKET_MS, DEFAULT_DEDUP_WINDOW_MS, DEFAULT_REQUEST_TIMEOUT_MS,
};
use doorlink_core::{DoorId, Error};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What to do with pending requests when the sensor reports the door closed
/// without naming a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedClosePolicy {
    /// Deny every pending request for the door.
    #[default]
    DenyPending,
    /// Leave pending requests to their own confirmation or timeout.
    Ignore,
}

impl UnmatchedClosePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            UnmatchedClosePolicy::DenyPending => "deny-pending",
            UnmatchedClosePolicy::Ignore => "ignore",
        }
    }
}

impl fmt::Display for UnmatchedClosePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnmatchedClosePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deny-pending" | "deny_pending" => Ok(UnmatchedClosePolicy::DenyPending),
            "ignore" => Ok(UnmatchedClosePolicy::Ignore),
            other => Err(Error::Config(format!(
                "unknown unmatched close policy '{other}' (expected deny-pending or ignore)"
            ))),
        }
    }
}

/// Engine configuration
///
/// # Example
///
/// ```
/// use doorlink_engine::{EngineConfig, UnmatchedClosePolicy};
/// use std::time::Duration;
///
/// let config = EngineConfig::default()
///     .request_timeout(Duration::from_secs(5))
///     .unmatched_close(UnmatchedClosePolicy::Ignore);
/// assert_eq!(config.request_timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The single door managed by this deployment
    pub door_id: DoorId,

    /// Time to wait for the controller before resolving as timed out
    pub request_timeout: Duration,

    /// Trailing window during which identical audit entries are suppressed
    pub dedup_window: Duration,

    /// Resolution of the dedup clock
    pub dedup_bucket: Duration,

    pub unmatched_close: UnmatchedClosePolicy,

    /// Number of correlation registry shards
    pub registry_shards: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            door_id: DoorId::default(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            dedup_window: Duration::from_millis(DEFAULT_DEDUP_WINDOW_MS),
            dedup_bucket: Duration::from_millis(DEFAULT_DEDUP_BUCKET_MS),
            unmatched_close: UnmatchedClosePolicy::default(),
            registry_shards: 16,
        }
    }
}

impl EngineConfig {
    pub fn door_id(mut self, door_id: DoorId) -> Self {
        self.door_id = door_id;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    pub fn dedup_bucket(mut self, bucket: Duration) -> Self {
        self.dedup_bucket = bucket;
        self
    }

    pub fn unmatched_close(mut self, policy: UnmatchedClosePolicy) -> Self {
        self.unmatched_close = policy;
        self
    }

    pub fn registry_shards(mut self, shards: usize) -> Self {
        self.registry_shards = shards;
        self
    }

    /// Check values that would make the engine misbehave.
    ///
    /// # Errors
    /// Returns `Error::Config` for a zero timeout, bucket or shard count, or
    /// a window shorter than one bucket.
    pub fn validate(&self) -> doorlink_core::Result<()> {
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }
        if self.dedup_bucket.is_zero() {
            return Err(Error::Config("dedup bucket must be positive".to_string()));
        }
        if self.dedup_window < self.dedup_bucket {
            return Err(Error::Config(
                "dedup window must be at least one bucket".to_string(),
            ));
        }
        if self.registry_shards == 0 {
            return Err(Error::Config("registry needs at least one shard".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.door_id.as_str(), "Puerta Principal");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.dedup_window, Duration::from_secs(3));
        assert_eq!(config.dedup_bucket, Duration::from_secs(1));
        assert_eq!(config.unmatched_close, UnmatchedClosePolicy::DenyPending);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case("deny-pending", UnmatchedClosePolicy::DenyPending)]
    #[case("DENY_PENDING", UnmatchedClosePolicy::DenyPending)]
    #[case(" ignore ", UnmatchedClosePolicy::Ignore)]
    fn test_policy_parse(#[case] input: &str, #[case] expected: UnmatchedClosePolicy) {
        assert_eq!(input.parse::<UnmatchedClosePolicy>().unwrap(), expected);
    }

    #[test]
    fn test_policy_parse_rejects_unknown() {
        assert!("deny-all".parse::<UnmatchedClosePolicy>().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(
            EngineConfig::default()
                .request_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            EngineConfig::default()
                .dedup_window(Duration::from_millis(500))
                .validate()
                .is_err()
        );
        assert!(EngineConfig::default().registry_shards(0).validate().is_err());
    }
}
