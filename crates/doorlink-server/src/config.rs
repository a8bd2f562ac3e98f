//! Process configuration.
//!
//! Every setting can be given as a command-line flag or an environment
//! variable; a `.env` file in the working directory is loaded first.

use clap::{ArgAction, Parser, ValueEnum};
use doorlink_core::constants::{
    DEFAULT_DEDUP_BUCKET_MS, DEFAULT_DEDUP_WINDOW_MS, DEFAULT_DOOR_ID, DEFAULT_REQUEST_TIMEOUT_MS,
};
use doorlink_core::DoorId;
use doorlink_engine::{EngineConfig, UnmatchedClosePolicy};
use doorlink_network::{MqttConfig, TransportResult};
use doorlink_storage::DatabaseConfig;
use std::net::SocketAddr;
use std::time::Duration;

/// Transport used to reach the door controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// MQTT broker the controller is attached to
    Mqtt,
    /// In-process bus; no controller, requests time out
    Loopback,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "doorlink",
    author,
    version,
    about = "Access-control backend bridging HTTP requests to an MQTT door controller"
)]
pub struct Settings {
    /// Address the HTTP API listens on
    #[arg(long, env = "DOORLINK_HTTP_ADDR", default_value = "0.0.0.0:3000")]
    pub http_addr: SocketAddr,

    /// Port override for the HTTP API
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// SQLite database file
    #[arg(long, env = "DOORLINK_DATABASE_PATH", default_value = "doorlink.db")]
    pub database_path: String,

    #[arg(long, env = "DOORLINK_TRANSPORT", value_enum, default_value_t = TransportKind::Mqtt)]
    pub transport: TransportKind,

    /// Broker URL (mqtt://host:port)
    #[arg(long, env = "DOORLINK_MQTT_URL", default_value = "mqtt://127.0.0.1:1883")]
    pub mqtt_url: String,

    /// MQTT client id; generated when empty
    #[arg(long, env = "DOORLINK_MQTT_CLIENT_ID", default_value = "")]
    pub mqtt_client_id: String,

    /// Identity of the managed door
    #[arg(long, env = "DOORLINK_DOOR_ID", default_value = DEFAULT_DOOR_ID)]
    pub door_id: DoorId,

    /// Time to wait for the controller before answering with a timeout
    #[arg(long, env = "DOORLINK_REQUEST_TIMEOUT_MS", default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub request_timeout_ms: u64,

    /// Window during which identical audit entries are suppressed
    #[arg(long, env = "DOORLINK_DEDUP_WINDOW_MS", default_value_t = DEFAULT_DEDUP_WINDOW_MS)]
    pub dedup_window_ms: u64,

    #[arg(long, env = "DOORLINK_DEDUP_BUCKET_MS", default_value_t = DEFAULT_DEDUP_BUCKET_MS)]
    pub dedup_bucket_ms: u64,

    /// What to do with pending requests when the door closes without a request id
    #[arg(
        long,
        env = "DOORLINK_UNMATCHED_CLOSE_POLICY",
        default_value = "deny-pending"
    )]
    pub unmatched_close_policy: UnmatchedClosePolicy,

    /// Create the default users when the users table is empty
    #[arg(long, env = "DOORLINK_SEED_USERS", default_value_t = true, action = ArgAction::Set)]
    pub seed_users: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "DOORLINK_LOG_JSON", default_value_t = false, action = ArgAction::Set)]
    pub log_json: bool,
}

impl Settings {
    /// Listen address, with `PORT` taking precedence over the configured port.
    pub fn listen_addr(&self) -> SocketAddr {
        match self.port {
            Some(port) => SocketAddr::new(self.http_addr.ip(), port),
            None => self.http_addr,
        }
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_path)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .door_id(self.door_id.clone())
            .request_timeout(Duration::from_millis(self.request_timeout_ms))
            .dedup_window(Duration::from_millis(self.dedup_window_ms))
            .dedup_bucket(Duration::from_millis(self.dedup_bucket_ms))
            .unmatched_close(self.unmatched_close_policy)
    }

    pub fn mqtt_config(&self) -> TransportResult<MqttConfig> {
        Ok(MqttConfig::from_url(&self.mqtt_url)?.client_id(self.mqtt_client_id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Settings {
        Settings::try_parse_from(std::iter::once("doorlink").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = parse(&[]);
        assert_eq!(settings.transport, TransportKind::Mqtt);
        assert_eq!(settings.door_id.as_str(), "Puerta Principal");
        assert_eq!(settings.database_path, "doorlink.db");

        let engine = settings.engine_config();
        assert_eq!(engine.request_timeout, Duration::from_secs(10));
        assert_eq!(engine.dedup_window, Duration::from_secs(3));
        assert_eq!(engine.dedup_bucket, Duration::from_secs(1));
        assert_eq!(engine.unmatched_close, UnmatchedClosePolicy::DenyPending);
        assert!(engine.validate().is_ok());
    }

    #[rstest]
    #[case(&["--port", "8080"], "0.0.0.0:8080")]
    #[case(&["--http-addr", "127.0.0.1:9000", "--port", "9100"], "127.0.0.1:9100")]
    #[case(&["--http-addr", "[::1]:9000", "--port", "9200"], "[::1]:9200")]
    fn test_listen_addr(#[case] args: &[&str], #[case] expected: &str) {
        assert_eq!(parse(args).listen_addr().to_string(), expected);
    }

    #[test]
    fn test_flags_override_defaults() {
        let settings = parse(&[
            "--transport",
            "loopback",
            "--unmatched-close-policy",
            "ignore",
            "--seed-users",
            "false",
            "--request-timeout-ms",
            "2500",
        ]);
        assert_eq!(settings.transport, TransportKind::Loopback);
        assert!(!settings.seed_users);

        let engine = settings.engine_config();
        assert_eq!(engine.unmatched_close, UnmatchedClosePolicy::Ignore);
        assert_eq!(engine.request_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let result =
            Settings::try_parse_from(["doorlink", "--unmatched-close-policy", "sometimes"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_mqtt_config_from_url() {
        let settings = parse(&[
            "--mqtt-url",
            "mqtt://broker.local:1884",
            "--mqtt-client-id",
            "door-1",
        ]);
        let mqtt = settings.mqtt_config().unwrap();
        assert_eq!(mqtt.host, "broker.local");
        assert_eq!(mqtt.port, 1884);
        assert_eq!(mqtt.client_id, "door-1");
    }
}
