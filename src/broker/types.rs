use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::broker::constants::{CLIENT_ID_RANDOM_LEN, MQTT_PATH, PROTOCOL_ID, PROTOCOL_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
        };

        write!(f, "{}", result)
    }
}

/// Notifications from the transport, delivered in the order the transport emits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connect,
    Offline,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Mqtt,
    Mqtts,
    Ws,
    Wss,
}

impl FromStr for Scheme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mqtt" | "tcp" => Ok(Scheme::Mqtt),
            "mqtts" | "ssl" => Ok(Scheme::Mqtts),
            "ws" => Ok(Scheme::Ws),
            "wss" => Ok(Scheme::Wss),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self {
            Scheme::Mqtt => "mqtt",
            Scheme::Mqtts => "mqtts",
            Scheme::Ws => "ws",
            Scheme::Wss => "wss",
        };

        write!(f, "{}", result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn url(&self) -> String {
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, MQTT_PATH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub protocol_id: &'static str,
    pub protocol_version: u8,
    pub client_id: String,
    pub keep_alive: Duration,
    pub credentials: Option<Credentials>,
}

impl ConnectOptions {
    pub fn new(client_id_prefix: &str, keep_alive: Duration, credentials: Option<Credentials>) -> Self {
        ConnectOptions {
            protocol_id: PROTOCOL_ID,
            protocol_version: PROTOCOL_VERSION,
            client_id: generate_client_id(client_id_prefix),
            keep_alive,
            credentials,
        }
    }
}

/// Random suffix so that several panels do not kick each other off the broker.
pub fn generate_client_id(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &random[..CLIENT_ID_RANDOM_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let endpoint = Endpoint { scheme: Scheme::Ws, host: "10.0.0.2".to_string(), port: 8083 };
        assert_eq!(endpoint.url(), "ws://10.0.0.2:8083/mqtt");
    }

    #[test]
    fn test_client_id_has_random_hex_suffix() {
        let first = generate_client_id("panel_");
        let second = generate_client_id("panel_");

        assert_eq!(first.len(), "panel_".len() + 6);
        assert!(first.starts_with("panel_"));
        assert!(first["panel_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_connect_options() {
        let options = ConnectOptions::new("x_", Duration::from_secs(60), None);
        assert_eq!(options.protocol_id, "MQTT");
        assert_eq!(options.protocol_version, 5);
    }

    #[test]
    fn test_scheme_parse() {
        assert_eq!("WSS".parse::<Scheme>(), Ok(Scheme::Wss));
        assert_eq!("tcp".parse::<Scheme>(), Ok(Scheme::Mqtt));
        assert!("http".parse::<Scheme>().is_err());
    }
}
