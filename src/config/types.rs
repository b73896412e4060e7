use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::broker::constants::{
    CLIENT_ID_PREFIX, CONNECT_TIMEOUT, KEEP_ALIVE, MIN_KEEP_ALIVE, TOPIC_OFF, TOPIC_ON, TOPIC_SAVE, TOPIC_SCENE,
};
use crate::broker::types::{ConnectOptions, Credentials, Endpoint, Scheme};
use crate::error::ConfigError;
use crate::fixture::store::DEFAULT_FIXTURE_COUNT;
use crate::fixture::types::Fixture;

pub const ENV_PROTOCOL: &str = "MQTT_PROTOCOL";
pub const ENV_ADDR: &str = "MQTT_ADDR";
pub const ENV_PORT: &str = "MQTT_PORT";

/// How a command behaves when the broker connection is not ready yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DispatchPolicy {
    /// Wait for the connection, then publish.
    AwaitConnection,
    /// Start connecting and drop this command's publish.
    DropUntilConnected,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        DispatchPolicy::AwaitConnection
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrokerConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub client_id_prefix: String,
    pub keep_alive_secs: u64,
    pub connect_timeout_ms: u64,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            scheme: "ws".to_string(),
            host: "localhost".to_string(),
            port: 8083,
            client_id_prefix: CLIENT_ID_PREFIX.to_string(),
            keep_alive_secs: KEEP_ALIVE,
            connect_timeout_ms: CONNECT_TIMEOUT,
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopicConfig {
    pub scene: String,
    pub save: String,
    pub on: String,
    pub off: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        TopicConfig {
            scene: TOPIC_SCENE.to_string(),
            save: TOPIC_SAVE.to_string(),
            on: TOPIC_ON.to_string(),
            off: TOPIC_OFF.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureConfig {
    pub id: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub broker: BrokerConfig,
    pub topics: TopicConfig,
    pub fixtures: Vec<FixtureConfig>,
    pub scene_catalog: Option<PathBuf>,
    pub dispatch: DispatchPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            broker: BrokerConfig::default(),
            topics: TopicConfig::default(),
            fixtures: (1..=DEFAULT_FIXTURE_COUNT)
                .map(|id| FixtureConfig { id, label: format!("Light {}", id) })
                .collect(),
            scene_catalog: None,
            dispatch: DispatchPolicy::default(),
        }
    }
}

impl Config {
    /// Overrides the broker address with `MQTT_PROTOCOL`, `MQTT_ADDR` and `MQTT_PORT`.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    pub fn apply_vars<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) -> Result<(), ConfigError> {
        let port = match lookup(ENV_PORT) {
            Some(value) => Some(
                value.trim().parse::<u16>()
                    .map_err(|source| ConfigError::InvalidPort { value, source })?
            ),
            None => None,
        };

        self.apply_overrides(lookup(ENV_PROTOCOL), lookup(ENV_ADDR), port);
        Ok(())
    }

    pub fn apply_overrides(&mut self, scheme: Option<String>, host: Option<String>, port: Option<u16>) {
        if let Some(scheme) = scheme {
            self.broker.scheme = scheme;
        }
        if let Some(host) = host {
            self.broker.host = host;
        }
        if let Some(port) = port {
            self.broker.port = port;
        }
    }

    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        let scheme = self.broker.scheme.parse::<Scheme>()
            .map_err(|_| ConfigError::UnsupportedScheme { scheme: self.broker.scheme.clone() })?;

        Ok(Endpoint {
            scheme,
            host: self.broker.host.clone(),
            port: self.broker.port,
        })
    }

    /// Generates a fresh client id, call once per process.
    pub fn connect_options(&self) -> Result<ConnectOptions, ConfigError> {
        let keep_alive = self.broker.keep_alive_secs;
        if keep_alive < MIN_KEEP_ALIVE {
            return Err(ConfigError::InvalidKeepAlive { value: keep_alive });
        }

        let credentials = match (&self.broker.username, &self.broker.password) {
            (Some(username), password) => Some(Credentials {
                username: username.clone(),
                password: password.clone().unwrap_or_default(),
            }),
            (None, _) => None,
        };

        Ok(ConnectOptions::new(
            &self.broker.client_id_prefix,
            Duration::from_secs(keep_alive),
            credentials,
        ))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.broker.connect_timeout_ms)
    }

    pub fn make_fixtures(&self) -> Result<Vec<Fixture>, ConfigError> {
        let mut seen = HashSet::new();
        self.fixtures.iter()
            .map(|fixture| {
                if !seen.insert(fixture.id) {
                    return Err(ConfigError::DuplicateFixture { id: fixture.id });
                }
                Ok(Fixture::new(fixture.id, fixture.label.clone()))
            })
            .collect()
    }
}
