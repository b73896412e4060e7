use std::fmt::Display;
use std::io;
use std::num::ParseIntError;
use std::str::Utf8Error;
use log::error;
use thiserror::Error;
use rumqttc::v5::ClientError;
use serde_json;

use crate::fixture::types::ColorChannel;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on config file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },

    #[error("Unsupported broker protocol scheme \"{scheme}\"")]
    UnsupportedScheme { scheme: String },

    #[error("Invalid broker port \"{value}\": {source}")]
    InvalidPort { value: String, source: ParseIntError },

    #[error("Broker keep alive must be at least 5 seconds, got {value}")]
    InvalidKeepAlive { value: u64 },

    #[error("Duplicate fixture id {id} in config")]
    DuplicateFixture { id: u32 },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read scene catalog: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse scene catalog: {source}")]
    JsonError { #[from] source: serde_json::Error },

    #[error("Scene \"{name}\" must have 3 or 4 channel values, found {count}")]
    ChannelCount { name: String, count: usize },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Error communicating with broker (rumqttc): {source}")]
    Client { #[from] source: ClientError },

    #[error("The transport session is closed")]
    Closed,
}

/// A powered fixture has a color channel without a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Please fill in all fields ({label} has no {channel} value)")]
pub struct ValidationError {
    pub fixture_id: u32,
    pub label: String,
    pub channel: ColorChannel,
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{source}")]
    Validation { #[from] source: ValidationError },

    #[error("Unknown light {id}")]
    UnknownFixture { id: u32 },

    #[error("Unknown scene or preset \"{name}\"")]
    UnknownScene { name: String },

    #[error("{message}")]
    Connection { message: String },

    #[error("Timed out waiting for the broker connection")]
    ConnectTimeout,

    #[error("Not connected to the broker")]
    NotConnected,

    #[error("The broker session has been closed")]
    SessionClosed,

    #[error("Failed to publish: {source}")]
    Transport { #[from] source: TransportError },

    #[error("Failed to encode payload: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

impl DispatchError {
    /// Transport errors are announced by the coordinator when the event arrives.
    pub fn is_surfaced(&self) -> bool {
        matches!(self, DispatchError::Connection { .. })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShellError {
    #[error("Unknown command \"{command}\", type help for a list of commands")]
    UnknownCommand { command: String },

    #[error("Missing argument: {name}")]
    MissingArgument { name: &'static str },

    #[error("Invalid light id: {source}")]
    InvalidFixtureId { #[from] source: ParseIntError },

    #[error("Invalid color channel \"{channel}\", expected red, green, blue or white")]
    InvalidChannel { channel: String },
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("Failed to start application (scene catalog): {source}")]
    CatalogError { #[from] source: CatalogError },
}

pub fn report_error<T: Display>(message: &'static str, error: &T) {
    let message = format!("{}: {}", message, error);
    error!("{}", &message);
    eprintln!("{}", &message);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_lock_failure(error: &AppRunError) -> bool {
        match error {
            AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } } => true,
            AppRunError::ConfigError { .. } | AppRunError::CatalogError { .. } => false,
        }
    }

    #[test]
    fn test_startup_errors_wrap_config_and_catalog() {
        let locked: AppRunError = ConfigError::CanNotLock { source: io::Error::from(io::ErrorKind::WouldBlock) }.into();
        assert!(is_lock_failure(&locked));

        let keep_alive: AppRunError = ConfigError::InvalidKeepAlive { value: 0 }.into();
        assert!(!is_lock_failure(&keep_alive));
        assert_eq!(
            keep_alive.to_string(),
            "Failed to start application (config): Broker keep alive must be at least 5 seconds, got 0",
        );

        let catalog: AppRunError = CatalogError::ChannelCount { name: "Red".to_string(), count: 2 }.into();
        assert!(!is_lock_failure(&catalog));
    }
}
