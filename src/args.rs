use std::path::PathBuf;
use clap::Parser;

/// Control panel for the lighting installation, sends scenes and fixture colors over MQTT.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Use this config file instead of the portable or per-user one
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Broker protocol: mqtt, mqtts, ws or wss
    #[arg(long)]
    pub scheme: Option<String>,

    /// Broker host name
    #[arg(long)]
    pub host: Option<String>,

    /// Broker port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log debug messages
    #[arg(short, long)]
    pub verbose: bool,
}
