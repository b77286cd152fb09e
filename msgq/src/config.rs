//! Configuration management

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub queue: QueueConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct QueueConfig {
    /// Seconds between expiry sweeps; 0 disables the sweeper
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_max_content_bytes")]
    pub max_content_bytes: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            max_content_bytes: default_max_content_bytes(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_max_content_bytes() -> usize {
    262_144 // 256KB
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Without an explicit path, `msgq.toml` in the working directory is
    /// used when present. Environment variables prefixed `MSGQ__` override
    /// file values (`MSGQ__SERVER__PORT`, `MSGQ__QUEUE__SWEEP_INTERVAL_SECS`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name("msgq").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("MSGQ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?;

        config
            .try_deserialize::<Config>()
            .context("invalid configuration")
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(source: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }
}
