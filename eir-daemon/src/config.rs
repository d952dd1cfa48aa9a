//! Layered configuration: an optional TOML file, `serde(default)` matching
//! every default stated in the spec's external-interfaces section, with
//! `RUST_LOG` free to override `log_level` the same way `eir_core::init_logging`
//! already respects it.

use std::net::SocketAddr;
use std::time::Duration;

use eir_core::EngineConfig;
use serde::{Deserialize, Serialize};

fn default_bind_diameter() -> SocketAddr {
    "0.0.0.0:3868".parse().unwrap()
}

fn default_bind_http() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_write_timeout_secs() -> u64 {
    30
}

fn default_watchdog_interval_secs() -> u64 {
    30
}

fn default_watchdog_timeout_secs() -> u64 {
    10
}

fn default_max_connections() -> usize {
    1024
}

fn default_max_message_size() -> usize {
    1 << 20
}

fn default_channel_size() -> usize {
    64
}

fn default_origin_host() -> String {
    "eir.local".to_string()
}

fn default_origin_realm() -> String {
    "local".to_string()
}

fn default_product_name() -> String {
    "eir-daemon".to_string()
}

fn default_vendor_id() -> u32 {
    eir_diameter::VENDOR_ID_3GPP
}

/// Root deserialization target. Every field matches a default stated in
/// the external-interfaces section of the spec; all are overridable from
/// an optional TOML file given as the daemon's first CLI argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,

    #[serde(with = "socket_addr_str")]
    pub bind_addr_diameter: SocketAddr,
    #[serde(with = "socket_addr_str")]
    pub bind_addr_http: SocketAddr,
    pub log_level: String,

    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub watchdog_interval_secs: u64,
    pub watchdog_timeout_secs: u64,

    pub max_connections: usize,
    pub max_message_size: usize,
    pub send_channel_size: usize,
    pub recv_channel_size: usize,

    pub origin_host: String,
    pub origin_realm: String,
    pub product_name: String,
    pub vendor_id: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            bind_addr_diameter: default_bind_diameter(),
            bind_addr_http: default_bind_http(),
            log_level: default_log_level(),
            read_timeout_secs: default_read_timeout_secs(),
            write_timeout_secs: default_write_timeout_secs(),
            watchdog_interval_secs: default_watchdog_interval_secs(),
            watchdog_timeout_secs: default_watchdog_timeout_secs(),
            max_connections: default_max_connections(),
            max_message_size: default_max_message_size(),
            send_channel_size: default_channel_size(),
            recv_channel_size: default_channel_size(),
            origin_host: default_origin_host(),
            origin_realm: default_origin_realm(),
            product_name: default_product_name(),
            vendor_id: default_vendor_id(),
        }
    }
}

impl Config {
    /// Load from an optional TOML file path; missing path or missing
    /// fields fall back to the stated defaults. `RUST_LOG`, if set,
    /// overrides `log_level` exactly as `eir_core::init_logging` already
    /// gives `RUST_LOG` the final word.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str(&raw)?
            }
            None => Config::default(),
        };
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = level;
        }
        Ok(config)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_secs(self.watchdog_interval_secs)
    }

    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_secs(self.watchdog_timeout_secs)
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

mod socket_addr_str {
    use std::net::SocketAddr;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(addr: &SocketAddr, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&addr.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SocketAddr, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
