//! Environment-driven configuration

use std::net::SocketAddr;
use std::str::FromStr;

use webrelay_shared::limits;

/// Daemon configuration, sourced from `WEBRELAY_*` environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Serial console port; `None` disables the local command interface
    pub serial_port: Option<String>,
    pub serial_baud: u32,
    /// Listen address for the local web UI
    pub http_addr: SocketAddr,
    /// Path of the persistent settings file
    pub store_path: String,
    /// Remote poll interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial_port: None,
            serial_baud: 115_200,
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            store_path: "./data/webrelay.json".to_string(),
            poll_interval_ms: limits::POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            serial_port: std::env::var("WEBRELAY_SERIAL_PORT")
                .ok()
                .filter(|port| !port.is_empty()),
            serial_baud: env_parse("WEBRELAY_SERIAL_BAUD", defaults.serial_baud),
            http_addr: env_parse("WEBRELAY_HTTP_ADDR", defaults.http_addr),
            store_path: std::env::var("WEBRELAY_STORE_PATH").unwrap_or(defaults.store_path),
            poll_interval_ms: env_parse("WEBRELAY_POLL_INTERVAL_MS", defaults.poll_interval_ms),
        }
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.serial_port, None);
        assert_eq!(config.serial_baud, 115_200);
        assert_eq!(config.http_addr.port(), 8080);
        assert_eq!(config.poll_interval_ms, limits::POLL_INTERVAL_MS);
    }
}
