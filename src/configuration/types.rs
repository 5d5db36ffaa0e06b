use crate::error_handling::types::ConfigError;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime parameters of the server.
///
/// Every field has a default matching the reference deployment, so an empty
/// configuration file (or none at all) yields a working local server. Fields
/// can be set from a TOML file and selectively overridden from the command
/// line (see `main`).
///
/// # Fields Overview
///
/// - `bind_address` / `port`: the single listening endpoint
/// - `max_clients`: admission ceiling; connections beyond it are rejected
///   with a fixed message before any session state is created
/// - `file_repo`: directory whose regular files are exposed to `list` and
///   `download`
/// - `buffer_size`: chunk size for socket reads and file streaming
/// - `poll_interval_ms`: bound on every blocking accept/read, so each loop
///   periodically re-checks the shutdown flag
/// - `shutdown_grace_secs`: per-handler join window during shutdown
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// IP address to listen on.
    pub bind_address: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Maximum number of concurrently served sessions.
    pub max_clients: usize,

    /// Directory containing the files available for download.
    pub file_repo: PathBuf,

    /// Size in bytes of the socket and file-streaming buffers.
    pub buffer_size: usize,

    /// Shutdown-flag polling interval for blocking accept/read operations.
    pub poll_interval_ms: u64,

    /// How long shutdown waits for each outstanding session handler before
    /// giving up on it.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 12000,
            max_clients: 3,
            file_repo: PathBuf::from("server_files"),
            buffer_size: 4096,
            poll_interval_ms: 1000,
            shutdown_grace_secs: 2,
        }
    }
}

impl ServerConfig {
    /// Checks that the configuration describes a runnable server.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_clients == 0 {
            return Err(ConfigError::NotInRange(
                "max_clients must be at least 1".to_string(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::NotInRange(
                "buffer_size must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::NotInRange(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }
        self.socket_addr().map(|_| ())
    }

    /// The listening endpoint as a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let endpoint = format!("{}:{}", self.bind_address, self.port);
        endpoint
            .parse()
            .map_err(|_| ConfigError::BadAddress(endpoint))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.port, 12000);
        assert_eq!(config.max_clients, 3);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:12000");
    }

    #[test]
    fn test_zero_max_clients_rejected() {
        let config = ServerConfig {
            max_clients: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_buffer_size_rejected() {
        let config = ServerConfig {
            buffer_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_address_rejected() {
        let config = ServerConfig {
            bind_address: "not-an-ip".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(crate::error_handling::types::ConfigError::BadAddress(_))
        ));
    }
}
