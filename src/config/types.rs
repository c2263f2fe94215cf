//! Core configuration types and loading.

use std::path::Path;
use std::time::Duration;

use chadt_proto::{ConnectionOptions, WireFormat};
use serde::Deserialize;
use thiserror::Error;

use super::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server identity, listen address and username rules.
    #[serde(default)]
    pub server: ServerConfig,
    /// Wire format and socket behaviour shared with clients.
    #[serde(default)]
    pub protocol: ProtocolConfig,
    /// Fan-out behaviour.
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity and username negotiation rules.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Sender name on server-originated messages.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Interface to bind.
    #[serde(default = "default_listen_host")]
    pub listen_host: String,
    /// Port to listen on; 0 picks a free port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prefix of temporary usernames ("user" gives user0, user1, ...).
    #[serde(default = "default_username_base")]
    pub default_username_base: String,
    /// Shortest username a client may request, in bytes.
    #[serde(default = "default_username_min_length")]
    pub username_min_length: usize,
    /// Longest username a client may request, in bytes. Further capped by
    /// both `protocol.sender_max_length` and `protocol.recipient_max_length`.
    #[serde(default = "default_username_max_length")]
    pub username_max_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            listen_host: default_listen_host(),
            port: default_port(),
            default_username_base: default_username_base(),
            username_min_length: default_username_min_length(),
            username_max_length: default_username_max_length(),
        }
    }
}

/// Connection options source: field widths, timeout, broadcast token.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolConfig {
    /// Width of the sender header field in bytes.
    #[serde(default = "default_sender_max_length")]
    pub sender_max_length: usize,
    /// Width of the recipient header field in bytes.
    #[serde(default = "default_recipient_max_length")]
    pub recipient_max_length: usize,
    /// Bound on each socket read, write and accept (milliseconds).
    #[serde(default = "default_socket_timeout_ms")]
    pub socket_timeout_ms: u64,
    /// Recipient meaning "every connected client".
    #[serde(default = "default_broadcast_token")]
    pub broadcast_token: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            sender_max_length: default_sender_max_length(),
            recipient_max_length: default_recipient_max_length(),
            socket_timeout_ms: default_socket_timeout_ms(),
            broadcast_token: default_broadcast_token(),
        }
    }
}

impl ProtocolConfig {
    /// Header field widths.
    pub fn wire_format(&self) -> WireFormat {
        WireFormat::new(self.sender_max_length, self.recipient_max_length)
    }

    /// Socket timeout as a [`Duration`].
    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }

    /// Options for every connection the server opens or accepts.
    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            wire: self.wire_format(),
            socket_timeout: self.socket_timeout(),
        }
    }
}

/// Relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Deliver a relayed message back to its own sender (default: true).
    #[serde(default = "default_true")]
    pub echo_to_sender: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            echo_to_sender: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.name, "SERVER");
        assert_eq!(config.server.port, 36000);
        assert_eq!(config.server.default_username_base, "user");
        assert_eq!(config.protocol.broadcast_token, "ALL");
        assert_eq!(config.protocol.wire_format(), WireFormat::default());
        assert!(config.relay.echo_to_sender);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[protocol]
socket_timeout_ms = 250

[relay]
echo_to_sender = false
"#,
        )
        .unwrap();
        assert_eq!(config.protocol.socket_timeout(), Duration::from_millis(250));
        assert_eq!(config.protocol.sender_max_length, 32);
        assert!(!config.relay.echo_to_sender);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nname = \"hub\"\nport = 4000").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.name, "hub");
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/chadt.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nname = ").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
