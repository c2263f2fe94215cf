//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use chadt_proto::{DEFAULT_RECIPIENT_MAX_LENGTH, DEFAULT_SENDER_MAX_LENGTH};

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "SERVER".to_string()
}

pub fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    36000
}

pub fn default_username_base() -> String {
    "user".to_string()
}

pub fn default_username_min_length() -> usize {
    1
}

pub fn default_username_max_length() -> usize {
    DEFAULT_SENDER_MAX_LENGTH
}

// =============================================================================
// Protocol Defaults
// =============================================================================

pub fn default_sender_max_length() -> usize {
    DEFAULT_SENDER_MAX_LENGTH
}

pub fn default_recipient_max_length() -> usize {
    DEFAULT_RECIPIENT_MAX_LENGTH
}

pub fn default_socket_timeout_ms() -> u64 {
    1000
}

pub fn default_broadcast_token() -> String {
    "ALL".to_string()
}
