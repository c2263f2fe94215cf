//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use chadt_proto::{AddressField, LIST_SEPARATOR};
use thiserror::Error;

use super::Config;

/// Counter digits a temporary username must have room for in both address
/// fields ("user" needs 8 bytes to reach "user9999").
pub const TEMP_USERNAME_DIGITS: usize = 4;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("server.name '{name}' does not fit the {limit}-byte sender field")]
    ServerNameTooLong { name: String, limit: usize },
    #[error("server.default_username_base is required")]
    MissingUsernameBase,
    #[error(
        "server.default_username_base '{base}' plus {digits} digits does not fit the {limit}-byte {field} field",
        digits = TEMP_USERNAME_DIGITS
    )]
    UsernameBaseTooLong {
        base: String,
        field: AddressField,
        limit: usize,
    },
    #[error("server.username_min_length must be at least 1 and at most username_max_length")]
    InvalidUsernameBounds,
    #[error("protocol.{0} must be greater than zero")]
    ZeroFieldWidth(&'static str),
    #[error("protocol.socket_timeout_ms must be greater than zero")]
    ZeroSocketTimeout,
    #[error("protocol.broadcast_token is required")]
    MissingBroadcastToken,
    #[error("protocol.broadcast_token '{token}' does not fit the {limit}-byte recipient field")]
    BroadcastTokenTooLong { token: String, limit: usize },
    #[error("{field} must not contain ',' or surrounding whitespace: '{value}'")]
    IllegalName { field: &'static str, value: String },
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let server = &config.server;
    let protocol = &config.protocol;

    if protocol.sender_max_length == 0 {
        errors.push(ValidationError::ZeroFieldWidth("sender_max_length"));
    }
    if protocol.recipient_max_length == 0 {
        errors.push(ValidationError::ZeroFieldWidth("recipient_max_length"));
    }
    if protocol.socket_timeout_ms == 0 {
        errors.push(ValidationError::ZeroSocketTimeout);
    }

    // Server name goes in the sender field of every server message
    if server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    } else if server.name.len() > protocol.sender_max_length {
        errors.push(ValidationError::ServerNameTooLong {
            name: server.name.clone(),
            limit: protocol.sender_max_length,
        });
    }
    if !is_clean_name(&server.name) {
        errors.push(ValidationError::IllegalName {
            field: "server.name",
            value: server.name.clone(),
        });
    }

    // Broadcast token goes in the recipient field
    let token = &protocol.broadcast_token;
    if token.is_empty() {
        errors.push(ValidationError::MissingBroadcastToken);
    } else if token.len() > protocol.recipient_max_length {
        errors.push(ValidationError::BroadcastTokenTooLong {
            token: token.clone(),
            limit: protocol.recipient_max_length,
        });
    }
    if !is_clean_name(token) {
        errors.push(ValidationError::IllegalName {
            field: "protocol.broadcast_token",
            value: token.clone(),
        });
    }

    if server.default_username_base.is_empty() {
        errors.push(ValidationError::MissingUsernameBase);
    } else if !is_clean_name(&server.default_username_base) {
        errors.push(ValidationError::IllegalName {
            field: "server.default_username_base",
            value: server.default_username_base.clone(),
        });
    }

    // Temporary usernames travel in both address fields
    let wire = protocol.wire_format();
    let widest_temp = format!(
        "{}{}",
        server.default_username_base,
        "9".repeat(TEMP_USERNAME_DIGITS)
    );
    for (field, limit) in [
        (AddressField::Sender, protocol.sender_max_length),
        (AddressField::Recipient, protocol.recipient_max_length),
    ] {
        if !wire.fits(field, &widest_temp) {
            errors.push(ValidationError::UsernameBaseTooLong {
                base: server.default_username_base.clone(),
                field,
                limit,
            });
        }
    }
    if server.username_min_length == 0 || server.username_min_length > server.username_max_length {
        errors.push(ValidationError::InvalidUsernameBounds);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_clean_name(name: &str) -> bool {
    name.trim() == name && !name.contains(LIST_SEPARATOR)
}
