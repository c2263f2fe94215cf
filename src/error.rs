//! Unified error handling for chadt.
//!
//! Handler errors describe why an inbound message could not be acted on and
//! know which reply, if any, the requester should see. Server errors cover
//! the lifecycle of the server itself.

use chadt_proto::{ConnectionError, Message, MessageType};
use thiserror::Error;

use crate::state::SessionId;

// ============================================================================
// Handler Errors (message dispatch)
// ============================================================================

/// Errors that can occur while dispatching an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("username in use: {0}")]
    UsernameInUse(String),

    #[error("erroneous username '{name}': {reason}")]
    ErroneousUsername { name: String, reason: &'static str },

    #[error("unexpected message type from client: {0}")]
    UnexpectedMessageType(MessageType),

    #[error("no session registered for {0}")]
    UnknownSession(SessionId),

    #[error("session {0} is closed")]
    SessionClosed(SessionId),
}

impl HandlerError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UsernameInUse(_) => "username_in_use",
            Self::ErroneousUsername { .. } => "erroneous_username",
            Self::UnexpectedMessageType(_) => "unexpected_message_type",
            Self::UnknownSession(_) => "unknown_session",
            Self::SessionClosed(_) => "session_closed",
        }
    }

    /// Convert to the reply the requester should receive.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply.
    pub fn to_reply(&self, server_name: &str, recipient: &str) -> Option<Message> {
        match self {
            Self::UsernameInUse(name) | Self::ErroneousUsername { name, .. } => {
                Some(Message::username_rejected(name, server_name, recipient))
            }
            Self::UnexpectedMessageType(ty) => Some(Message::error(
                format!("unexpected message type {ty}"),
                server_name,
                recipient,
            )),

            // These errors don't get client-visible replies
            Self::UnknownSession(_) => None,
            Self::SessionClosed(_) => None,
        }
    }
}

/// Result type for message handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Server Errors (lifecycle)
// ============================================================================

/// Errors raised while starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server is already running")]
    AlreadyStarted,

    #[error("failed to bind listener: {0}")]
    Bind(#[from] ConnectionError),
}
