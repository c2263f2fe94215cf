//! Error types for the chadt protocol library.
//!
//! This module defines errors for frame encoding, frame decoding and
//! connection-level failures.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Which fixed-width address field of a frame an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    /// The sender field.
    Sender,
    /// The recipient field.
    Recipient,
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Recipient => f.write_str("recipient"),
        }
    }
}

/// Errors raised while turning a [`crate::Message`] into a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EncodingError {
    /// An address does not fit into its fixed-width header field.
    #[error("{field} too long: {actual} bytes (limit: {limit})")]
    AddressTooLong {
        /// The offending field.
        field: AddressField,
        /// Encoded length of the address.
        actual: usize,
        /// Width of the header field.
        limit: usize,
    },

    /// Message text cannot be described by the 16-bit length field.
    #[error("text too long: {actual} bytes (limit: {limit})")]
    TextTooLong {
        /// Encoded length of the text.
        actual: usize,
        /// Maximum encodable length.
        limit: usize,
    },
}

/// Errors raised while parsing a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodingError {
    /// Fewer bytes than a complete header.
    #[error("header too short: {actual} bytes (need {needed})")]
    HeaderTooShort {
        /// Bytes available.
        actual: usize,
        /// Header length.
        needed: usize,
    },

    /// The body does not match the length declared in the header.
    #[error("length mismatch: header declares {declared} bytes, body has {actual}")]
    LengthMismatch {
        /// Length from the header.
        declared: usize,
        /// Bytes actually present after the header.
        actual: usize,
    },

    /// The stream ended part way through a frame.
    #[error("stream ended inside a frame ({buffered} bytes buffered)")]
    TruncatedFrame {
        /// Bytes received for the incomplete frame.
        buffered: usize,
    },

    /// The message type byte is not a known code.
    #[error("unknown message type code: {0}")]
    UnknownMessageType(u8),

    /// The version byte is not one this library speaks.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// A field contained invalid UTF-8.
    #[error("invalid UTF-8 in {field} at byte {byte_pos}")]
    InvalidUtf8 {
        /// Name of the field.
        field: &'static str,
        /// Offset within the field where validation failed.
        byte_pos: usize,
    },
}

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode a message.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Failed to decode a frame.
    #[error("decoding error: {0}")]
    Decoding(#[from] DecodingError),
}

/// Errors surfaced by [`crate::Connection`] operations.
#[cfg(feature = "tokio")]
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectionError {
    /// The peer closed the socket cleanly before sending a header byte.
    #[error("peer disconnected")]
    PeerDisconnected,

    /// No frame arrived within the socket timeout.
    #[error("read timed out")]
    ReadTimeout,

    /// A frame could not be written within the socket timeout.
    #[error("write timed out")]
    WriteTimeout,

    /// No inbound connection arrived within the socket timeout.
    #[error("accept timed out")]
    AcceptTimeout,

    /// The operation is not valid in the connection's current state.
    #[error("cannot {operation} while {status}")]
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// The state the connection was in.
        status: crate::connection::ConnectionStatus,
    },

    /// Accepting was attempted on a connection that is not listening.
    #[error("connection is not listening")]
    NotListening,

    /// Framing failed.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// Socket setup or teardown failed.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "tokio")]
impl ConnectionError {
    /// Whether this error is a routine timeout rather than a failure.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ReadTimeout | Self::WriteTimeout | Self::AcceptTimeout
        )
    }
}
