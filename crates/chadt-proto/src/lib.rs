//! # chadt-proto
//!
//! Wire protocol for the chadt chat service: the [`Message`] value, its
//! fixed-header binary framing, and a tokio-based [`Connection`] that owns
//! one socket and exchanges whole frames over it.
//!
//! ## Features
//!
//! - Pure encode/decode with configurable address field widths ([`WireFormat`])
//! - Optional Tokio integration: a [`ChadtCodec`] for `tokio_util` framing and
//!   the [`Connection`] lifecycle (enabled by the default `tokio` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use chadt_proto::{Message, MessageType, WireFormat};
//!
//! let format = WireFormat::default();
//! let msg = Message::text("Hello, world!", "alice", "ALL");
//!
//! let frame = format.encode(&msg).expect("fits the header");
//! assert_eq!(frame.len(), format.header_length() + msg.length());
//!
//! let decoded = format.decode(&frame).expect("valid frame");
//! assert_eq!(decoded.message_type, MessageType::Text);
//! assert_eq!(decoded, msg);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod message;
pub mod message_type;
pub mod wire;

#[cfg(feature = "tokio")]
pub mod codec;
#[cfg(feature = "tokio")]
pub mod connection;

pub use self::error::{AddressField, DecodingError, EncodingError, ProtocolError};
pub use self::message::{Message, LIST_SEPARATOR, PROTOCOL_VERSION};
pub use self::message_type::MessageType;
pub use self::wire::{
    decode, encode, FrameHeader, WireFormat, DEFAULT_RECIPIENT_MAX_LENGTH,
    DEFAULT_SENDER_MAX_LENGTH, MAX_TEXT_LENGTH,
};

#[cfg(feature = "tokio")]
pub use self::codec::ChadtCodec;
#[cfg(feature = "tokio")]
pub use self::connection::{
    Connection, ConnectionOptions, ConnectionStatus, DEFAULT_SOCKET_TIMEOUT,
};
#[cfg(feature = "tokio")]
pub use self::error::ConnectionError;
