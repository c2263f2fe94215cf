//! Binary frame layout.
//!
//! ```text
//! +---------+------+----------------+-------------------+--------+---------+
//! | version | type | sender         | recipient         | length | text    |
//! | u8      | u8   | sender_max_len | recipient_max_len | u16 BE | length  |
//! +---------+------+----------------+-------------------+--------+---------+
//! ```
//!
//! Address fields are UTF-8 right-padded with spaces to their fixed width;
//! padding is stripped on decode, so an address cannot end in a space.
//! Integers are big-endian.

use crate::error::{AddressField, DecodingError, EncodingError};
use crate::message::{Message, PROTOCOL_VERSION};
use crate::message_type::MessageType;

/// Default width of the sender field in bytes.
pub const DEFAULT_SENDER_MAX_LENGTH: usize = 32;

/// Default width of the recipient field in bytes.
pub const DEFAULT_RECIPIENT_MAX_LENGTH: usize = 32;

/// Largest text body the 16-bit length field can describe.
pub const MAX_TEXT_LENGTH: usize = u16::MAX as usize;

const PADDING: u8 = b' ';

/// Field widths shared by both ends of a connection.
///
/// Peers must agree on these values; they determine the header length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireFormat {
    /// Width of the sender field.
    pub sender_max_length: usize,
    /// Width of the recipient field.
    pub recipient_max_length: usize,
}

impl Default for WireFormat {
    fn default() -> Self {
        Self {
            sender_max_length: DEFAULT_SENDER_MAX_LENGTH,
            recipient_max_length: DEFAULT_RECIPIENT_MAX_LENGTH,
        }
    }
}

/// The decoded fixed-width part of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Protocol version.
    pub version: u8,
    /// Kind of message.
    pub message_type: MessageType,
    /// Sender with padding removed.
    pub sender: String,
    /// Recipient with padding removed.
    pub recipient: String,
    /// Body length in bytes.
    pub length: u16,
}

impl WireFormat {
    /// Create a format with explicit field widths.
    pub fn new(sender_max_length: usize, recipient_max_length: usize) -> Self {
        Self {
            sender_max_length,
            recipient_max_length,
        }
    }

    /// Size of the fixed header: version, type, both address fields, length.
    #[inline]
    pub fn header_length(&self) -> usize {
        2 + self.sender_max_length + self.recipient_max_length + 2
    }

    /// Offset of the 16-bit length field.
    #[inline]
    fn length_offset(&self) -> usize {
        2 + self.sender_max_length + self.recipient_max_length
    }

    /// Encode a message into a complete frame.
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>, EncodingError> {
        let text = message.text.as_bytes();
        if text.len() > MAX_TEXT_LENGTH {
            return Err(EncodingError::TextTooLong {
                actual: text.len(),
                limit: MAX_TEXT_LENGTH,
            });
        }

        let mut frame = Vec::with_capacity(self.header_length() + text.len());
        frame.push(message.version);
        frame.push(message.message_type.code());
        push_padded(
            &mut frame,
            AddressField::Sender,
            &message.sender,
            self.sender_max_length,
        )?;
        push_padded(
            &mut frame,
            AddressField::Recipient,
            &message.recipient,
            self.recipient_max_length,
        )?;
        frame.extend_from_slice(&(text.len() as u16).to_be_bytes());
        frame.extend_from_slice(text);
        Ok(frame)
    }

    /// Read only the body length from a header, without validating the rest.
    ///
    /// Used by stream decoders to know how many bytes to wait for.
    pub fn peek_length(&self, bytes: &[u8]) -> Result<usize, DecodingError> {
        self.check_header_len(bytes)?;
        let at = self.length_offset();
        Ok(u16::from_be_bytes([bytes[at], bytes[at + 1]]) as usize)
    }

    /// Decode the fixed header at the start of `bytes`.
    pub fn decode_header(&self, bytes: &[u8]) -> Result<FrameHeader, DecodingError> {
        self.check_header_len(bytes)?;

        let version = bytes[0];
        if version != PROTOCOL_VERSION {
            return Err(DecodingError::UnsupportedVersion(version));
        }
        let message_type = MessageType::try_from(bytes[1])?;

        let sender_end = 2 + self.sender_max_length;
        let recipient_end = sender_end + self.recipient_max_length;
        let sender = unpad(&bytes[2..sender_end], "sender")?;
        let recipient = unpad(&bytes[sender_end..recipient_end], "recipient")?;
        let length = u16::from_be_bytes([bytes[recipient_end], bytes[recipient_end + 1]]);

        Ok(FrameHeader {
            version,
            message_type,
            sender,
            recipient,
            length,
        })
    }

    /// Decode one complete frame. `bytes` must hold exactly the header and
    /// the `length` body bytes it declares.
    pub fn decode(&self, bytes: &[u8]) -> Result<Message, DecodingError> {
        let header = self.decode_header(bytes)?;
        let body = &bytes[self.header_length()..];
        let declared = header.length as usize;
        if body.len() != declared {
            return Err(DecodingError::LengthMismatch {
                declared,
                actual: body.len(),
            });
        }

        let text = std::str::from_utf8(body).map_err(|e| DecodingError::InvalidUtf8 {
            field: "text",
            byte_pos: e.valid_up_to(),
        })?;

        Ok(Message {
            version: header.version,
            message_type: header.message_type,
            sender: header.sender,
            recipient: header.recipient,
            text: text.to_owned(),
        })
    }

    /// Check that `address` fits the given field; used to validate
    /// usernames before they are handed out.
    pub fn fits(&self, field: AddressField, address: &str) -> bool {
        let limit = match field {
            AddressField::Sender => self.sender_max_length,
            AddressField::Recipient => self.recipient_max_length,
        };
        address.len() <= limit
    }

    fn check_header_len(&self, bytes: &[u8]) -> Result<(), DecodingError> {
        let needed = self.header_length();
        if bytes.len() < needed {
            return Err(DecodingError::HeaderTooShort {
                actual: bytes.len(),
                needed,
            });
        }
        Ok(())
    }
}

/// Encode `message` with the default field widths.
pub fn encode(message: &Message) -> Result<Vec<u8>, EncodingError> {
    WireFormat::default().encode(message)
}

/// Decode a frame with the default field widths.
pub fn decode(bytes: &[u8]) -> Result<Message, DecodingError> {
    WireFormat::default().decode(bytes)
}

fn push_padded(
    frame: &mut Vec<u8>,
    field: AddressField,
    value: &str,
    width: usize,
) -> Result<(), EncodingError> {
    let bytes = value.as_bytes();
    if bytes.len() > width {
        return Err(EncodingError::AddressTooLong {
            field,
            actual: bytes.len(),
            limit: width,
        });
    }
    frame.extend_from_slice(bytes);
    frame.resize(frame.len() + (width - bytes.len()), PADDING);
    Ok(())
}

fn unpad(field_bytes: &[u8], field: &'static str) -> Result<String, DecodingError> {
    let value = std::str::from_utf8(field_bytes).map_err(|e| DecodingError::InvalidUtf8 {
        field,
        byte_pos: e.valid_up_to(),
    })?;
    Ok(value.trim_end_matches(PADDING as char).to_owned())
}
