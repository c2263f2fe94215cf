//! Chadt frame codec for tokio.
//!
//! This module provides a codec that encodes and decodes [`Message`] types
//! using the tokio codec framework.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, DecodingError};
use crate::message::Message;
use crate::wire::WireFormat;

/// Tokio codec for length-framed chadt messages.
///
/// Waits for a full header, reads the body length from it, then waits for
/// exactly that many body bytes before decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChadtCodec {
    format: WireFormat,
}

impl ChadtCodec {
    /// Create a codec for the given field widths.
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }
}

impl Decoder for ChadtCodec {
    type Item = Message;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<Message>> {
        let header_length = self.format.header_length();
        if src.len() < header_length {
            src.reserve(header_length - src.len());
            return Ok(None);
        }

        let frame_length = header_length + self.format.peek_length(src)?;
        if src.len() < frame_length {
            src.reserve(frame_length - src.len());
            return Ok(None);
        }

        let frame = src.split_to(frame_length);
        let message = self.format.decode(&frame)?;
        Ok(Some(message))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<Message>> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => {
                let buffered = src.len();
                src.advance(buffered);
                Err(DecodingError::TruncatedFrame { buffered }.into())
            }
        }
    }
}

impl Encoder<&Message> for ChadtCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, msg: &Message, dst: &mut BytesMut) -> error::Result<()> {
        let frame = self.format.encode(msg)?;
        dst.extend_from_slice(&frame);
        Ok(())
    }
}
