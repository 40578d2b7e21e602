// Copyright 2026 bgpcore Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Streaming message framing. The decoder peels whole BGP messages off an
//! accumulating buffer; incomplete trailing bytes stay in the buffer until
//! the socket delivers the rest.

use super::msg::{
    validate_length, validate_marker, validate_message_type, BgpMessage, MessageFormat,
    BGP_HEADER_SIZE_BYTES, PRE_OPEN_FORMAT,
};
use super::utils::ParserError;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

#[derive(Debug, Clone)]
pub struct MessageCodec {
    format: MessageFormat,
}

impl MessageCodec {
    /// Codec in pre-OPEN format: 2-byte ASNs, 4096-byte cap.
    pub fn new() -> Self {
        MessageCodec {
            format: PRE_OPEN_FORMAT,
        }
    }

    pub fn format(&self) -> &MessageFormat {
        &self.format
    }

    /// Switch to the format negotiated by the OPEN exchange. Applies to
    /// every message framed after this call.
    pub fn set_format(&mut self, format: MessageFormat) {
        self.format = format;
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        MessageCodec::new()
    }
}

impl Decoder for MessageCodec {
    type Item = BgpMessage;
    type Error = ParserError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BgpMessage>, ParserError> {
        if src.len() < BGP_HEADER_SIZE_BYTES {
            return Ok(None);
        }

        // Validate header fields (RFC 4271 Section 6.1)
        validate_marker(&src[..16])?;

        let message_length = u16::from_be_bytes([src[16], src[17]]);
        let message_type = src[18];

        validate_length(message_length, message_type, &self.format)?;
        validate_message_type(message_type)?;

        if src.len() < message_length as usize {
            src.reserve(message_length as usize - src.len());
            return Ok(None);
        }

        let frame = src.split_to(message_length as usize);
        let body = frame[BGP_HEADER_SIZE_BYTES..].to_vec();

        BgpMessage::from_bytes(message_type, body, &self.format).map(Some)
    }
}

impl Encoder<&BgpMessage> for MessageCodec {
    type Error = ParserError;

    fn encode(&mut self, msg: &BgpMessage, dst: &mut BytesMut) -> Result<(), ParserError> {
        dst.extend_from_slice(&msg.serialize(&self.format));
        Ok(())
    }
}
