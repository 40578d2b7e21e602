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

use super::msg_keepalive::KeepaliveMessage;
use super::msg_notification::{BgpError, MessageHeaderError, NotificationMessage};
use super::msg_open::OpenMessage;
use super::msg_route_refresh::RouteRefreshMessage;
use super::msg_update::UpdateMessage;
use super::utils::ParserError;

pub const BGP_HEADER_SIZE_BYTES: usize = 19;
pub const MAX_MESSAGE_SIZE: u16 = 4096;
/// RFC 8654 ceiling once Extended Message is negotiated by both sides.
pub const MAX_EXTENDED_MESSAGE_SIZE: u16 = u16::MAX;

// BGP header marker (16 bytes of 0xFF)
pub const BGP_MARKER: [u8; 16] = [0xff; 16];

/// Wire-format knobs that depend on negotiated capabilities. Decoding and
/// encoding before the OPEN exchange uses `PRE_OPEN_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageFormat {
    /// RFC 6793: AS_PATH elements are 4 bytes wide, AGGREGATOR is 8.
    pub four_octet_asn: bool,
    /// RFC 8654: maximum message length is 65535 instead of 4096.
    pub extended_message: bool,
}

pub const PRE_OPEN_FORMAT: MessageFormat = MessageFormat {
    four_octet_asn: false,
    extended_message: false,
};

impl MessageFormat {
    pub fn max_message_size(&self) -> u16 {
        if self.extended_message {
            MAX_EXTENDED_MESSAGE_SIZE
        } else {
            MAX_MESSAGE_SIZE
        }
    }
}

impl Default for MessageFormat {
    fn default() -> Self {
        PRE_OPEN_FORMAT
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Open = 1,
    Update = 2,
    Notification = 3,
    Keepalive = 4,
    RouteRefresh = 5,
}

impl MessageType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ParserError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageType::Open),
            2 => Ok(MessageType::Update),
            3 => Ok(MessageType::Notification),
            4 => Ok(MessageType::Keepalive),
            5 => Ok(MessageType::RouteRefresh),
            _ => Err(ParserError::BgpError {
                error: BgpError::MessageHeaderError(MessageHeaderError::BadMessageType),
                data: vec![value],
            }),
        }
    }
}

/// Trait for BGP message types that can serialize themselves.
pub trait Message {
    /// Returns the message type identifier
    fn kind(&self) -> MessageType;

    /// Serializes the message body (without BGP header)
    fn to_bytes(&self, format: &MessageFormat) -> Vec<u8>;

    /// Serializes the complete BGP message with header
    fn serialize(&self, format: &MessageFormat) -> Vec<u8> {
        let body = self.to_bytes(format);
        let mut message = Vec::with_capacity(BGP_HEADER_SIZE_BYTES + body.len());

        message.extend_from_slice(&BGP_MARKER);

        let length = BGP_HEADER_SIZE_BYTES as u16 + body.len() as u16;
        message.extend_from_slice(&length.to_be_bytes());

        message.push(self.kind().as_u8());
        message.extend_from_slice(&body);

        message
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum BgpMessage {
    Open(OpenMessage),
    Update(UpdateMessage),
    Keepalive(KeepaliveMessage),
    Notification(NotificationMessage),
    RouteRefresh(RouteRefreshMessage),
}

impl BgpMessage {
    pub fn from_bytes(
        message_type_val: u8,
        bytes: Vec<u8>,
        format: &MessageFormat,
    ) -> Result<Self, ParserError> {
        let message_type = MessageType::try_from(message_type_val)?;

        match message_type {
            MessageType::Open => Ok(BgpMessage::Open(OpenMessage::from_bytes(bytes)?)),
            MessageType::Update => Ok(BgpMessage::Update(UpdateMessage::from_bytes(
                bytes, format,
            )?)),
            MessageType::Keepalive => Ok(BgpMessage::Keepalive(KeepaliveMessage {})),
            MessageType::Notification => {
                Ok(BgpMessage::Notification(NotificationMessage::from_bytes(
                    bytes,
                )))
            }
            MessageType::RouteRefresh => Ok(BgpMessage::RouteRefresh(
                RouteRefreshMessage::from_bytes(bytes)?,
            )),
        }
    }

    pub fn kind(&self) -> MessageType {
        match self {
            BgpMessage::Open(_) => MessageType::Open,
            BgpMessage::Update(_) => MessageType::Update,
            BgpMessage::Keepalive(_) => MessageType::Keepalive,
            BgpMessage::Notification(_) => MessageType::Notification,
            BgpMessage::RouteRefresh(_) => MessageType::RouteRefresh,
        }
    }

    pub fn serialize(&self, format: &MessageFormat) -> Vec<u8> {
        match self {
            BgpMessage::Open(msg) => msg.serialize(format),
            BgpMessage::Update(msg) => msg.serialize(format),
            BgpMessage::Keepalive(msg) => msg.serialize(format),
            BgpMessage::Notification(msg) => msg.serialize(format),
            BgpMessage::RouteRefresh(msg) => msg.serialize(format),
        }
    }
}

pub(crate) fn validate_marker(header: &[u8]) -> Result<(), ParserError> {
    if header[0..16] != BGP_MARKER {
        return Err(ParserError::BgpError {
            error: BgpError::MessageHeaderError(MessageHeaderError::ConnectionNotSynchronized),
            data: Vec::new(),
        });
    }
    Ok(())
}

pub(crate) fn validate_length(
    message_length: u16,
    message_type: u8,
    format: &MessageFormat,
) -> Result<(), ParserError> {
    let bad_length = || ParserError::BgpError {
        error: BgpError::MessageHeaderError(MessageHeaderError::BadMessageLength),
        data: message_length.to_be_bytes().to_vec(),
    };

    if message_length < BGP_HEADER_SIZE_BYTES as u16 {
        return Err(bad_length());
    }

    if message_length > format.max_message_size() {
        return Err(bad_length());
    }

    // Message-type-specific minima (RFC 4271 Section 6.1)
    if message_type == MessageType::Keepalive.as_u8()
        && message_length != BGP_HEADER_SIZE_BYTES as u16
    {
        return Err(bad_length());
    }

    if message_type == MessageType::Open.as_u8() && message_length < 29 {
        return Err(bad_length());
    }

    if message_type == MessageType::Update.as_u8() && message_length < 23 {
        return Err(bad_length());
    }

    // NOTIFICATION minimum length is 21 (19 header + 2 for error code/subcode)
    if message_type == MessageType::Notification.as_u8() && message_length < 21 {
        return Err(bad_length());
    }

    Ok(())
}

pub(crate) fn validate_message_type(message_type: u8) -> Result<(), ParserError> {
    MessageType::try_from(message_type).map(|_| ())
}
