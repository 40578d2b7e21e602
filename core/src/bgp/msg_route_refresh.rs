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

use super::msg::{Message, MessageFormat, MessageType};
use super::msg_notification::{BgpError, MessageHeaderError};
use super::multiprotocol::{Afi, Safi};
use super::utils::ParserError;

/// ROUTE-REFRESH (RFC 2918).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRefreshMessage {
    pub afi: Afi,
    pub safi: Safi,
}

impl RouteRefreshMessage {
    pub fn new(afi: Afi, safi: Safi) -> Self {
        RouteRefreshMessage { afi, safi }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ParserError> {
        if bytes.len() != 4 {
            return Err(ParserError::BgpError {
                error: BgpError::MessageHeaderError(MessageHeaderError::BadMessageLength),
                data: (bytes.len() as u16).to_be_bytes().to_vec(),
            });
        }

        let afi_val = u16::from_be_bytes([bytes[0], bytes[1]]);
        let reserved = bytes[2];
        let safi_val = bytes[3];

        // RFC 2918: Reserved field must be 0
        if reserved != 0 {
            return Err(ParserError::BgpError {
                error: BgpError::MessageHeaderError(MessageHeaderError::BadMessageType),
                data: vec![reserved],
            });
        }

        let afi = Afi::try_from(afi_val)?;
        let safi = Safi::try_from(safi_val)?;

        Ok(RouteRefreshMessage { afi, safi })
    }
}

impl Message for RouteRefreshMessage {
    fn kind(&self) -> MessageType {
        MessageType::RouteRefresh
    }

    fn to_bytes(&self, _format: &MessageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.afi as u16).to_be_bytes());
        bytes.push(0); // Reserved
        bytes.push(self.safi as u8);
        bytes
    }
}
