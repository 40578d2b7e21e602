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

//! OPEN optional parameters and capability negotiation (RFC 3392/5492).

use super::msg_notification::{BgpError, OpenMessageError};
use super::multiprotocol::{Afi, AfiSafi, Safi};
use super::utils::ParserError;

pub const BGP_VERSION: u8 = 4;

/// RFC 6793: 16-bit stand-in ASN when the real ASN needs four octets.
pub const AS_TRANS: u16 = 23456;

// https://www.iana.org/assignments/capability-codes/capability-codes.xhtml
pub mod capability_code {
    pub const MULTIPROTOCOL: u8 = 1;
    pub const ROUTE_REFRESH: u8 = 2;
    pub const EXTENDED_MESSAGE: u8 = 6;
    pub const GRACEFUL_RESTART: u8 = 64;
    pub const FOUR_OCTET_ASN: u8 = 65;
    pub const ENHANCED_ROUTE_REFRESH: u8 = 70;
}

fn malformed_param() -> ParserError {
    ParserError::BgpError {
        error: BgpError::OpenMessageError(OpenMessageError::UnsupportedOptionalParameter),
        data: Vec::new(),
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Capability {
    Multiprotocol(AfiSafi),
    RouteRefresh,
    ExtendedMessage,
    /// Raw capability value: restart flags/time and per-family tuples
    /// (RFC 4724). Carried, not interpreted.
    GracefulRestart(Vec<u8>),
    FourOctetAsn(u32),
    EnhancedRouteRefresh,
    Unknown { code: u8, value: Vec<u8> },
}

impl Capability {
    pub fn code(&self) -> u8 {
        match self {
            Capability::Multiprotocol(_) => capability_code::MULTIPROTOCOL,
            Capability::RouteRefresh => capability_code::ROUTE_REFRESH,
            Capability::ExtendedMessage => capability_code::EXTENDED_MESSAGE,
            Capability::GracefulRestart(_) => capability_code::GRACEFUL_RESTART,
            Capability::FourOctetAsn(_) => capability_code::FOUR_OCTET_ASN,
            Capability::EnhancedRouteRefresh => capability_code::ENHANCED_ROUTE_REFRESH,
            Capability::Unknown { code, .. } => *code,
        }
    }

    fn value_bytes(&self) -> Vec<u8> {
        match self {
            Capability::Multiprotocol(afi_safi) => {
                let mut bytes = Vec::with_capacity(4);
                bytes.extend_from_slice(&(afi_safi.afi as u16).to_be_bytes());
                bytes.push(0); // Reserved
                bytes.push(afi_safi.safi as u8);
                bytes
            }
            Capability::RouteRefresh => Vec::new(),
            Capability::ExtendedMessage => Vec::new(),
            Capability::GracefulRestart(value) => value.clone(),
            Capability::FourOctetAsn(asn) => asn.to_be_bytes().to_vec(),
            Capability::EnhancedRouteRefresh => Vec::new(),
            Capability::Unknown { value, .. } => value.clone(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let value = self.value_bytes();
        let mut bytes = Vec::with_capacity(2 + value.len());
        bytes.push(self.code());
        bytes.push(value.len() as u8);
        bytes.extend_from_slice(&value);
        bytes
    }

    /// Parse one capability. Codes we do not negotiate, and multiprotocol
    /// values for address families we do not know, come back as `Unknown`
    /// so the OPEN still round-trips and the codes can be reported.
    pub fn from_bytes(code: u8, value: &[u8]) -> Result<Capability, ParserError> {
        match code {
            capability_code::MULTIPROTOCOL => {
                if value.len() != 4 {
                    return Err(malformed_param());
                }
                let afi_val = u16::from_be_bytes([value[0], value[1]]);
                let safi_val = value[3];
                match (Afi::try_from(afi_val), Safi::try_from(safi_val)) {
                    (Ok(afi), Ok(safi)) => Ok(Capability::Multiprotocol(AfiSafi::new(afi, safi))),
                    _ => Ok(Capability::Unknown {
                        code,
                        value: value.to_vec(),
                    }),
                }
            }
            capability_code::ROUTE_REFRESH => Ok(Capability::RouteRefresh),
            capability_code::EXTENDED_MESSAGE => Ok(Capability::ExtendedMessage),
            capability_code::GRACEFUL_RESTART => {
                if value.len() < 2 {
                    return Err(malformed_param());
                }
                Ok(Capability::GracefulRestart(value.to_vec()))
            }
            capability_code::FOUR_OCTET_ASN => {
                if value.len() != 4 {
                    return Err(malformed_param());
                }
                Ok(Capability::FourOctetAsn(u32::from_be_bytes([
                    value[0], value[1], value[2], value[3],
                ])))
            }
            capability_code::ENHANCED_ROUTE_REFRESH => Ok(Capability::EnhancedRouteRefresh),
            _ => Ok(Capability::Unknown {
                code,
                value: value.to_vec(),
            }),
        }
    }
}

// https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#bgp-parameters-11
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum OptionalParamType {
    Capabilities, // RFC3392, type 2
    Unknown(u8),
}

impl From<u8> for OptionalParamType {
    fn from(value: u8) -> Self {
        match value {
            2 => OptionalParamType::Capabilities,
            val => OptionalParamType::Unknown(val),
        }
    }
}

impl OptionalParamType {
    pub fn as_u8(&self) -> u8 {
        match self {
            OptionalParamType::Capabilities => 2,
            OptionalParamType::Unknown(val) => *val,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParamVal {
    Capabilities(Vec<Capability>),
    Unknown(Vec<u8>),
}

impl ParamVal {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ParamVal::Capabilities(caps) => {
                let mut bytes = Vec::new();
                for cap in caps {
                    bytes.extend_from_slice(&cap.to_bytes());
                }
                bytes
            }
            ParamVal::Unknown(data) => data.clone(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct OptionalParam {
    pub param_type: OptionalParamType,
    pub param_len: u8,
    pub param_value: ParamVal,
}

impl OptionalParam {
    /// Build a type-2 Capabilities parameter.
    pub fn capabilities(caps: Vec<Capability>) -> Self {
        let value = ParamVal::Capabilities(caps);
        let param_len = value.to_bytes().len() as u8;
        OptionalParam {
            param_type: OptionalParamType::Capabilities,
            param_len,
            param_value: value,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.push(self.param_type.as_u8());
        bytes.push(self.param_len);
        bytes.extend_from_slice(&self.param_value.to_bytes());
        bytes
    }
}

/// Parse the OPEN optional-parameters block.
pub fn read_optional_parameters(bytes: &[u8]) -> Result<Vec<OptionalParam>, ParserError> {
    let mut cursor = 0;
    let mut params: Vec<OptionalParam> = Vec::new();

    while cursor < bytes.len() {
        if cursor + 2 > bytes.len() {
            return Err(malformed_param());
        }
        let param_type = OptionalParamType::from(bytes[cursor]);
        let param_len = bytes[cursor + 1] as usize;
        cursor += 2;

        if cursor + param_len > bytes.len() {
            return Err(malformed_param());
        }
        let value = &bytes[cursor..cursor + param_len];
        cursor += param_len;

        let param_value = match param_type {
            OptionalParamType::Capabilities => {
                ParamVal::Capabilities(read_capabilities(value)?)
            }
            OptionalParamType::Unknown(_) => ParamVal::Unknown(value.to_vec()),
        };

        params.push(OptionalParam {
            param_type,
            param_len: param_len as u8,
            param_value,
        });
    }

    Ok(params)
}

fn read_capabilities(bytes: &[u8]) -> Result<Vec<Capability>, ParserError> {
    let mut cursor = 0;
    let mut caps = Vec::new();

    while cursor < bytes.len() {
        if cursor + 2 > bytes.len() {
            return Err(malformed_param());
        }
        let code = bytes[cursor];
        let len = bytes[cursor + 1] as usize;
        cursor += 2;

        if cursor + len > bytes.len() {
            return Err(malformed_param());
        }
        caps.push(Capability::from_bytes(code, &bytes[cursor..cursor + len])?);
        cursor += len;
    }

    Ok(caps)
}

/// Capability set announced by the peer, collected from its OPEN.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct PeerCapabilities {
    pub multiprotocol: Vec<AfiSafi>,
    pub route_refresh: bool,
    pub extended_message: bool,
    pub graceful_restart: bool,
    pub four_octet_asn: Option<u32>,
    pub enhanced_route_refresh: bool,
    /// Codes of capabilities we skipped during decode.
    pub unknown: Vec<u8>,
}

impl PeerCapabilities {
    pub fn from_params(params: &[OptionalParam]) -> Self {
        let mut caps = PeerCapabilities::default();
        for param in params {
            let ParamVal::Capabilities(list) = &param.param_value else {
                continue;
            };
            for cap in list {
                match cap {
                    Capability::Multiprotocol(afi_safi) => caps.multiprotocol.push(*afi_safi),
                    Capability::RouteRefresh => caps.route_refresh = true,
                    Capability::ExtendedMessage => caps.extended_message = true,
                    Capability::GracefulRestart(_) => caps.graceful_restart = true,
                    Capability::FourOctetAsn(asn) => caps.four_octet_asn = Some(*asn),
                    Capability::EnhancedRouteRefresh => caps.enhanced_route_refresh = true,
                    Capability::Unknown { code, .. } => caps.unknown.push(*code),
                }
            }
        }
        caps
    }

    pub fn supports_afi_safi(&self, afi_safi: &AfiSafi) -> bool {
        self.multiprotocol.contains(afi_safi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_round_trip() {
        let caps = vec![
            Capability::Multiprotocol(AfiSafi::ipv4_unicast()),
            Capability::RouteRefresh,
            Capability::ExtendedMessage,
            Capability::GracefulRestart(vec![0x40, 0x78]),
            Capability::FourOctetAsn(196608),
            Capability::EnhancedRouteRefresh,
        ];
        for cap in caps {
            let bytes = cap.to_bytes();
            let parsed = Capability::from_bytes(bytes[0], &bytes[2..]).unwrap();
            assert_eq!(parsed, cap, "round trip failed for {:?}", cap);
        }
    }

    #[test]
    fn test_unknown_capability_kept() {
        let cap = Capability::from_bytes(131, &[0x01, 0x02]).unwrap();
        assert_eq!(
            cap,
            Capability::Unknown {
                code: 131,
                value: vec![0x01, 0x02],
            }
        );
    }

    #[test]
    fn test_multiprotocol_unknown_family_kept() {
        // AFI 25 (L2VPN) is not negotiated here; the value must survive
        let cap = Capability::from_bytes(capability_code::MULTIPROTOCOL, &[0x00, 25, 0x00, 65])
            .unwrap();
        assert!(matches!(cap, Capability::Unknown { code: 1, .. }));
    }

    #[test]
    fn test_multiprotocol_bad_length() {
        assert!(Capability::from_bytes(capability_code::MULTIPROTOCOL, &[0x00, 0x01]).is_err());
    }

    #[test]
    fn test_read_optional_parameters_truncated() {
        // Declares 6 value bytes but carries 2
        let bytes = vec![0x02, 0x06, 0x01, 0x04];
        assert!(read_optional_parameters(&bytes).is_err());
    }

    #[test]
    fn test_peer_capabilities_from_params() {
        let params = vec![OptionalParam::capabilities(vec![
            Capability::Multiprotocol(AfiSafi::ipv4_unicast()),
            Capability::FourOctetAsn(65001),
            Capability::Unknown {
                code: 200,
                value: vec![],
            },
        ])];

        let caps = PeerCapabilities::from_params(&params);
        assert!(caps.supports_afi_safi(&AfiSafi::ipv4_unicast()));
        assert_eq!(caps.four_octet_asn, Some(65001));
        assert!(!caps.route_refresh);
        assert_eq!(caps.unknown, vec![200]);
    }

    #[test]
    fn test_optional_param_length() {
        let param = OptionalParam::capabilities(vec![Capability::Multiprotocol(
            AfiSafi::ipv4_unicast(),
        )]);
        // code + len + 4 value bytes
        assert_eq!(param.param_len, 6);
        assert_eq!(param.to_bytes(), vec![0x02, 0x06, 0x01, 0x04, 0x00, 0x01, 0x00, 0x01]);
    }
}
