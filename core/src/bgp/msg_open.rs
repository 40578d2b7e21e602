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
use super::msg_notification::{BgpError, OpenMessageError};
use super::msg_open_types::{
    read_optional_parameters, Capability, OptionalParam, PeerCapabilities, AS_TRANS, BGP_VERSION,
};
use super::utils::{is_valid_unicast_ipv4, ParserError};

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct OpenMessage {
    pub version: u8,
    /// The 16-bit wire ASN. AS_TRANS when the real ASN is advertised via
    /// the four-octet capability. Use `peer_asn()` for the resolved value.
    pub asn: u16,
    pub hold_time: u16,
    pub bgp_identifier: u32,
    pub optional_params_len: u8,
    pub optional_params: Vec<OptionalParam>,
}

/// Validate BGP version (RFC 4271 Section 6.2)
fn validate_version(version: u8) -> Result<(), ParserError> {
    if version != BGP_VERSION {
        // RFC 4271: Data field is a 2-octet unsigned integer indicating the
        // largest locally-supported version number
        return Err(ParserError::BgpError {
            error: BgpError::OpenMessageError(OpenMessageError::UnsupportedVersionNumber),
            data: (BGP_VERSION as u16).to_be_bytes().to_vec(),
        });
    }
    Ok(())
}

/// Validate Hold Time (RFC 4271 Section 6.2)
/// MUST reject Hold Time values of one or two seconds
fn validate_hold_time(hold_time: u16) -> Result<(), ParserError> {
    if hold_time == 1 || hold_time == 2 {
        return Err(ParserError::BgpError {
            error: BgpError::OpenMessageError(OpenMessageError::UnacceptedHoldTime),
            data: Vec::new(),
        });
    }
    Ok(())
}

/// Validate BGP Identifier (RFC 4271 Section 6.2)
/// Must be a valid unicast IP host address.
fn validate_bgp_identifier(bgp_identifier: u32) -> Result<(), ParserError> {
    if !is_valid_unicast_ipv4(bgp_identifier) {
        return Err(ParserError::BgpError {
            error: BgpError::OpenMessageError(OpenMessageError::BadBgpIdentifier),
            data: Vec::new(),
        });
    }
    Ok(())
}

impl OpenMessage {
    /// OPEN with no optional parameters.
    pub fn new(asn: u16, hold_time: u16, bgp_identifier: u32) -> Self {
        OpenMessage {
            version: BGP_VERSION,
            asn,
            hold_time,
            bgp_identifier,
            optional_params_len: 0,
            optional_params: vec![],
        }
    }

    /// OPEN advertising the given capabilities. `asn` is the real 32-bit
    /// ASN; the 16-bit wire field carries AS_TRANS when it does not fit
    /// (RFC 6793).
    pub fn with_capabilities(
        asn: u32,
        hold_time: u16,
        bgp_identifier: u32,
        capabilities: Vec<Capability>,
    ) -> Self {
        let wire_asn = u16::try_from(asn).unwrap_or(AS_TRANS);
        let param = OptionalParam::capabilities(capabilities);
        let optional_params_len = param.to_bytes().len() as u8;
        OpenMessage {
            version: BGP_VERSION,
            asn: wire_asn,
            hold_time,
            bgp_identifier,
            optional_params_len,
            optional_params: vec![param],
        }
    }

    /// The peer's real ASN: the four-octet capability value when present,
    /// the 16-bit field otherwise.
    pub fn peer_asn(&self) -> u32 {
        self.capabilities()
            .four_octet_asn
            .unwrap_or(self.asn as u32)
    }

    pub fn capabilities(&self) -> PeerCapabilities {
        PeerCapabilities::from_params(&self.optional_params)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ParserError> {
        if bytes.len() < 10 {
            // Malformed OPEN body - Unspecific subcode
            return Err(ParserError::BgpError {
                error: BgpError::OpenMessageError(OpenMessageError::Unknown(0)),
                data: Vec::new(),
            });
        }

        let version = bytes[0];
        let asn = u16::from_be_bytes([bytes[1], bytes[2]]);
        let hold_time = u16::from_be_bytes([bytes[3], bytes[4]]);
        let bgp_identifier = u32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);

        let optional_params_len = bytes[9];
        let remaining_bytes_len = (bytes.len() - 10) as u8;
        if optional_params_len != remaining_bytes_len {
            return Err(ParserError::BgpError {
                error: BgpError::OpenMessageError(OpenMessageError::Unknown(0)),
                data: Vec::new(),
            });
        }

        // RFC 4271 Section 6.2
        validate_version(version)?;
        validate_hold_time(hold_time)?;
        validate_bgp_identifier(bgp_identifier)?;

        let optional_params = match optional_params_len {
            0 => vec![],
            _ => read_optional_parameters(&bytes[10..10 + optional_params_len as usize])?,
        };

        Ok(OpenMessage {
            version,
            asn,
            hold_time,
            bgp_identifier,
            optional_params_len,
            optional_params,
        })
    }
}

impl Message for OpenMessage {
    fn kind(&self) -> MessageType {
        MessageType::Open
    }

    fn to_bytes(&self, _format: &MessageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();

        bytes.push(self.version);
        bytes.extend_from_slice(&self.asn.to_be_bytes());
        bytes.extend_from_slice(&self.hold_time.to_be_bytes());
        bytes.extend_from_slice(&self.bgp_identifier.to_be_bytes());
        bytes.push(self.optional_params_len);
        for param in &self.optional_params {
            bytes.extend_from_slice(&param.to_bytes());
        }

        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bgp::msg::PRE_OPEN_FORMAT;
    use crate::bgp::msg_open_types::{OptionalParamType, ParamVal};
    use crate::bgp::multiprotocol::AfiSafi;

    // RFC2858
    const CAPABILITY_MP_EXTENSION_PARAM: &[u8] = &[
        0x02, // OptionalParam type
        0x06, // OptionalParam length
        0x01, // Capability code
        0x04, // Capability length
        // Capability value
        0x00, 0x01, // AFI
        0x00, // Reserved
        0x01, // SAFI
    ];
    const UNKNOWN_TYPE_PARAM: &[u8] = &[
        200,  // OptionalParam type (Unassigned)
        0x07, // OptionalParam length
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, // Param value
    ];

    const TEST_OPEN_MESSAGE_BODY: &[u8] = &[
        0x04, // Version
        0xfd, 0xe9, // ASN: 65001
        0x00, 0xb4, // Hold time: 180
        0x01, 0x01, 0x01, 0x01, // BGP ID: 0x01010101
        0x00, // Optional params len
    ];

    #[test]
    fn test_from_bytes() {
        let message: &[u8] = &[
            0x04, // Version
            0x04, 0xd2, // ASN
            0x00, 0x0a, // Hold time
            0x0a, 0x0a, 0x0a, 0x0a, // BGP identifier
            0x00, // Optional parameters length
        ];

        let open_message = OpenMessage::from_bytes(message.to_vec()).unwrap();
        assert_eq!(open_message.version, BGP_VERSION);
        assert_eq!(open_message.asn, 1234);
        assert_eq!(open_message.hold_time, 10);
        assert_eq!(open_message.bgp_identifier, 168430090);
        assert_eq!(open_message.optional_params_len, 0);
    }

    #[test]
    fn test_from_bytes_with_optional_param() {
        let message: Vec<u8> = [
            &[
                0x04, // Version
                0x04, 0xd2, // ASN
                0x00, 0x0a, // Hold time
                0x0a, 0x0a, 0x0a, 0x0a, // BGP identifier
                0x08, // Optional parameters length
            ],
            CAPABILITY_MP_EXTENSION_PARAM,
        ]
        .concat();

        let open_message = OpenMessage::from_bytes(message).unwrap();
        assert_eq!(open_message.optional_params_len, 8);
        assert_eq!(
            open_message.optional_params,
            vec![OptionalParam {
                param_type: OptionalParamType::Capabilities,
                param_len: 6,
                param_value: ParamVal::Capabilities(vec![Capability::Multiprotocol(
                    AfiSafi::ipv4_unicast()
                )]),
            }]
        );
        assert!(open_message
            .capabilities()
            .supports_afi_safi(&AfiSafi::ipv4_unicast()));
    }

    #[test]
    fn test_from_bytes_with_unknown_optional_param() {
        let message: Vec<u8> = [
            &[
                0x04, // Version
                0x04, 0xd2, // ASN
                0x00, 0x0a, // Hold time
                0x0a, 0x0a, 0x0a, 0x0a, // BGP identifier
                9,    // Optional parameters length
            ],
            UNKNOWN_TYPE_PARAM,
        ]
        .concat();

        let open_message = OpenMessage::from_bytes(message).unwrap();
        assert_eq!(
            open_message.optional_params,
            vec![OptionalParam {
                param_type: OptionalParamType::Unknown(200),
                param_len: 7,
                param_value: ParamVal::Unknown(vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]),
            }]
        );
    }

    #[test]
    fn test_from_bytes_invalid_length() {
        let message: &[u8] = &[
            0x04, 0x04, 0xd2, // ASN
            0x00, 0x0a, // Hold time
        ];

        match OpenMessage::from_bytes(message.to_vec()) {
            Err(ParserError::BgpError { error, data }) => {
                assert_eq!(
                    error,
                    BgpError::OpenMessageError(OpenMessageError::Unknown(0))
                );
                assert_eq!(data, Vec::<u8>::new());
            }
            _ => panic!("Expected OPEN message error"),
        }
    }

    #[test]
    fn test_from_bytes_invalid_optional_params_length() {
        let test_cases: Vec<Vec<u8>> = vec![
            vec![
                0x04, // Version
                0x04, 0xd2, // ASN
                0x00, 0x0a, // Hold time
                0x0a, 0x0a, 0x0a, 0x0a, // BGP identifier
                0x08, // Optional parameters length, but no parameters follow
            ],
            vec![
                0x04, // Version
                0x04, 0xd2, // ASN
                0x00, 0x0a, // Hold time
                0x0a, 0x0a, 0x0a, 0x0a, // BGP identifier
                0x02, // Optional parameters length shorter than the payload
                100, 0x02, 0x01, 0x02,
            ],
        ];

        for test_case in test_cases {
            match OpenMessage::from_bytes(test_case) {
                Err(ParserError::BgpError { error, .. }) => {
                    assert_eq!(
                        error,
                        BgpError::OpenMessageError(OpenMessageError::Unknown(0))
                    );
                }
                _ => panic!("Expected OPEN message error"),
            }
        }
    }

    #[test]
    fn test_open_message_encode_decode() {
        let open_msg = OpenMessage::new(65001, 180, 0x01010101);

        let bytes = open_msg.to_bytes(&PRE_OPEN_FORMAT);
        assert_eq!(bytes, TEST_OPEN_MESSAGE_BODY);

        let parsed = OpenMessage::from_bytes(bytes).unwrap();
        assert_eq!(parsed, open_msg);
    }

    #[test]
    fn test_open_with_capabilities_round_trip() {
        let open_msg = OpenMessage::with_capabilities(
            65000,
            90,
            u32::from(std::net::Ipv4Addr::new(172, 16, 1, 3)),
            vec![
                Capability::Multiprotocol(AfiSafi::ipv4_unicast()),
                Capability::FourOctetAsn(65000),
            ],
        );

        let parsed = OpenMessage::from_bytes(open_msg.to_bytes(&PRE_OPEN_FORMAT)).unwrap();
        assert_eq!(parsed, open_msg);
        assert_eq!(parsed.peer_asn(), 65000);
        assert_eq!(parsed.hold_time, 90);
    }

    #[test]
    fn test_open_four_octet_asn_uses_as_trans() {
        // 196608 does not fit in 16 bits
        let open_msg = OpenMessage::with_capabilities(
            196608,
            90,
            0x01010101,
            vec![Capability::FourOctetAsn(196608)],
        );
        assert_eq!(open_msg.asn, AS_TRANS);

        let parsed = OpenMessage::from_bytes(open_msg.to_bytes(&PRE_OPEN_FORMAT)).unwrap();
        assert_eq!(parsed.peer_asn(), 196608);
    }

    #[test]
    fn test_from_bytes_unsupported_version() {
        let mut msg = TEST_OPEN_MESSAGE_BODY.to_vec();
        msg[0] = 0x03; // Version 3 (unsupported)

        match OpenMessage::from_bytes(msg) {
            Err(ParserError::BgpError { error, data }) => {
                assert_eq!(
                    error,
                    BgpError::OpenMessageError(OpenMessageError::UnsupportedVersionNumber)
                );
                assert_eq!(data, vec![0x00, 0x04]); // Largest supported version
            }
            _ => panic!("Expected UnsupportedVersionNumber error"),
        }
    }

    #[test]
    fn test_from_bytes_unacceptable_hold_time() {
        for hold_time in [1u8, 2u8] {
            let mut msg = TEST_OPEN_MESSAGE_BODY.to_vec();
            msg[3] = 0x00;
            msg[4] = hold_time;

            match OpenMessage::from_bytes(msg) {
                Err(ParserError::BgpError { error, data }) => {
                    assert_eq!(
                        error,
                        BgpError::OpenMessageError(OpenMessageError::UnacceptedHoldTime),
                        "Failed for hold_time={}",
                        hold_time
                    );
                    assert_eq!(data, Vec::<u8>::new());
                }
                _ => panic!(
                    "Expected UnacceptedHoldTime error for hold_time={}",
                    hold_time
                ),
            }
        }
    }

    #[test]
    fn test_from_bytes_bad_bgp_identifier() {
        let test_cases = vec![
            ("zero", [0x00, 0x00, 0x00, 0x00]),      // 0.0.0.0
            ("broadcast", [0xff, 0xff, 0xff, 0xff]), // 255.255.255.255
            ("multicast", [0xe0, 0x00, 0x00, 0x01]), // 224.0.0.1
        ];

        for (name, bgp_id) in test_cases {
            let mut msg = TEST_OPEN_MESSAGE_BODY.to_vec();
            msg[5..9].copy_from_slice(&bgp_id);

            match OpenMessage::from_bytes(msg) {
                Err(ParserError::BgpError { error, .. }) => {
                    assert_eq!(
                        error,
                        BgpError::OpenMessageError(OpenMessageError::BadBgpIdentifier),
                        "Failed for case: {}",
                        name
                    );
                }
                _ => panic!("Expected BadBgpIdentifier error for case: {}", name),
            }
        }
    }
}
