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

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Decode fault. The `BgpError` variant carries the exact NOTIFICATION
/// code/subcode/data the peer must receive for this fault.
#[derive(Debug, PartialEq)]
pub enum ParserError {
    IoError(String),
    BgpError {
        error: super::msg_notification::BgpError,
        data: Vec<u8>,
    },
}

impl Display for ParserError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ParserError::IoError(s) => write!(f, "IO error: {}", s),
            ParserError::BgpError { error, .. } => write!(f, "BGP error: {:?}", error),
        }
    }
}

impl Error for ParserError {}

impl From<std::io::Error> for ParserError {
    fn from(e: std::io::Error) -> Self {
        ParserError::IoError(e.to_string())
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum IpNetwork {
    V4(Ipv4Net),
    V6(Ipv6Net),
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Ipv4Net {
    pub address: Ipv4Addr,
    pub prefix_length: u8,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Ipv6Net {
    pub address: Ipv6Addr,
    pub prefix_length: u8,
}

impl Display for IpNetwork {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            IpNetwork::V4(net) => write!(f, "{}/{}", net.address, net.prefix_length),
            IpNetwork::V6(net) => write!(f, "{}/{}", net.address, net.prefix_length),
        }
    }
}

impl IpNetwork {
    pub fn v4(address: Ipv4Addr, prefix_length: u8) -> Self {
        IpNetwork::V4(Ipv4Net {
            address,
            prefix_length,
        })
    }
}

fn invalid_network_field() -> ParserError {
    ParserError::BgpError {
        error: super::msg_notification::BgpError::UpdateMessageError(
            super::msg_notification::UpdateMessageError::InvalidNetworkField,
        ),
        data: Vec::new(),
    }
}

/// Parse a run of length-prefixed IPv4 prefixes (RFC 4271 Section 4.3).
/// Prefix lengths over 32 or truncated prefix bytes fail with
/// Invalid Network Field.
pub fn parse_nlri_list(bytes: &[u8]) -> Result<Vec<IpNetwork>, ParserError> {
    let mut cursor = 0;
    let mut nlri_list: Vec<IpNetwork> = Vec::new();

    while cursor < bytes.len() {
        let prefix_length = bytes[cursor];
        cursor += 1;

        if prefix_length > 32 {
            return Err(invalid_network_field());
        }

        let byte_len = (prefix_length as usize + 7) / 8;
        if cursor + byte_len > bytes.len() {
            return Err(invalid_network_field());
        }

        let mut ip_buffer = [0u8; 4];
        ip_buffer[..byte_len].copy_from_slice(&bytes[cursor..cursor + byte_len]);
        cursor += byte_len;

        nlri_list.push(IpNetwork::V4(Ipv4Net {
            address: Ipv4Addr::from(ip_buffer),
            prefix_length,
        }));
    }

    Ok(nlri_list)
}

/// Parse a run of length-prefixed IPv6 prefixes (multiprotocol NLRI).
pub fn parse_nlri_list_v6(bytes: &[u8]) -> Result<Vec<IpNetwork>, ParserError> {
    let mut cursor = 0;
    let mut nlri_list: Vec<IpNetwork> = Vec::new();

    while cursor < bytes.len() {
        let prefix_length = bytes[cursor];
        cursor += 1;

        if prefix_length > 128 {
            return Err(invalid_network_field());
        }

        let byte_len = (prefix_length as usize + 7) / 8;
        if cursor + byte_len > bytes.len() {
            return Err(invalid_network_field());
        }

        let mut ip_buffer = [0u8; 16];
        ip_buffer[..byte_len].copy_from_slice(&bytes[cursor..cursor + byte_len]);
        cursor += byte_len;

        nlri_list.push(IpNetwork::V6(Ipv6Net {
            address: Ipv6Addr::from(ip_buffer),
            prefix_length,
        }));
    }

    Ok(nlri_list)
}

/// Write prefixes in wire form: prefix length octet, then the minimum
/// number of address octets covering it.
pub fn write_nlri_list(nlri_list: &[IpNetwork]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for network in nlri_list {
        match network {
            IpNetwork::V4(net) => {
                bytes.push(net.prefix_length);
                let octets = net.address.octets();
                let num_octets = (net.prefix_length as usize + 7) / 8;
                bytes.extend_from_slice(&octets[..num_octets]);
            }
            IpNetwork::V6(net) => {
                bytes.push(net.prefix_length);
                let octets = net.address.octets();
                let num_octets = (net.prefix_length as usize + 7) / 8;
                bytes.extend_from_slice(&octets[..num_octets]);
            }
        }
    }
    bytes
}

pub fn read_u32(bytes: &[u8]) -> Result<u32, ParserError> {
    match bytes.len() {
        4 => Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        _ => Err(ParserError::BgpError {
            error: super::msg_notification::BgpError::UpdateMessageError(
                super::msg_notification::UpdateMessageError::AttributeLengthError,
            ),
            data: Vec::new(),
        }),
    }
}

/// Validates if an IPv4 address is a valid unicast host address.
/// Returns false for 0.0.0.0, 255.255.255.255, or multicast (224.0.0.0/4).
pub fn is_valid_unicast_ipv4(ip: u32) -> bool {
    !(ip == 0 || ip == 0xFFFFFFFF || (ip & 0xF0000000) == 0xE0000000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nlri_list_single() {
        let data: Vec<u8> = vec![0x18, 0x0a, 0x0b, 0x0c]; // /24 prefix: 1 byte length + 3 bytes IP

        let result = parse_nlri_list(&data).unwrap();
        let expected = vec![IpNetwork::v4(Ipv4Addr::new(10, 11, 12, 0), 24)];
        assert_eq!(result, expected);
    }

    #[test]
    fn test_parse_nlri_list_multiple() {
        let data: Vec<u8> = vec![
            0x18, 0x0a, 0x0b, 0x0c, // /24 prefix: 1 byte length + 3 bytes IP
            0x15, 0x0a, 0x0b, 0x08, // /21 prefix: 1 byte length + 3 bytes IP
        ];

        let result = parse_nlri_list(&data).unwrap();
        let expected = vec![
            IpNetwork::v4(Ipv4Addr::new(10, 11, 12, 0), 24),
            IpNetwork::v4(Ipv4Addr::new(10, 11, 8, 0), 21),
        ];
        assert_eq!(result, expected);
    }

    #[test]
    fn test_parse_nlri_list_bad_prefix_length() {
        // /33 is not a valid IPv4 prefix length
        let data: Vec<u8> = vec![33, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e];
        assert!(parse_nlri_list(&data).is_err());
    }

    #[test]
    fn test_parse_nlri_list_truncated() {
        // /24 needs 3 address bytes, only 2 present
        let data: Vec<u8> = vec![0x18, 0x0a, 0x0b];
        assert!(parse_nlri_list(&data).is_err());
    }

    #[test]
    fn test_nlri_round_trip() {
        let prefixes = vec![
            IpNetwork::v4(Ipv4Addr::new(10, 0, 0, 0), 8),
            IpNetwork::v4(Ipv4Addr::new(192, 168, 12, 0), 22),
            IpNetwork::v4(Ipv4Addr::new(172, 16, 1, 4), 32),
            IpNetwork::v4(Ipv4Addr::new(0, 0, 0, 0), 0),
        ];
        let bytes = write_nlri_list(&prefixes);
        assert_eq!(parse_nlri_list(&bytes).unwrap(), prefixes);
    }

    #[test]
    fn test_is_valid_unicast_ipv4() {
        let test_cases = vec![
            (u32::from(Ipv4Addr::new(10, 0, 0, 1)), true, "10.0.0.1"),
            (
                u32::from(Ipv4Addr::new(192, 168, 1, 1)),
                true,
                "192.168.1.1",
            ),
            (u32::from(Ipv4Addr::new(1, 1, 1, 1)), true, "1.1.1.1"),
            (
                u32::from(Ipv4Addr::new(223, 255, 255, 255)),
                true,
                "223.255.255.255",
            ),
            (0x00000000, false, "0.0.0.0"),
            (0xFFFFFFFF, false, "255.255.255.255"),
            (0xE0000001, false, "224.0.0.1 (multicast)"),
            (0xEFFFFFFF, false, "239.255.255.255 (multicast)"),
        ];

        for (ip, expected, name) in test_cases {
            assert_eq!(is_valid_unicast_ipv4(ip), expected, "Failed for {}", name);
        }
    }
}
