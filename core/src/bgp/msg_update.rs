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
use super::msg_notification::{BgpError, UpdateMessageError};
use super::multiprotocol::{Afi, Safi};
use super::utils::{
    parse_nlri_list, parse_nlri_list_v6, read_u32, write_nlri_list, IpNetwork, ParserError,
};
use std::net::Ipv4Addr;

const WITHDRAWN_ROUTES_LENGTH_SIZE: usize = 2;
const TOTAL_ATTR_LENGTH_SIZE: usize = 2;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PathAttrFlag(pub u8);

impl PathAttrFlag {
    pub const OPTIONAL: u8 = 1 << 7;
    pub const TRANSITIVE: u8 = 1 << 6;
    pub const PARTIAL: u8 = 1 << 5;
    pub const EXTENDED_LENGTH: u8 = 1 << 4;

    fn extended_len(&self) -> bool {
        self.0 & Self::EXTENDED_LENGTH != 0
    }

    fn optional(&self) -> bool {
        self.0 & Self::OPTIONAL != 0
    }
}

pub mod attr_type_code {
    pub const ORIGIN: u8 = 1;
    pub const AS_PATH: u8 = 2;
    pub const NEXT_HOP: u8 = 3;
    pub const MULTI_EXIT_DISC: u8 = 4;
    pub const LOCAL_PREF: u8 = 5;
    pub const ATOMIC_AGGREGATE: u8 = 6;
    pub const AGGREGATOR: u8 = 7;
    pub const COMMUNITIES: u8 = 8;
    pub const MP_REACH_NLRI: u8 = 14;
    pub const MP_UNREACH_NLRI: u8 = 15;
}

#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum AttrType {
    Origin = 1,
    AsPath = 2,
    NextHop = 3,
    MultiExitDisc = 4,
    LocalPref = 5,
    AtomicAggregate = 6,
    Aggregator = 7,
    Communities = 8,
    MpReachNlri = 14,
    MpUnreachNlri = 15,
}

impl AttrType {
    fn from_code(value: u8) -> Option<Self> {
        match value {
            1 => Some(AttrType::Origin),
            2 => Some(AttrType::AsPath),
            3 => Some(AttrType::NextHop),
            4 => Some(AttrType::MultiExitDisc),
            5 => Some(AttrType::LocalPref),
            6 => Some(AttrType::AtomicAggregate),
            7 => Some(AttrType::Aggregator),
            8 => Some(AttrType::Communities),
            14 => Some(AttrType::MpReachNlri),
            15 => Some(AttrType::MpUnreachNlri),
            _ => None,
        }
    }

    /// Expected Optional/Transitive bits (RFC 4271 Section 5, RFC 1997,
    /// RFC 4760).
    fn expected_flags(&self) -> u8 {
        match self {
            AttrType::Origin => PathAttrFlag::TRANSITIVE,
            AttrType::AsPath => PathAttrFlag::TRANSITIVE,
            AttrType::NextHop => PathAttrFlag::TRANSITIVE,
            AttrType::MultiExitDisc => PathAttrFlag::OPTIONAL,
            AttrType::LocalPref => PathAttrFlag::TRANSITIVE,
            AttrType::AtomicAggregate => PathAttrFlag::TRANSITIVE,
            AttrType::Aggregator => PathAttrFlag::OPTIONAL | PathAttrFlag::TRANSITIVE,
            AttrType::Communities => PathAttrFlag::OPTIONAL | PathAttrFlag::TRANSITIVE,
            AttrType::MpReachNlri => PathAttrFlag::OPTIONAL,
            AttrType::MpUnreachNlri => PathAttrFlag::OPTIONAL,
        }
    }
}

fn validate_attribute_flags(
    flags: u8,
    attr_type: AttrType,
    attr_bytes: &[u8],
) -> Result<(), ParserError> {
    let expected = attr_type.expected_flags();
    let mask = PathAttrFlag::OPTIONAL | PathAttrFlag::TRANSITIVE;

    if (flags & mask) != expected {
        // RFC 4271 6.3: data is the erroneous attribute
        return Err(ParserError::BgpError {
            error: BgpError::UpdateMessageError(UpdateMessageError::AttributeFlagsError),
            data: attr_bytes.to_vec(),
        });
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Origin {
    IGP = 0,
    EGP = 1,
    INCOMPLETE = 2,
}

impl TryFrom<u8> for Origin {
    type Error = ParserError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Origin::IGP),
            1 => Ok(Origin::EGP),
            2 => Ok(Origin::INCOMPLETE),
            _ => Err(ParserError::BgpError {
                error: BgpError::UpdateMessageError(UpdateMessageError::InvalidOriginAttribute),
                data: Vec::new(),
            }),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AsPathSegmentType {
    AsSet = 1,
    AsSequence = 2,
}

impl TryFrom<u8> for AsPathSegmentType {
    type Error = ParserError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AsPathSegmentType::AsSet),
            2 => Ok(AsPathSegmentType::AsSequence),
            _ => Err(ParserError::BgpError {
                error: BgpError::UpdateMessageError(UpdateMessageError::MalformedASPath),
                data: Vec::new(),
            }),
        }
    }
}

/// AS_PATH segment. ASNs are held as 32-bit values; the wire width (2 or
/// 4 octets) follows the negotiated four-octet-ASN capability.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct AsPathSegment {
    pub segment_type: AsPathSegmentType,
    pub asn_list: Vec<u32>,
}

impl AsPathSegment {
    pub fn sequence(asn_list: Vec<u32>) -> Self {
        AsPathSegment {
            segment_type: AsPathSegmentType::AsSequence,
            asn_list,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Aggregator {
    pub asn: u32,
    pub addr: Ipv4Addr,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MpReachNlri {
    pub afi: Afi,
    pub safi: Safi,
    pub next_hop: Vec<u8>,
    pub nlri: Vec<IpNetwork>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MpUnreachNlri {
    pub afi: Afi,
    pub safi: Safi,
    pub withdrawn: Vec<IpNetwork>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PathAttrValue {
    Origin(Origin),
    AsPath(Vec<AsPathSegment>),
    NextHop(Ipv4Addr),
    MultiExitDisc(u32),
    LocalPref(u32),
    AtomicAggregate,
    Aggregator(Aggregator),
    Communities(Vec<u32>),
    MpReachNlri(MpReachNlri),
    MpUnreachNlri(MpUnreachNlri),
}

impl PathAttrValue {
    fn attr_type(&self) -> AttrType {
        match self {
            PathAttrValue::Origin(_) => AttrType::Origin,
            PathAttrValue::AsPath(_) => AttrType::AsPath,
            PathAttrValue::NextHop(_) => AttrType::NextHop,
            PathAttrValue::MultiExitDisc(_) => AttrType::MultiExitDisc,
            PathAttrValue::LocalPref(_) => AttrType::LocalPref,
            PathAttrValue::AtomicAggregate => AttrType::AtomicAggregate,
            PathAttrValue::Aggregator(_) => AttrType::Aggregator,
            PathAttrValue::Communities(_) => AttrType::Communities,
            PathAttrValue::MpReachNlri(_) => AttrType::MpReachNlri,
            PathAttrValue::MpUnreachNlri(_) => AttrType::MpUnreachNlri,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PathAttribute {
    pub flags: PathAttrFlag,
    pub value: PathAttrValue,
}

impl PathAttribute {
    /// Attribute with the canonical flags for its type.
    pub fn new(value: PathAttrValue) -> Self {
        let flags = PathAttrFlag(value.attr_type().expected_flags());
        PathAttribute { flags, value }
    }
}

fn malformed_attr_list() -> ParserError {
    ParserError::BgpError {
        error: BgpError::UpdateMessageError(UpdateMessageError::MalformedAttributeList),
        data: Vec::new(),
    }
}

fn attr_length_error(data: Vec<u8>) -> ParserError {
    ParserError::BgpError {
        error: BgpError::UpdateMessageError(UpdateMessageError::AttributeLengthError),
        data,
    }
}

fn read_attr_as_path(bytes: &[u8], format: &MessageFormat) -> Result<Vec<AsPathSegment>, ParserError> {
    let asn_width = if format.four_octet_asn { 4 } else { 2 };
    let mut segments = vec![];
    let mut cursor = 0;

    while cursor < bytes.len() {
        if cursor + 2 > bytes.len() {
            return Err(ParserError::BgpError {
                error: BgpError::UpdateMessageError(UpdateMessageError::MalformedASPath),
                data: Vec::new(),
            });
        }
        let segment_type = AsPathSegmentType::try_from(bytes[cursor])?;
        let segment_len = bytes[cursor + 1] as usize;
        let segment_size = 2 + segment_len * asn_width;

        if cursor + segment_size > bytes.len() {
            return Err(ParserError::BgpError {
                error: BgpError::UpdateMessageError(UpdateMessageError::MalformedASPath),
                data: Vec::new(),
            });
        }

        let asn_list = (0..segment_len)
            .map(|i| {
                let pos = cursor + 2 + i * asn_width;
                if asn_width == 4 {
                    u32::from_be_bytes([
                        bytes[pos],
                        bytes[pos + 1],
                        bytes[pos + 2],
                        bytes[pos + 3],
                    ])
                } else {
                    u16::from_be_bytes([bytes[pos], bytes[pos + 1]]) as u32
                }
            })
            .collect();

        segments.push(AsPathSegment {
            segment_type,
            asn_list,
        });

        cursor += segment_size;
    }

    Ok(segments)
}

fn read_attr_next_hop(bytes: &[u8]) -> Result<Ipv4Addr, ParserError> {
    if bytes.len() != 4 {
        return Err(attr_length_error(bytes.to_vec()));
    }

    let ip = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
    // Syntactic validity per RFC 4271 6.3
    if !super::utils::is_valid_unicast_ipv4(u32::from(ip)) {
        return Err(ParserError::BgpError {
            error: BgpError::UpdateMessageError(UpdateMessageError::InvalidNextHopAttribute),
            data: bytes.to_vec(),
        });
    }
    Ok(ip)
}

fn read_attr_aggregator(bytes: &[u8], format: &MessageFormat) -> Result<Aggregator, ParserError> {
    // AGGREGATOR widens from 6 to 8 bytes with four-octet ASNs (RFC 6793)
    let expected = if format.four_octet_asn { 8 } else { 6 };
    if bytes.len() != expected {
        return Err(attr_length_error(bytes.to_vec()));
    }

    let (asn, rest) = if format.four_octet_asn {
        (
            u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            &bytes[4..],
        )
    } else {
        (u16::from_be_bytes([bytes[0], bytes[1]]) as u32, &bytes[2..])
    };
    let addr = Ipv4Addr::new(rest[0], rest[1], rest[2], rest[3]);

    Ok(Aggregator { asn, addr })
}

fn read_attr_communities(bytes: &[u8]) -> Result<Vec<u32>, ParserError> {
    if bytes.len() % 4 != 0 {
        return Err(attr_length_error(bytes.to_vec()));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn parse_family_prefixes(afi: Afi, bytes: &[u8]) -> Result<Vec<IpNetwork>, ParserError> {
    match afi {
        Afi::Ipv4 => parse_nlri_list(bytes),
        Afi::Ipv6 => parse_nlri_list_v6(bytes),
    }
}

fn read_attr_mp_reach(bytes: &[u8]) -> Result<MpReachNlri, ParserError> {
    if bytes.len() < 5 {
        return Err(attr_length_error(bytes.to_vec()));
    }
    let afi = Afi::try_from(u16::from_be_bytes([bytes[0], bytes[1]]))?;
    let safi = Safi::try_from(bytes[2])?;
    let nh_len = bytes[3] as usize;
    if 4 + nh_len + 1 > bytes.len() {
        return Err(attr_length_error(bytes.to_vec()));
    }
    let next_hop = bytes[4..4 + nh_len].to_vec();
    // one reserved octet after the next hop
    let nlri = parse_family_prefixes(afi, &bytes[4 + nh_len + 1..])?;

    Ok(MpReachNlri {
        afi,
        safi,
        next_hop,
        nlri,
    })
}

fn read_attr_mp_unreach(bytes: &[u8]) -> Result<MpUnreachNlri, ParserError> {
    if bytes.len() < 3 {
        return Err(attr_length_error(bytes.to_vec()));
    }
    let afi = Afi::try_from(u16::from_be_bytes([bytes[0], bytes[1]]))?;
    let safi = Safi::try_from(bytes[2])?;
    let withdrawn = parse_family_prefixes(afi, &bytes[3..])?;

    Ok(MpUnreachNlri {
        afi,
        safi,
        withdrawn,
    })
}

fn validate_attribute_length(
    attr_type: AttrType,
    attr_len: u16,
    attr_bytes: &[u8],
    format: &MessageFormat,
) -> Result<(), ParserError> {
    let valid = match attr_type {
        AttrType::Origin => attr_len == 1,
        AttrType::NextHop => attr_len == 4,
        AttrType::MultiExitDisc => attr_len == 4,
        AttrType::LocalPref => attr_len == 4,
        AttrType::AtomicAggregate => attr_len == 0,
        AttrType::Aggregator => attr_len == if format.four_octet_asn { 8 } else { 6 },
        AttrType::Communities => attr_len % 4 == 0,
        // Variable length
        AttrType::AsPath | AttrType::MpReachNlri | AttrType::MpUnreachNlri => true,
    };

    if !valid {
        return Err(attr_length_error(attr_bytes.to_vec()));
    }

    Ok(())
}

/// Read one path attribute. Returns the attribute (None for skipped
/// unrecognized optional attributes) and the number of bytes consumed.
fn read_path_attribute(
    bytes: &[u8],
    format: &MessageFormat,
) -> Result<(Option<PathAttribute>, usize), ParserError> {
    if bytes.len() < 3 {
        return Err(malformed_attr_list());
    }

    let attribute_flag = PathAttrFlag(bytes[0]);
    let type_code = bytes[1];

    let header_size = if attribute_flag.extended_len() { 4 } else { 3 };
    if bytes.len() < header_size {
        return Err(malformed_attr_list());
    }

    let attr_len = if attribute_flag.extended_len() {
        u16::from_be_bytes([bytes[2], bytes[3]])
    } else {
        bytes[2] as u16
    };

    let attr_total_len = header_size + attr_len as usize;
    if attr_total_len > bytes.len() {
        return Err(malformed_attr_list());
    }
    let attr_bytes = &bytes[..attr_total_len];
    let attr_data = &bytes[header_size..attr_total_len];

    let Some(attr_type) = AttrType::from_code(type_code) else {
        if attribute_flag.optional() {
            // Unrecognized optional attribute: skip (RFC 4271 9)
            return Ok((None, attr_total_len));
        }
        return Err(ParserError::BgpError {
            error: BgpError::UpdateMessageError(
                UpdateMessageError::UnrecognizedWellKnownAttribute,
            ),
            data: attr_bytes.to_vec(),
        });
    };

    validate_attribute_flags(bytes[0], attr_type, attr_bytes)?;
    validate_attribute_length(attr_type, attr_len, attr_bytes, format)?;

    let attr_val = match attr_type {
        AttrType::Origin => PathAttrValue::Origin(Origin::try_from(attr_data[0])?),
        AttrType::AsPath => PathAttrValue::AsPath(read_attr_as_path(attr_data, format)?),
        AttrType::NextHop => PathAttrValue::NextHop(read_attr_next_hop(attr_data)?),
        AttrType::MultiExitDisc => PathAttrValue::MultiExitDisc(read_u32(attr_data)?),
        AttrType::LocalPref => PathAttrValue::LocalPref(read_u32(attr_data)?),
        AttrType::AtomicAggregate => PathAttrValue::AtomicAggregate,
        AttrType::Aggregator => {
            PathAttrValue::Aggregator(read_attr_aggregator(attr_data, format)?)
        }
        AttrType::Communities => PathAttrValue::Communities(read_attr_communities(attr_data)?),
        AttrType::MpReachNlri => PathAttrValue::MpReachNlri(read_attr_mp_reach(attr_data)?),
        AttrType::MpUnreachNlri => PathAttrValue::MpUnreachNlri(read_attr_mp_unreach(attr_data)?),
    };

    let attribute = PathAttribute {
        flags: attribute_flag,
        value: attr_val,
    };

    Ok((Some(attribute), attr_total_len))
}

fn read_path_attributes(
    bytes: &[u8],
    format: &MessageFormat,
) -> Result<Vec<PathAttribute>, ParserError> {
    let mut cursor = 0;
    let mut path_attributes: Vec<PathAttribute> = Vec::new();

    while cursor < bytes.len() {
        let (attribute, consumed) = read_path_attribute(&bytes[cursor..], format)?;
        cursor += consumed;
        if let Some(attribute) = attribute {
            path_attributes.push(attribute);
        }
    }

    Ok(path_attributes)
}

fn write_path_attribute(attr: &PathAttribute, format: &MessageFormat) -> Vec<u8> {
    let asn_width = if format.four_octet_asn { 4 } else { 2 };

    let attr_value_bytes = match &attr.value {
        PathAttrValue::Origin(origin) => vec![*origin as u8],
        PathAttrValue::AsPath(segments) => {
            let mut path_bytes = Vec::new();
            for segment in segments {
                path_bytes.push(segment.segment_type as u8);
                path_bytes.push(segment.asn_list.len() as u8);
                for asn in &segment.asn_list {
                    if asn_width == 4 {
                        path_bytes.extend_from_slice(&asn.to_be_bytes());
                    } else {
                        path_bytes.extend_from_slice(&(*asn as u16).to_be_bytes());
                    }
                }
            }
            path_bytes
        }
        PathAttrValue::NextHop(addr) => addr.octets().to_vec(),
        PathAttrValue::MultiExitDisc(value) => value.to_be_bytes().to_vec(),
        PathAttrValue::LocalPref(value) => value.to_be_bytes().to_vec(),
        PathAttrValue::AtomicAggregate => vec![],
        PathAttrValue::Aggregator(agg) => {
            let mut agg_bytes = Vec::new();
            if asn_width == 4 {
                agg_bytes.extend_from_slice(&agg.asn.to_be_bytes());
            } else {
                agg_bytes.extend_from_slice(&(agg.asn as u16).to_be_bytes());
            }
            agg_bytes.extend_from_slice(&agg.addr.octets());
            agg_bytes
        }
        PathAttrValue::Communities(communities) => {
            let mut bytes = Vec::with_capacity(communities.len() * 4);
            for community in communities {
                bytes.extend_from_slice(&community.to_be_bytes());
            }
            bytes
        }
        PathAttrValue::MpReachNlri(mp) => {
            let mut bytes = Vec::new();
            bytes.extend_from_slice(&(mp.afi as u16).to_be_bytes());
            bytes.push(mp.safi as u8);
            bytes.push(mp.next_hop.len() as u8);
            bytes.extend_from_slice(&mp.next_hop);
            bytes.push(0); // Reserved
            bytes.extend_from_slice(&write_nlri_list(&mp.nlri));
            bytes
        }
        PathAttrValue::MpUnreachNlri(mp) => {
            let mut bytes = Vec::new();
            bytes.extend_from_slice(&(mp.afi as u16).to_be_bytes());
            bytes.push(mp.safi as u8);
            bytes.extend_from_slice(&write_nlri_list(&mp.withdrawn));
            bytes
        }
    };

    let attr_len = attr_value_bytes.len();
    let mut flags = attr.flags.0;
    if attr_len > u8::MAX as usize {
        flags |= PathAttrFlag::EXTENDED_LENGTH;
    }

    let mut bytes = Vec::with_capacity(4 + attr_len);
    bytes.push(flags);
    bytes.push(attr.value.attr_type() as u8);
    if flags & PathAttrFlag::EXTENDED_LENGTH != 0 {
        bytes.extend_from_slice(&(attr_len as u16).to_be_bytes());
    } else {
        bytes.push(attr_len as u8);
    }
    bytes.extend_from_slice(&attr_value_bytes);

    bytes
}

fn validate_update_message_lengths(
    withdrawn_routes_len: usize,
    total_path_attributes_len: usize,
    body_length: usize,
) -> Result<(), ParserError> {
    // RFC 4271 Section 6.3: if Withdrawn Routes Length + Total Attribute
    // Length + 23 exceeds the message Length, the error subcode MUST be
    // Malformed Attribute List. Working on the body (length - 19), the
    // check becomes the two length fields (4 bytes) plus the claimed runs.
    let length_fields_size = WITHDRAWN_ROUTES_LENGTH_SIZE + TOTAL_ATTR_LENGTH_SIZE;
    let claimed_size = withdrawn_routes_len + total_path_attributes_len + length_fields_size;

    if claimed_size > body_length {
        return Err(malformed_attr_list());
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct UpdateMessage {
    withdrawn_routes: Vec<IpNetwork>,
    path_attributes: Vec<PathAttribute>,
    nlri_list: Vec<IpNetwork>,
}

impl UpdateMessage {
    pub fn new(
        withdrawn_routes: Vec<IpNetwork>,
        path_attributes: Vec<PathAttribute>,
        nlri_list: Vec<IpNetwork>,
    ) -> Self {
        UpdateMessage {
            withdrawn_routes,
            path_attributes,
            nlri_list,
        }
    }

    /// Announcement carrying the three mandatory well-known attributes.
    pub fn new_announcement(
        origin: Origin,
        as_path: Vec<AsPathSegment>,
        next_hop: Ipv4Addr,
        nlri_list: Vec<IpNetwork>,
    ) -> Self {
        UpdateMessage {
            withdrawn_routes: vec![],
            path_attributes: vec![
                PathAttribute::new(PathAttrValue::Origin(origin)),
                PathAttribute::new(PathAttrValue::AsPath(as_path)),
                PathAttribute::new(PathAttrValue::NextHop(next_hop)),
            ],
            nlri_list,
        }
    }

    pub fn new_withdraw(withdrawn_routes: Vec<IpNetwork>) -> Self {
        UpdateMessage {
            withdrawn_routes,
            path_attributes: vec![],
            nlri_list: vec![],
        }
    }

    pub fn nlri_list(&self) -> &[IpNetwork] {
        &self.nlri_list
    }

    pub fn withdrawn_routes(&self) -> &[IpNetwork] {
        &self.withdrawn_routes
    }

    pub fn path_attributes(&self) -> &[PathAttribute] {
        &self.path_attributes
    }

    pub fn origin(&self) -> Option<Origin> {
        self.path_attributes.iter().find_map(|attr| match &attr.value {
            PathAttrValue::Origin(origin) => Some(*origin),
            _ => None,
        })
    }

    pub fn as_path(&self) -> Option<&[AsPathSegment]> {
        self.path_attributes.iter().find_map(|attr| match &attr.value {
            PathAttrValue::AsPath(segments) => Some(segments.as_slice()),
            _ => None,
        })
    }

    pub fn next_hop(&self) -> Option<Ipv4Addr> {
        self.path_attributes.iter().find_map(|attr| match &attr.value {
            PathAttrValue::NextHop(addr) => Some(*addr),
            _ => None,
        })
    }

    pub fn med(&self) -> Option<u32> {
        self.path_attributes.iter().find_map(|attr| match &attr.value {
            PathAttrValue::MultiExitDisc(value) => Some(*value),
            _ => None,
        })
    }

    pub fn local_pref(&self) -> Option<u32> {
        self.path_attributes.iter().find_map(|attr| match &attr.value {
            PathAttrValue::LocalPref(value) => Some(*value),
            _ => None,
        })
    }

    pub fn atomic_aggregate(&self) -> bool {
        self.path_attributes
            .iter()
            .any(|attr| attr.value == PathAttrValue::AtomicAggregate)
    }

    pub fn aggregator(&self) -> Option<&Aggregator> {
        self.path_attributes.iter().find_map(|attr| match &attr.value {
            PathAttrValue::Aggregator(agg) => Some(agg),
            _ => None,
        })
    }

    pub fn communities(&self) -> Option<&[u32]> {
        self.path_attributes.iter().find_map(|attr| match &attr.value {
            PathAttrValue::Communities(list) => Some(list.as_slice()),
            _ => None,
        })
    }

    fn has_attr(&self, type_code: u8) -> bool {
        self.path_attributes
            .iter()
            .any(|attr| attr.value.attr_type() as u8 == type_code)
    }

    /// RFC 4271 6.3: ORIGIN, AS_PATH and NEXT_HOP are mandatory when the
    /// message announces IPv4 unicast NLRI. The offending type code goes
    /// into the NOTIFICATION data.
    fn validate_mandatory_attributes(&self) -> Result<(), ParserError> {
        if self.nlri_list.is_empty() {
            return Ok(());
        }
        for type_code in [
            attr_type_code::ORIGIN,
            attr_type_code::AS_PATH,
            attr_type_code::NEXT_HOP,
        ] {
            if !self.has_attr(type_code) {
                return Err(ParserError::BgpError {
                    error: BgpError::UpdateMessageError(
                        UpdateMessageError::MissingWellKnownAttribute,
                    ),
                    data: vec![type_code],
                });
            }
        }
        Ok(())
    }

    pub fn from_bytes(bytes: Vec<u8>, format: &MessageFormat) -> Result<Self, ParserError> {
        if bytes.len() < WITHDRAWN_ROUTES_LENGTH_SIZE + TOTAL_ATTR_LENGTH_SIZE {
            return Err(malformed_attr_list());
        }

        let withdrawn_len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
        if WITHDRAWN_ROUTES_LENGTH_SIZE + withdrawn_len + TOTAL_ATTR_LENGTH_SIZE > bytes.len() {
            return Err(malformed_attr_list());
        }

        let mut cursor = WITHDRAWN_ROUTES_LENGTH_SIZE;
        let withdrawn_routes = parse_nlri_list(&bytes[cursor..cursor + withdrawn_len])?;
        cursor += withdrawn_len;

        let attrs_len = u16::from_be_bytes([bytes[cursor], bytes[cursor + 1]]) as usize;
        cursor += TOTAL_ATTR_LENGTH_SIZE;

        validate_update_message_lengths(withdrawn_len, attrs_len, bytes.len())?;

        let path_attributes = read_path_attributes(&bytes[cursor..cursor + attrs_len], format)?;
        cursor += attrs_len;

        let nlri_list = parse_nlri_list(&bytes[cursor..])?;

        let update = UpdateMessage {
            withdrawn_routes,
            path_attributes,
            nlri_list,
        };
        update.validate_mandatory_attributes()?;

        Ok(update)
    }
}

impl Message for UpdateMessage {
    fn kind(&self) -> MessageType {
        MessageType::Update
    }

    fn to_bytes(&self, format: &MessageFormat) -> Vec<u8> {
        let withdrawn_bytes = write_nlri_list(&self.withdrawn_routes);

        let mut attr_bytes = Vec::new();
        for attr in &self.path_attributes {
            attr_bytes.extend_from_slice(&write_path_attribute(attr, format));
        }

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(withdrawn_bytes.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&withdrawn_bytes);
        bytes.extend_from_slice(&(attr_bytes.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&attr_bytes);
        bytes.extend_from_slice(&write_nlri_list(&self.nlri_list));

        bytes
    }
}
