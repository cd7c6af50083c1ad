//! Buddy food group (0x03): presence notifications.

use bytes::{BufMut, Bytes};

use crate::{errors::Result, tlv::TlvBlock, user_info::TlvUserInfo};

/// Subgroup codes.
pub mod sub {
    /// Error response.
    pub const ERR: u16 = 0x0001;
    /// Rights query.
    pub const RIGHTS_QUERY: u16 = 0x0002;
    /// Rights reply.
    pub const RIGHTS_REPLY: u16 = 0x0003;
    /// A watched user came online or changed state.
    pub const ARRIVED: u16 = 0x000B;
    /// A watched user went offline.
    pub const DEPARTED: u16 = 0x000C;
}

/// TLV tags in the rights reply.
pub mod tags {
    /// Maximum buddy-list entries (u16).
    pub const MAX_BUDDIES: u16 = 0x0001;
    /// Maximum watchers (u16).
    pub const MAX_WATCHERS: u16 = 0x0002;
    /// Maximum temporary buddies (u16).
    pub const MAX_TEMP_BUDDIES: u16 = 0x0004;
}

/// `RightsQuery` (0x02): TLV body; contents ignored by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RightsQuery {
    /// Request TLVs.
    pub tlvs: TlvBlock,
}

impl RightsQuery {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}

/// `RightsReply` (0x03): canned list-size limits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RightsReply {
    /// Limit TLVs.
    pub tlvs: TlvBlock,
}

impl RightsReply {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}

/// `Arrived` (0x0B): full user-info block for the arriving buddy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrived {
    /// Arriving user's info, including attribute TLVs.
    pub user_info: TlvUserInfo,
}

impl Arrived {
    /// Decode the embedded user-info record.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { user_info: TlvUserInfo::decode(buf)? })
    }

    /// Encode the embedded user-info record.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.user_info.encode(buf)
    }
}

/// `Departed` (0x0C): bare user info only.
///
/// The attribute block is deliberately omitted; 4.x-era clients mis-process
/// departure events that carry one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departed {
    /// Departing user's name and warning level; TLV count is always zero.
    pub user_info: TlvUserInfo,
}

impl Departed {
    /// Decode the embedded user-info record.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { user_info: TlvUserInfo::decode(buf)? })
    }

    /// Encode the embedded user-info record.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.user_info.encode(buf)
    }
}
