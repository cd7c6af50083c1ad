//! Locate food group (0x02): profiles, away messages, user-info queries.

use bytes::{BufMut, Bytes};

use crate::{errors::Result, tlv::TlvBlock, user_info::TlvUserInfo, wire};

/// Subgroup codes.
pub mod sub {
    /// Error response.
    pub const ERR: u16 = 0x0001;
    /// Rights query.
    pub const RIGHTS_QUERY: u16 = 0x0002;
    /// Rights reply.
    pub const RIGHTS_REPLY: u16 = 0x0003;
    /// Set profile, away message, or capabilities.
    pub const SET_INFO: u16 = 0x0004;
    /// User-info reply.
    pub const USER_INFO_REPLY: u16 = 0x0006;
    /// Set directory info.
    pub const SET_DIR_INFO: u16 = 0x0009;
    /// Directory info reply.
    pub const SET_DIR_REPLY: u16 = 0x000A;
    /// Set interest keywords.
    pub const SET_KEYWORD_INFO: u16 = 0x000F;
    /// Keyword reply.
    pub const SET_KEYWORD_REPLY: u16 = 0x0010;
    /// User-info query with a type bitmask.
    pub const USER_INFO_QUERY2: u16 = 0x0015;
}

/// TLV tags in info bodies.
pub mod tags {
    /// Profile MIME type.
    pub const INFO_SIG_MIME: u16 = 0x0001;
    /// Profile body.
    pub const INFO_SIG_DATA: u16 = 0x0002;
    /// Away-message MIME type.
    pub const INFO_UNAVAILABLE_MIME: u16 = 0x0003;
    /// Away-message body.
    pub const INFO_UNAVAILABLE_DATA: u16 = 0x0004;
    /// Capability UUID blob.
    pub const INFO_CAPABILITIES: u16 = 0x0005;
}

/// Bits in [`UserInfoQuery2::type2`] selecting reply sections.
pub mod query_type {
    /// Include the profile.
    pub const PROFILE: u32 = 0x0000_0001;
    /// Include the away message.
    pub const AWAY_MESSAGE: u32 = 0x0000_0002;
    /// Include capabilities.
    pub const CAPABILITIES: u32 = 0x0000_0004;
}

/// MIME type attached to profile and away-message sections.
pub const AOLRTF_MIME: &str = "text/aolrtf; charset=\"us-ascii\"";

/// `RightsQuery` (0x02): contents ignored by the server.
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

/// `RightsReply` (0x03): canned capability length limits.
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

/// `SetInfo` (0x04): profile and/or away-message update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetInfo {
    /// Update TLVs; see [`tags`].
    pub tlvs: TlvBlock,
}

impl SetInfo {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}

/// `UserInfoQuery2` (0x15): ask about another user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfoQuery2 {
    /// Bitmask of requested sections; see [`query_type`].
    pub type2: u32,
    /// Target screen name.
    pub screen_name: String,
}

impl UserInfoQuery2 {
    /// Decode the type bitmask and target name.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { type2: wire::read_u32(buf)?, screen_name: wire::read_string8(buf)? })
    }

    /// Encode the type bitmask and target name.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u32(self.type2);
        wire::write_string8(buf, &self.screen_name)
    }
}

/// `UserInfoReply` (0x06): target's info plus requested sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfoReply {
    /// Target's user-info block.
    pub user_info: TlvUserInfo,
    /// Profile/away sections as MIME + data TLV pairs.
    pub tlvs: TlvBlock,
}

impl UserInfoReply {
    /// Decode the user info and trailing section TLVs.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { user_info: TlvUserInfo::decode(buf)?, tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the user info and section TLVs.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.user_info.encode(buf)?;
        self.tlvs.encode_rest(buf)
    }
}

/// `SetDirInfo` (0x09): directory update; accepted, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetDirInfo {
    /// Directory TLVs.
    pub tlvs: TlvBlock,
}

impl SetDirInfo {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}

/// `SetDirReply` (0x0A) and `SetKeywordReply` (0x10): a bare result word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultReply {
    /// Result code; 1 means accepted.
    pub result: u16,
}

impl ResultReply {
    /// Accepted result.
    #[must_use]
    pub fn ok() -> Self {
        Self { result: 0x0001 }
    }

    /// Decode the result word.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { result: wire::read_u16(buf)? })
    }

    /// Encode the result word.
    pub fn encode(self, buf: &mut impl BufMut) {
        buf.put_u16(self.result);
    }
}

/// `SetKeywordInfo` (0x0F): interest keywords; accepted, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetKeywordInfo {
    /// Keyword TLVs.
    pub tlvs: TlvBlock,
}

impl SetKeywordInfo {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}
