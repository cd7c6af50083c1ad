//! ChatNav food group (0x0D): room creation and lookup.

use bytes::{BufMut, Bytes};

use crate::{errors::Result, snacs::chat::RoomDescriptor, tlv::TlvBlock, wire};

/// Subgroup codes.
pub mod sub {
    /// Error response.
    pub const ERR: u16 = 0x0001;
    /// Chat rights query.
    pub const REQUEST_CHAT_RIGHTS: u16 = 0x0002;
    /// Room info query.
    pub const REQUEST_ROOM_INFO: u16 = 0x0004;
    /// Create (or resolve) a room.
    pub const CREATE_ROOM: u16 = 0x0008;
    /// Rights / room info reply.
    pub const NAV_INFO: u16 = 0x0009;
}

/// TLV tags in NavInfo replies.
pub mod tags {
    /// Maximum concurrent rooms (u8).
    pub const MAX_CONCURRENT_ROOMS: u16 = 0x0002;
    /// Exchange descriptor block.
    pub const EXCHANGE_INFO: u16 = 0x0003;
    /// Room descriptor block.
    pub const ROOM_INFO: u16 = 0x0004;
}

/// Cookie value clients send in a creation request.
pub const CREATE_COOKIE: &str = "create";

/// `RequestRoomInfo` (0x04):
/// `exchange(be16) | cookie(len8) | instance(be16) | detailLevel(u8)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRoomInfo {
    /// Exchange the room lives on.
    pub exchange: u16,
    /// Room cookie to look up.
    pub cookie: String,
    /// Room instance number.
    pub instance: u16,
    /// Requested detail level.
    pub detail_level: u8,
}

impl RequestRoomInfo {
    /// Decode the lookup request.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            exchange: wire::read_u16(buf)?,
            cookie: wire::read_string8(buf)?,
            instance: wire::read_u16(buf)?,
            detail_level: wire::read_u8(buf)?,
        })
    }

    /// Encode the lookup request.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u16(self.exchange);
        wire::write_string8(buf, &self.cookie)?;
        buf.put_u16(self.instance);
        buf.put_u8(self.detail_level);
        Ok(())
    }
}

/// `CreateRoom` (0x08): a room descriptor whose cookie is
/// [`CREATE_COOKIE`] and whose TLVs name the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoom {
    /// Requested room parameters.
    pub room: RoomDescriptor,
}

impl CreateRoom {
    /// Decode the embedded descriptor.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { room: RoomDescriptor::decode(buf)? })
    }

    /// Encode the embedded descriptor.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.room.encode(buf)
    }
}

/// `NavInfo` (0x09): TLV body answering rights and room queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavInfo {
    /// Reply TLVs; see [`tags`].
    pub tlvs: TlvBlock,
}

impl NavInfo {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}
