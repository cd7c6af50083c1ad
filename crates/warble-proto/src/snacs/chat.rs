//! Chat food group (0x0E): in-room messaging.

use bytes::{BufMut, Bytes};

use crate::{errors::Result, tlv::TlvBlock, user_info::TlvUserInfo, wire};

/// Subgroup codes.
pub mod sub {
    /// Error response.
    pub const ERR: u16 = 0x0001;
    /// Room metadata pushed on entry.
    pub const ROOM_INFO_UPDATE: u16 = 0x0002;
    /// Participants joined.
    pub const USERS_JOINED: u16 = 0x0003;
    /// Participants left.
    pub const USERS_LEFT: u16 = 0x0004;
    /// Client sends a room message.
    pub const CHANNEL_MSG_TO_HOST: u16 = 0x0005;
    /// Host broadcasts a room message.
    pub const CHANNEL_MSG_TO_CLIENT: u16 = 0x0006;
}

/// TLV tags in chat message bodies.
pub mod tags {
    /// Sender's user-info block, appended by the host on broadcast.
    pub const SENDER_INFORMATION: u16 = 0x0003;
    /// Message information blob.
    pub const MESSAGE_INFORMATION: u16 = 0x0005;
    /// Sender asks to receive its own message back.
    pub const ENABLE_REFLECTION: u16 = 0x0006;
}

/// Room TLV tags inside a [`RoomDescriptor`].
pub mod room_tags {
    /// Room display name.
    pub const ROOM_NAME: u16 = 0x00D3;
    /// Room creation time, epoch seconds (u32).
    pub const CREATION_TIME: u16 = 0x00CA;
    /// Maximum message length (u16).
    pub const MAX_MSG_LEN: u16 = 0x00D1;
}

/// Room identification and metadata:
/// `exchange(be16) | cookie(len8) | instance(be16) | detailLevel(u8) | TLVBlock`.
///
/// The same shape appears in ChatNav create/info bodies, the room TLV of a
/// NavInfo reply, and the room-info update pushed on chat entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomDescriptor {
    /// Exchange the room lives on.
    pub exchange: u16,
    /// Opaque room cookie; `"create"` in creation requests.
    pub cookie: String,
    /// Room instance number.
    pub instance: u16,
    /// Requested detail level.
    pub detail_level: u8,
    /// Room metadata TLVs; see [`room_tags`].
    pub tlvs: TlvBlock,
}

impl RoomDescriptor {
    /// Decode a descriptor.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            exchange: wire::read_u16(buf)?,
            cookie: wire::read_string8(buf)?,
            instance: wire::read_u16(buf)?,
            detail_level: wire::read_u8(buf)?,
            tlvs: TlvBlock::decode_counted(buf)?,
        })
    }

    /// Encode a descriptor.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u16(self.exchange);
        wire::write_string8(buf, &self.cookie)?;
        buf.put_u16(self.instance);
        buf.put_u8(self.detail_level);
        self.tlvs.encode_counted(buf)
    }

    /// Descriptor bytes for embedding in a TLV.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Room name from the metadata TLVs, if present.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.tlvs.string(room_tags::ROOM_NAME).and_then(std::result::Result::ok)
    }
}

/// `RoomInfoUpdate` (0x02): pushed to a participant on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfoUpdate {
    /// The room being described.
    pub room: RoomDescriptor,
}

impl RoomInfoUpdate {
    /// Decode the embedded descriptor.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { room: RoomDescriptor::decode(buf)? })
    }

    /// Encode the embedded descriptor.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.room.encode(buf)
    }
}

/// `UsersJoined` (0x03): user-info blocks until the body is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersJoined {
    /// Arriving participants.
    pub users: Vec<TlvUserInfo>,
}

impl UsersJoined {
    /// Decode user records until the body is exhausted.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let mut users = Vec::new();
        while !buf.is_empty() {
            users.push(TlvUserInfo::decode(buf)?);
        }
        Ok(Self { users })
    }

    /// Encode all user records.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        for user in &self.users {
            user.encode(buf)?;
        }
        Ok(())
    }
}

/// `UsersLeft` (0x04): same shape as [`UsersJoined`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersLeft {
    /// Departing participants.
    pub users: Vec<TlvUserInfo>,
}

impl UsersLeft {
    /// Decode user records until the body is exhausted.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let mut users = Vec::new();
        while !buf.is_empty() {
            users.push(TlvUserInfo::decode(buf)?);
        }
        Ok(Self { users })
    }

    /// Encode all user records.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        for user in &self.users {
            user.encode(buf)?;
        }
        Ok(())
    }
}

/// `ChannelMsgToHost` (0x05): room message from a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMsgToHost {
    /// Message cookie.
    pub cookie: [u8; 8],
    /// Message channel.
    pub channel: u16,
    /// Message TLVs; [`tags::ENABLE_REFLECTION`] requests an echo.
    pub tlvs: TlvBlock,
}

impl ChannelMsgToHost {
    /// Decode cookie, channel, and trailing TLVs.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            cookie: wire::read_array(buf)?,
            channel: wire::read_u16(buf)?,
            tlvs: TlvBlock::decode_rest(buf)?,
        })
    }

    /// Encode cookie, channel, and TLVs.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_slice(&self.cookie);
        buf.put_u16(self.channel);
        self.tlvs.encode_rest(buf)
    }
}

/// `ChannelMsgToClient` (0x06): room message broadcast by the host.
///
/// Carries the sender's TLVs verbatim plus a [`tags::SENDER_INFORMATION`]
/// TLV the host appends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMsgToClient {
    /// Cookie copied from the sender's request.
    pub cookie: [u8; 8],
    /// Channel copied from the sender's request.
    pub channel: u16,
    /// Sender TLVs plus the appended sender-information TLV.
    pub tlvs: TlvBlock,
}

impl ChannelMsgToClient {
    /// Decode cookie, channel, and trailing TLVs.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            cookie: wire::read_array(buf)?,
            channel: wire::read_u16(buf)?,
            tlvs: TlvBlock::decode_rest(buf)?,
        })
    }

    /// Encode cookie, channel, and TLVs.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_slice(&self.cookie);
        buf.put_u16(self.channel);
        self.tlvs.encode_rest(buf)
    }
}
