//! Feedbag food group (0x13): the server-stored buddy list.

use bytes::{BufMut, Bytes};

use crate::{errors::Result, tlv::TlvBlock, wire};

/// Subgroup codes.
pub mod sub {
    /// Error response.
    pub const ERR: u16 = 0x0001;
    /// Rights query.
    pub const RIGHTS_QUERY: u16 = 0x0002;
    /// Rights reply.
    pub const RIGHTS_REPLY: u16 = 0x0003;
    /// Full list query.
    pub const QUERY: u16 = 0x0004;
    /// Conditional list query.
    pub const QUERY_IF_MODIFIED: u16 = 0x0005;
    /// Full list reply.
    pub const REPLY: u16 = 0x0006;
    /// Client activates the list.
    pub const USE: u16 = 0x0007;
    /// Insert items.
    pub const INSERT_ITEM: u16 = 0x0008;
    /// Update items.
    pub const UPDATE_ITEM: u16 = 0x0009;
    /// Delete items.
    pub const DELETE_ITEM: u16 = 0x000A;
    /// Per-item status results.
    pub const STATUS: u16 = 0x000E;
    /// List unchanged since the client's timestamp.
    pub const REPLY_NOT_MODIFIED: u16 = 0x000F;
    /// Begin a batched edit.
    pub const START_CLUSTER: u16 = 0x0011;
    /// End a batched edit.
    pub const END_CLUSTER: u16 = 0x0012;
}

/// TLV tags in the rights reply.
pub mod tags {
    /// Maximum item count per class, array of u16.
    pub const MAX_ITEMS_BY_CLASS: u16 = 0x0004;
    /// Maximum class id (u16).
    pub const MAX_CLASS: u16 = 0x0002;
}

/// Per-item status code for a successful mutation.
pub const STATUS_SUCCESS: u16 = 0x0000;

/// Feedbag item classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassId {
    /// A buddy entry under a group.
    Buddy,
    /// A buddy group.
    Group,
    /// Permit (allow) entry.
    Permit,
    /// Deny (block) entry.
    Deny,
    /// Permit/deny mode settings.
    PdInfo,
    /// Client preference blob.
    BuddyPrefs,
    /// Any class this server does not interpret.
    Other(u16),
}

impl ClassId {
    /// Class from its wire value.
    #[must_use]
    pub fn from_u16(raw: u16) -> Self {
        match raw {
            0x0000 => Self::Buddy,
            0x0001 => Self::Group,
            0x0002 => Self::Permit,
            0x0003 => Self::Deny,
            0x0004 => Self::PdInfo,
            0x0005 => Self::BuddyPrefs,
            other => Self::Other(other),
        }
    }

    /// Wire value of the class.
    #[must_use]
    pub fn to_u16(self) -> u16 {
        match self {
            Self::Buddy => 0x0000,
            Self::Group => 0x0001,
            Self::Permit => 0x0002,
            Self::Deny => 0x0003,
            Self::PdInfo => 0x0004,
            Self::BuddyPrefs => 0x0005,
            Self::Other(raw) => raw,
        }
    }
}

/// One feedbag entry:
/// `name(len16) | groupId(be16) | itemId(be16) | classId(be16) | TLVLBlock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbagItem {
    /// Item name; a screen name for buddy/permit/deny classes, a group label
    /// for group items.
    pub name: String,
    /// Parent group's item id; zero for group items themselves.
    pub group_id: u16,
    /// Owner-local item id, unique within the class.
    pub item_id: u16,
    /// Item class.
    pub class_id: ClassId,
    /// Attribute TLVs, preserved verbatim.
    pub tlvs: TlvBlock,
}

impl FeedbagItem {
    /// Buddy entry under the given group.
    pub fn buddy(name: impl Into<String>, group_id: u16, item_id: u16) -> Self {
        Self {
            name: name.into(),
            group_id,
            item_id,
            class_id: ClassId::Buddy,
            tlvs: TlvBlock::new(),
        }
    }

    /// Deny entry for the given screen name.
    pub fn deny(name: impl Into<String>, item_id: u16) -> Self {
        Self {
            name: name.into(),
            group_id: 0,
            item_id,
            class_id: ClassId::Deny,
            tlvs: TlvBlock::new(),
        }
    }

    /// Decode one item.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            name: wire::read_string16(buf)?,
            group_id: wire::read_u16(buf)?,
            item_id: wire::read_u16(buf)?,
            class_id: ClassId::from_u16(wire::read_u16(buf)?),
            tlvs: TlvBlock::decode_len_prefixed(buf)?,
        })
    }

    /// Encode one item.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        wire::write_string16(buf, &self.name)?;
        buf.put_u16(self.group_id);
        buf.put_u16(self.item_id);
        buf.put_u16(self.class_id.to_u16());
        self.tlvs.encode_len_prefixed(buf)
    }
}

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

/// `RightsReply` (0x03): advisory list-size limits.
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

/// `QueryIfModified` (0x05): `lastUpdate(be32) | count(u8)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryIfModified {
    /// Client's view of the list timestamp, epoch seconds.
    pub last_update: u32,
    /// Client's view of the item count.
    pub count: u8,
}

impl QueryIfModified {
    /// Decode the timestamp and count.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { last_update: wire::read_u32(buf)?, count: wire::read_u8(buf)? })
    }

    /// Encode the timestamp and count.
    pub fn encode(self, buf: &mut impl BufMut) {
        buf.put_u32(self.last_update);
        buf.put_u8(self.count);
    }
}

/// `Reply` (0x06): `version(u8) | count(be16) | items | lastUpdate(be32)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// List format version; always zero.
    pub version: u8,
    /// Items in storage order.
    pub items: Vec<FeedbagItem>,
    /// Server's list timestamp, epoch seconds; zero for an empty list.
    pub last_update: u32,
}

impl Reply {
    /// Decode the versioned item list.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let version = wire::read_u8(buf)?;
        let count = wire::read_u16(buf)?;
        let mut items = Vec::with_capacity(usize::from(count.min(512)));
        for _ in 0..count {
            items.push(FeedbagItem::decode(buf)?);
        }
        let last_update = wire::read_u32(buf)?;
        Ok(Self { version, items, last_update })
    }

    /// Encode the versioned item list.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        let count = self.items.len();
        if count > usize::from(u16::MAX) {
            return Err(crate::errors::ProtocolError::ValueTooLong {
                len: count,
                max: usize::from(u16::MAX),
            });
        }
        buf.put_u8(self.version);
        buf.put_u16(count as u16);
        for item in &self.items {
            item.encode(buf)?;
        }
        buf.put_u32(self.last_update);
        Ok(())
    }
}

/// `InsertItem` (0x08), `UpdateItem` (0x09), `DeleteItem` (0x0A): items until
/// the body is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemBatch {
    /// Items in request order.
    pub items: Vec<FeedbagItem>,
}

impl ItemBatch {
    /// Batch from a list of items.
    #[must_use]
    pub fn new(items: Vec<FeedbagItem>) -> Self {
        Self { items }
    }

    /// Decode items until the body is exhausted.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let mut items = Vec::new();
        while !buf.is_empty() {
            items.push(FeedbagItem::decode(buf)?);
        }
        Ok(Self { items })
    }

    /// Encode all items.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        for item in &self.items {
            item.encode(buf)?;
        }
        Ok(())
    }
}

/// `Status` (0x0E): one result word per item in the triggering batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    /// Per-item result codes, [`STATUS_SUCCESS`] on success.
    pub results: Vec<u16>,
}

impl Status {
    /// Status with `count` success codes.
    #[must_use]
    pub fn success(count: usize) -> Self {
        Self { results: vec![STATUS_SUCCESS; count] }
    }

    /// Decode result words until the body is exhausted.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let mut results = Vec::new();
        while !buf.is_empty() {
            results.push(wire::read_u16(buf)?);
        }
        Ok(Self { results })
    }

    /// Encode all result words.
    pub fn encode(&self, buf: &mut impl BufMut) {
        for code in &self.results {
            buf.put_u16(*code);
        }
    }
}

/// `ReplyNotModified` (0x0F): `lastUpdate(be32) | count(be16)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyNotModified {
    /// Server's list timestamp, epoch seconds.
    pub last_update: u32,
    /// Server's item count.
    pub count: u16,
}

impl ReplyNotModified {
    /// Decode the timestamp and count.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { last_update: wire::read_u32(buf)?, count: wire::read_u16(buf)? })
    }

    /// Encode the timestamp and count.
    pub fn encode(self, buf: &mut impl BufMut) {
        buf.put_u32(self.last_update);
        buf.put_u16(self.count);
    }
}

/// `StartCluster` (0x11): marks the start of a batched edit; TLVs ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartCluster {
    /// Cluster TLVs.
    pub tlvs: TlvBlock,
}

impl StartCluster {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}
