//! TLV user-info blocks.
//!
//! Most presence-bearing SNACs embed the same record describing a user:
//!
//! `screenName(len8) | warningLevel(be16) | tlvCount(be16) | TLVs`
//!
//! Arrival events carry the full TLV set (class, status, signon time, idle
//! minutes, capabilities). Departure events carry the bare record with a zero
//! TLV count; legacy clients mis-process departures with a populated block.

use bytes::{BufMut, Bytes};

use crate::{errors::Result, tlv::TlvBlock, wire};

/// TLV tags inside a user-info block.
pub mod tags {
    /// User class bitmask (u16).
    pub const USER_CLASS: u16 = 0x0001;
    /// Signon time, seconds since the epoch (u32).
    pub const SIGNON_TOD: u16 = 0x0003;
    /// Idle time in minutes (u16).
    pub const IDLE_TIME: u16 = 0x0004;
    /// User status bitmask (u32); see [`super::status`].
    pub const USER_STATUS: u16 = 0x0006;
    /// Capability UUID blob.
    pub const CAPABILITIES: u16 = 0x000D;
    /// Seconds online (u32).
    pub const ONLINE_TIME: u16 = 0x000F;
}

/// User class bits carried in [`tags::USER_CLASS`].
pub mod class {
    /// Unconfirmed account.
    pub const UNCONFIRMED: u16 = 0x0001;
    /// Free account.
    pub const FREE: u16 = 0x0010;
    /// User has an away message set.
    pub const AWAY: u16 = 0x0020;
}

/// User status bits carried in [`tags::USER_STATUS`].
pub mod status {
    /// Visible to buddies.
    pub const VISIBLE: u32 = 0x0000_0000;
    /// Hidden from presence fan-out.
    pub const INVISIBLE: u32 = 0x0000_0100;
}

/// A user-info record as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvUserInfo {
    /// Display form of the screen name.
    pub screen_name: String,
    /// Warning level in protocol units (percent × 10).
    pub warning_level: u16,
    /// Attribute TLVs; empty for departure events.
    pub tlvs: TlvBlock,
}

impl TlvUserInfo {
    /// Record with the given name, warning level, and attributes.
    #[must_use]
    pub fn new(screen_name: impl Into<String>, warning_level: u16, tlvs: TlvBlock) -> Self {
        Self { screen_name: screen_name.into(), warning_level, tlvs }
    }

    /// Bare record (name and warning only), as departures require.
    #[must_use]
    pub fn bare(screen_name: impl Into<String>, warning_level: u16) -> Self {
        Self { screen_name: screen_name.into(), warning_level, tlvs: TlvBlock::new() }
    }

    /// Decode one record from the buffer.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let screen_name = wire::read_string8(buf)?;
        let warning_level = wire::read_u16(buf)?;
        let tlvs = TlvBlock::decode_counted(buf)?;
        Ok(Self { screen_name, warning_level, tlvs })
    }

    /// Encode the record onto the buffer.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        wire::write_string8(buf, &self.screen_name)?;
        buf.put_u16(self.warning_level);
        self.tlvs.encode_counted(buf)
    }
}
