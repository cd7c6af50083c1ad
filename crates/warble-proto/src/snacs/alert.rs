//! Alert food group (0x18).
//!
//! AIM 5.x clients register alert capabilities during signon. The server
//! accepts the notifications silently so signon completes without errors.

use bytes::{BufMut, Bytes};

use crate::{errors::Result, tlv::TlvBlock};

/// Subgroup codes.
pub mod sub {
    /// Error response.
    pub const ERR: u16 = 0x0001;
    /// Client announces alert capabilities.
    pub const NOTIFY_CAPABILITIES: u16 = 0x0002;
    /// Client announces display capabilities.
    pub const NOTIFY_DISPLAY_CAPABILITIES: u16 = 0x0003;
}

/// `NotifyCapabilities` (0x02) and `NotifyDisplayCapabilities` (0x03): TLV
/// bodies the server accepts and ignores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notify {
    /// Capability TLVs.
    pub tlvs: TlvBlock,
}

impl Notify {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}
