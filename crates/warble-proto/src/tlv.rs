//! Tag-length-value fields and the block shapes that compose them.
//!
//! A TLV is `tag(be16) | length(be16) | value[length]`. TLVs appear in three
//! block shapes on the wire:
//!
//! - rest block: TLVs until the end of the enclosing body
//! - counted block: a 16-bit TLV count, then that many TLVs
//! - length block: a 16-bit byte length, then TLVs filling exactly that span
//!
//! All three decode into the same [`TlvBlock`] value; the caller picks the
//! encoding that the surrounding body requires. Encoding preserves insertion
//! order, so `decode` followed by `encode` reproduces the input byte-for-byte.

use bytes::{BufMut, Bytes};

use crate::{
    errors::{ProtocolError, Result},
    wire,
};

/// A single tag-length-value field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    /// 16-bit tag identifying the field.
    pub tag: u16,
    /// Raw value bytes; interpretation is tag- and context-specific.
    pub value: Bytes,
}

impl Tlv {
    /// TLV with raw value bytes.
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self { tag, value: value.into() }
    }

    /// TLV with an empty value (presence flag).
    #[must_use]
    pub fn empty(tag: u16) -> Self {
        Self { tag, value: Bytes::new() }
    }

    /// TLV holding a big-endian u16.
    #[must_use]
    pub fn u16(tag: u16, value: u16) -> Self {
        Self { tag, value: Bytes::copy_from_slice(&value.to_be_bytes()) }
    }

    /// TLV holding a big-endian u32.
    #[must_use]
    pub fn u32(tag: u16, value: u32) -> Self {
        Self { tag, value: Bytes::copy_from_slice(&value.to_be_bytes()) }
    }

    /// TLV holding a UTF-8 string without terminator.
    pub fn string(tag: u16, value: impl AsRef<str>) -> Self {
        Self { tag, value: Bytes::copy_from_slice(value.as_ref().as_bytes()) }
    }

    /// Decode one TLV from the buffer.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let tag = wire::read_u16(buf)?;
        let len = usize::from(wire::read_u16(buf)?);
        let value = wire::read_bytes(buf, len)?;
        Ok(Self { tag, value })
    }

    /// Encode this TLV onto the buffer.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        let len = self.value.len();
        if len > usize::from(u16::MAX) {
            return Err(ProtocolError::ValueTooLong { len, max: usize::from(u16::MAX) });
        }
        buf.put_u16(self.tag);
        buf.put_u16(len as u16);
        buf.put_slice(&self.value);
        Ok(())
    }

    /// Encoded size in bytes, including the tag/length prefix.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        4 + self.value.len()
    }
}

/// An ordered sequence of TLVs.
///
/// Lookup scans in order and returns the first match, mirroring how legacy
/// clients resolve duplicate tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvBlock {
    /// TLVs in wire order.
    pub tlvs: Vec<Tlv>,
}

impl TlvBlock {
    /// Empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block from a list of TLVs.
    #[must_use]
    pub fn from_tlvs(tlvs: Vec<Tlv>) -> Self {
        Self { tlvs }
    }

    /// Append a TLV, preserving order.
    pub fn push(&mut self, tlv: Tlv) {
        self.tlvs.push(tlv);
    }

    /// First TLV with the given tag, if any.
    #[must_use]
    pub fn find(&self, tag: u16) -> Option<&Tlv> {
        self.tlvs.iter().find(|t| t.tag == tag)
    }

    /// Whether any TLV carries the given tag.
    #[must_use]
    pub fn has(&self, tag: u16) -> bool {
        self.find(tag).is_some()
    }

    /// First TLV with the given tag, or [`ProtocolError::TagNotFound`].
    pub fn require(&self, tag: u16) -> Result<&Tlv> {
        self.find(tag).ok_or(ProtocolError::TagNotFound(tag))
    }

    /// Value of the given tag as raw bytes.
    #[must_use]
    pub fn bytes(&self, tag: u16) -> Option<Bytes> {
        self.find(tag).map(|t| t.value.clone())
    }

    /// Value of the given tag as a UTF-8 string.
    pub fn string(&self, tag: u16) -> Option<Result<String>> {
        self.find(tag).map(|t| {
            String::from_utf8(t.value.to_vec()).map_err(|_| ProtocolError::InvalidString)
        })
    }

    /// Value of the given tag as a big-endian u16.
    ///
    /// `None` when absent; an error when present with the wrong width.
    pub fn u16(&self, tag: u16) -> Option<Result<u16>> {
        self.find(tag).map(|t| {
            let raw: [u8; 2] =
                t.value.as_ref().try_into().map_err(|_| ProtocolError::Malformed("u16 TLV"))?;
            Ok(u16::from_be_bytes(raw))
        })
    }

    /// Value of the given tag as a big-endian u32.
    pub fn u32(&self, tag: u16) -> Option<Result<u32>> {
        self.find(tag).map(|t| {
            let raw: [u8; 4] =
                t.value.as_ref().try_into().map_err(|_| ProtocolError::Malformed("u32 TLV"))?;
            Ok(u32::from_be_bytes(raw))
        })
    }

    /// Number of TLVs in the block.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tlvs.len()
    }

    /// Whether the block holds no TLVs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tlvs.is_empty()
    }

    /// Total encoded size of all TLVs in bytes.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        self.tlvs.iter().map(Tlv::wire_len).sum()
    }

    /// Decode TLVs until the buffer is exhausted (rest block).
    pub fn decode_rest(buf: &mut Bytes) -> Result<Self> {
        let mut tlvs = Vec::new();
        while !buf.is_empty() {
            tlvs.push(Tlv::decode(buf)?);
        }
        Ok(Self { tlvs })
    }

    /// Decode a 16-bit count followed by that many TLVs (counted block).
    pub fn decode_counted(buf: &mut Bytes) -> Result<Self> {
        let count = wire::read_u16(buf)?;
        let mut tlvs = Vec::with_capacity(usize::from(count.min(64)));
        for _ in 0..count {
            tlvs.push(Tlv::decode(buf)?);
        }
        Ok(Self { tlvs })
    }

    /// Decode a 16-bit byte length followed by TLVs filling exactly that span
    /// (length block).
    pub fn decode_len_prefixed(buf: &mut Bytes) -> Result<Self> {
        let mut span = wire::read_bytes16(buf)?;
        let block = Self::decode_rest(&mut span)?;
        Ok(block)
    }

    /// Encode TLVs with no prefix (rest block).
    pub fn encode_rest(&self, buf: &mut impl BufMut) -> Result<()> {
        for tlv in &self.tlvs {
            tlv.encode(buf)?;
        }
        Ok(())
    }

    /// Encode a 16-bit TLV count, then the TLVs (counted block).
    pub fn encode_counted(&self, buf: &mut impl BufMut) -> Result<()> {
        let count = self.tlvs.len();
        if count > usize::from(u16::MAX) {
            return Err(ProtocolError::ValueTooLong { len: count, max: usize::from(u16::MAX) });
        }
        buf.put_u16(count as u16);
        self.encode_rest(buf)
    }

    /// Encode a 16-bit byte length, then the TLVs (length block).
    pub fn encode_len_prefixed(&self, buf: &mut impl BufMut) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(ProtocolError::ValueTooLong { len, max: usize::from(u16::MAX) });
        }
        buf.put_u16(len as u16);
        self.encode_rest(buf)
    }
}

impl FromIterator<Tlv> for TlvBlock {
    fn from_iter<I: IntoIterator<Item = Tlv>>(iter: I) -> Self {
        Self { tlvs: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> TlvBlock {
        TlvBlock::from_tlvs(vec![
            Tlv::string(0x0001, "haverford"),
            Tlv::u16(0x0008, 0x0001),
            Tlv::empty(0x0003),
            Tlv::u32(0x0006, 0x0000_0100),
        ])
    }

    #[test]
    fn rest_block_round_trip() {
        let block = sample_block();

        let mut wire = Vec::new();
        block.encode_rest(&mut wire).unwrap();

        let mut buf = Bytes::from(wire);
        let parsed = TlvBlock::decode_rest(&mut buf).unwrap();
        assert_eq!(block, parsed);
    }

    #[test]
    fn counted_block_round_trip() {
        let block = sample_block();

        let mut wire = Vec::new();
        block.encode_counted(&mut wire).unwrap();

        let mut buf = Bytes::from(wire);
        let parsed = TlvBlock::decode_counted(&mut buf).unwrap();
        assert_eq!(block, parsed);
        assert!(buf.is_empty());
    }

    #[test]
    fn len_prefixed_block_round_trip() {
        let block = sample_block();

        let mut wire = Vec::new();
        block.encode_len_prefixed(&mut wire).unwrap();

        let mut buf = Bytes::from(wire);
        let parsed = TlvBlock::decode_len_prefixed(&mut buf).unwrap();
        assert_eq!(block, parsed);
    }

    #[test]
    fn len_prefixed_block_leaves_trailing_bytes() {
        let block = sample_block();

        let mut wire = Vec::new();
        block.encode_len_prefixed(&mut wire).unwrap();
        wire.extend_from_slice(&[0xDE, 0xAD]);

        let mut buf = Bytes::from(wire);
        let parsed = TlvBlock::decode_len_prefixed(&mut buf).unwrap();
        assert_eq!(block, parsed);
        assert_eq!(buf.as_ref(), &[0xDE, 0xAD]);
    }

    #[test]
    fn typed_accessors() {
        let block = sample_block();

        assert_eq!(block.string(0x0001).unwrap().unwrap(), "haverford");
        assert_eq!(block.u16(0x0008).unwrap().unwrap(), 0x0001);
        assert_eq!(block.u32(0x0006).unwrap().unwrap(), 0x0000_0100);
        assert!(block.has(0x0003));
        assert!(block.u16(0x0042).is_none());
    }

    #[test]
    fn wrong_width_value_is_an_error() {
        let block = TlvBlock::from_tlvs(vec![Tlv::u16(0x0006, 7)]);
        assert!(block.u32(0x0006).unwrap().is_err());
    }

    #[test]
    fn duplicate_tags_resolve_to_first() {
        let block =
            TlvBlock::from_tlvs(vec![Tlv::u16(0x0001, 1), Tlv::u16(0x0001, 2)]);
        assert_eq!(block.u16(0x0001).unwrap().unwrap(), 1);
    }

    #[test]
    fn truncated_tlv_reports_eof() {
        // Tag + claimed length of 4, only 2 value bytes present.
        let mut buf = Bytes::from_static(&[0x00, 0x01, 0x00, 0x04, 0xAA, 0xBB]);
        assert!(matches!(
            Tlv::decode(&mut buf),
            Err(ProtocolError::UnexpectedEof { needed: 4, remaining: 2 })
        ));
    }
}
