//! FLAP link-level framing.
//!
//! Every byte on an OSCAR connection travels inside a FLAP frame:
//!
//! `0x2A | type(1) | sequence(be16) | length(be16) | payload[length]`
//!
//! Sequence numbers start at a server-chosen value and increment modulo 2^16
//! per frame written on a connection. Receivers do not enforce sequence gaps.
//! Data frames carry SNACs; Signon frames carry the connection handshake.

use bytes::{BufMut, Bytes};

use crate::{
    errors::{ProtocolError, Result},
    tlv::TlvBlock,
    wire,
};

/// FLAP start-of-frame marker.
pub const FLAP_MARKER: u8 = 0x2A;

/// Protocol version carried in Signon frame payloads.
pub const FLAP_SIGNON_VERSION: u32 = 1;

/// TLV tag for the authorization cookie in a client Signon frame.
pub const TAG_LOGIN_COOKIE: u16 = 0x0006;

/// FLAP frame types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FlapType {
    /// Connection handshake.
    Signon = 1,
    /// SNAC payload.
    Data = 2,
    /// Link-level error; the connection is about to close.
    Error = 3,
    /// Graceful close.
    Signoff = 4,
    /// Keepalive; payload is empty and ignored.
    KeepAlive = 5,
}

impl FlapType {
    /// Frame type from its wire byte.
    pub fn from_u8(raw: u8) -> Result<Self> {
        match raw {
            1 => Ok(Self::Signon),
            2 => Ok(Self::Data),
            3 => Ok(Self::Error),
            4 => Ok(Self::Signoff),
            5 => Ok(Self::KeepAlive),
            other => Err(ProtocolError::UnknownFlapType(other)),
        }
    }
}

/// Parsed FLAP frame header.
///
/// The transport reads exactly [`FlapHeader::SIZE`] bytes, decodes them, then
/// reads `payload_len` more to complete the frame. Splitting header from
/// payload keeps the read loop allocation-free for keepalives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlapHeader {
    /// Frame type.
    pub frame_type: FlapType,
    /// Per-connection sequence number.
    pub sequence: u16,
    /// Number of payload bytes that follow the header.
    pub payload_len: u16,
}

impl FlapHeader {
    /// Size of the fixed header on the wire.
    pub const SIZE: usize = 6;

    /// Decode a header from exactly [`Self::SIZE`] bytes.
    pub fn decode(raw: &[u8; Self::SIZE]) -> Result<Self> {
        if raw[0] != FLAP_MARKER {
            return Err(ProtocolError::BadFlapMarker(raw[0]));
        }
        let frame_type = FlapType::from_u8(raw[1])?;
        let sequence = u16::from_be_bytes([raw[2], raw[3]]);
        let payload_len = u16::from_be_bytes([raw[4], raw[5]]);
        Ok(Self { frame_type, sequence, payload_len })
    }
}

/// A complete FLAP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlapFrame {
    /// Frame type.
    pub frame_type: FlapType,
    /// Per-connection sequence number.
    pub sequence: u16,
    /// Frame payload. A SNAC for Data frames, version + TLVs for Signon.
    pub payload: Bytes,
}

impl FlapFrame {
    /// Frame with the given type, sequence, and payload.
    pub fn new(frame_type: FlapType, sequence: u16, payload: impl Into<Bytes>) -> Self {
        Self { frame_type, sequence, payload: payload.into() }
    }

    /// Encode marker, header, and payload onto the buffer.
    ///
    /// Fails when the payload exceeds the 16-bit length field.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        let len = self.payload.len();
        if len > usize::from(u16::MAX) {
            return Err(ProtocolError::ValueTooLong { len, max: usize::from(u16::MAX) });
        }
        buf.put_u8(FLAP_MARKER);
        buf.put_u8(self.frame_type as u8);
        buf.put_u16(self.sequence);
        buf.put_u16(len as u16);
        buf.put_slice(&self.payload);
        Ok(())
    }

    /// Decode one complete frame from the buffer.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let raw: [u8; FlapHeader::SIZE] = wire::read_array(buf)?;
        let header = FlapHeader::decode(&raw)?;
        let payload = wire::read_bytes(buf, usize::from(header.payload_len))?;
        Ok(Self { frame_type: header.frame_type, sequence: header.sequence, payload })
    }
}

/// Payload of a Signon frame: version word plus optional TLVs.
///
/// The server's opening Signon carries the bare version; the client's reply
/// appends TLVs, notably [`TAG_LOGIN_COOKIE`] on authenticated services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignonFrame {
    /// TLVs following the version word.
    pub tlvs: TlvBlock,
}

impl SignonFrame {
    /// Signon payload with the given TLVs.
    #[must_use]
    pub fn new(tlvs: TlvBlock) -> Self {
        Self { tlvs }
    }

    /// Decode a Signon payload, validating the version word.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let version = wire::read_u32(buf)?;
        if version != FLAP_SIGNON_VERSION {
            return Err(ProtocolError::Malformed("unsupported signon version"));
        }
        let tlvs = TlvBlock::decode_rest(buf)?;
        Ok(Self { tlvs })
    }

    /// Encode the version word and TLVs.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u32(FLAP_SIGNON_VERSION);
        self.tlvs.encode_rest(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::Tlv;

    #[test]
    fn frame_round_trip() {
        let frame = FlapFrame::new(FlapType::Data, 0x1234, vec![0xAA, 0xBB, 0xCC]);

        let mut wire = Vec::new();
        frame.encode(&mut wire).unwrap();
        assert_eq!(wire[0], FLAP_MARKER);

        let mut buf = Bytes::from(wire);
        let parsed = FlapFrame::decode(&mut buf).unwrap();
        assert_eq!(frame, parsed);
        assert!(buf.is_empty());
    }

    #[test]
    fn reject_bad_marker() {
        let raw = [0x2B, 0x02, 0x00, 0x01, 0x00, 0x00];
        assert_eq!(FlapHeader::decode(&raw), Err(ProtocolError::BadFlapMarker(0x2B)));
    }

    #[test]
    fn reject_unknown_frame_type() {
        let raw = [0x2A, 0x09, 0x00, 0x01, 0x00, 0x00];
        assert_eq!(FlapHeader::decode(&raw), Err(ProtocolError::UnknownFlapType(0x09)));
    }

    #[test]
    fn reject_truncated_payload() {
        let frame = FlapFrame::new(FlapType::Data, 1, vec![1, 2, 3, 4]);
        let mut wire = Vec::new();
        frame.encode(&mut wire).unwrap();
        wire.truncate(8);

        let mut buf = Bytes::from(wire);
        assert!(matches!(
            FlapFrame::decode(&mut buf),
            Err(ProtocolError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn signon_round_trip_with_cookie() {
        let signon = SignonFrame::new(TlvBlock::from_tlvs(vec![Tlv::string(
            TAG_LOGIN_COOKIE,
            "0102-0304",
        )]));

        let mut wire = Vec::new();
        signon.encode(&mut wire).unwrap();

        let mut buf = Bytes::from(wire);
        let parsed = SignonFrame::decode(&mut buf).unwrap();
        assert_eq!(signon, parsed);
    }

    #[test]
    fn signon_rejects_wrong_version() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&7u32.to_be_bytes());

        let mut buf = Bytes::from(wire);
        assert!(SignonFrame::decode(&mut buf).is_err());
    }
}
