//! SNAC frame header and protocol error codes.
//!
//! A SNAC is the typed request/response unit inside a Data FLAP:
//!
//! `foodGroup(be16) | subGroup(be16) | flags(be16) | requestId(be32) | body`
//!
//! The `(food group, subgroup)` pair selects the body codec; the request id
//! correlates responses with the client request that produced them.

use bytes::{BufMut, Bytes};

use crate::{errors::Result, wire};

/// Food group numeric assignments, fixed by the protocol.
pub mod foodgroup {
    /// Connection-wide service concerns.
    pub const OSERVICE: u16 = 0x0001;
    /// Profile and away-message service.
    pub const LOCATE: u16 = 0x0002;
    /// Presence notifications.
    pub const BUDDY: u16 = 0x0003;
    /// Inter-client basic messaging.
    pub const ICBM: u16 = 0x0004;
    /// Chat room navigation.
    pub const CHAT_NAV: u16 = 0x000D;
    /// Chat room messaging.
    pub const CHAT: u16 = 0x000E;
    /// Server-stored buddy list.
    pub const FEEDBAG: u16 = 0x0013;
    /// Login service.
    pub const BUCP: u16 = 0x0017;
    /// Alerts service.
    pub const ALERT: u16 = 0x0018;
}

/// SNAC frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnacFrame {
    /// Functional area the body belongs to.
    pub food_group: u16,
    /// Operation within the food group.
    pub subgroup: u16,
    /// Header flags; zero for everything this server emits.
    pub flags: u16,
    /// Client-assigned id echoed on responses.
    pub request_id: u32,
}

impl SnacFrame {
    /// Size of the header on the wire.
    pub const SIZE: usize = 10;

    /// Header with zeroed flags.
    #[must_use]
    pub fn new(food_group: u16, subgroup: u16, request_id: u32) -> Self {
        Self { food_group, subgroup, flags: 0, request_id }
    }

    /// Decode a header from the buffer.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            food_group: wire::read_u16(buf)?,
            subgroup: wire::read_u16(buf)?,
            flags: wire::read_u16(buf)?,
            request_id: wire::read_u32(buf)?,
        })
    }

    /// Encode the header onto the buffer.
    pub fn encode(self, buf: &mut impl BufMut) {
        buf.put_u16(self.food_group);
        buf.put_u16(self.subgroup);
        buf.put_u16(self.flags);
        buf.put_u32(self.request_id);
    }
}

/// SNAC error codes shared by every food group's `0x01` error subgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    /// Malformed or unroutable SNAC.
    InvalidSnac = 0x0001,
    /// Rate limit exceeded toward the host.
    RateToHost = 0x0002,
    /// Rate limit exceeded toward the client.
    RateToClient = 0x0003,
    /// Target is not signed on, or is invisible to the requester.
    NotLoggedOn = 0x0004,
    /// Service temporarily unavailable.
    ServiceUnavailable = 0x0005,
    /// Service is not defined on this connection.
    ServiceNotDefined = 0x0006,
    /// Obsolete SNAC.
    ObsoleteSnac = 0x0007,
    /// Operation not supported by this host.
    NotSupportedByHost = 0x0008,
    /// Operation not supported by the target client.
    NotSupportedByClient = 0x0009,
    /// Refused by the target client.
    RefusedByClient = 0x000A,
    /// Reply would exceed frame limits.
    ReplyTooBig = 0x000B,
    /// Responses lost.
    ResponsesLost = 0x000C,
    /// Request denied.
    RequestDenied = 0x000D,
    /// Busted SNAC payload.
    BustedSnacPayload = 0x000E,
    /// Insufficient rights.
    InsufficientRights = 0x000F,
    /// Recipient is in the sender's local permit/deny list.
    InLocalPermitDeny = 0x0010,
    /// Sender's warning level is too high.
    TooEvilSender = 0x0011,
    /// Receiver's warning level is too high.
    TooEvilReceiver = 0x0012,
    /// Request timed out.
    TimedOut = 0x0013,
}

impl ErrorCode {
    /// Error code from its wire value; unknown codes fall back to
    /// [`ErrorCode::InvalidSnac`] since clients treat them all as generic.
    #[must_use]
    pub fn from_u16(raw: u16) -> Self {
        match raw {
            0x0002 => Self::RateToHost,
            0x0003 => Self::RateToClient,
            0x0004 => Self::NotLoggedOn,
            0x0005 => Self::ServiceUnavailable,
            0x0006 => Self::ServiceNotDefined,
            0x0007 => Self::ObsoleteSnac,
            0x0008 => Self::NotSupportedByHost,
            0x0009 => Self::NotSupportedByClient,
            0x000A => Self::RefusedByClient,
            0x000B => Self::ReplyTooBig,
            0x000C => Self::ResponsesLost,
            0x000D => Self::RequestDenied,
            0x000E => Self::BustedSnacPayload,
            0x000F => Self::InsufficientRights,
            0x0010 => Self::InLocalPermitDeny,
            0x0011 => Self::TooEvilSender,
            0x0012 => Self::TooEvilReceiver,
            0x0013 => Self::TimedOut,
            _ => Self::InvalidSnac,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trip() {
        let frame = SnacFrame::new(foodgroup::ICBM, 0x0006, 0xDEAD_BEEF);

        let mut wire = Vec::new();
        frame.encode(&mut wire);
        assert_eq!(wire.len(), SnacFrame::SIZE);

        let mut buf = Bytes::from(wire);
        let parsed = SnacFrame::decode(&mut buf).unwrap();
        assert_eq!(frame, parsed);
    }

    #[test]
    fn error_code_wire_values() {
        assert_eq!(ErrorCode::NotLoggedOn as u16, 0x0004);
        assert_eq!(ErrorCode::NotSupportedByHost as u16, 0x0008);
        assert_eq!(ErrorCode::InLocalPermitDeny as u16, 0x0010);
        assert_eq!(ErrorCode::from_u16(0x0010), ErrorCode::InLocalPermitDeny);
        assert_eq!(ErrorCode::from_u16(0xFFFF), ErrorCode::InvalidSnac);
    }
}
