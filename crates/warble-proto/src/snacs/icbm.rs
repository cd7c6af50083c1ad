//! ICBM food group (0x04): instant messages, typing events, warnings.

use bytes::{BufMut, Bytes};

use crate::{errors::Result, tlv::TlvBlock, user_info::TlvUserInfo, wire};

/// Subgroup codes.
pub mod sub {
    /// Error response.
    pub const ERR: u16 = 0x0001;
    /// Client pushes its channel parameters.
    pub const ADD_PARAMETERS: u16 = 0x0002;
    /// Parameter query.
    pub const PARAMETER_QUERY: u16 = 0x0004;
    /// Parameter reply.
    pub const PARAMETER_REPLY: u16 = 0x0005;
    /// Client sends a message toward a recipient.
    pub const CHANNEL_MSG_TO_HOST: u16 = 0x0006;
    /// Host relays a message to a recipient.
    pub const CHANNEL_MSG_TO_CLIENT: u16 = 0x0007;
    /// Warn another user.
    pub const EVIL_REQUEST: u16 = 0x0008;
    /// Warning result for the warner.
    pub const EVIL_REPLY: u16 = 0x0009;
    /// Host acknowledges a delivered message.
    pub const HOST_ACK: u16 = 0x000C;
    /// Typing/mini-event relay.
    pub const CLIENT_EVENT: u16 = 0x0014;
}

/// TLV tags inside message bodies.
pub mod tags {
    /// Channel-1 message data blob.
    pub const AOL_IM_DATA: u16 = 0x0002;
    /// Sender requests a host acknowledgement.
    pub const REQUEST_HOST_ACK: u16 = 0x0003;
    /// Message is an auto-response (away message).
    pub const AUTO_RESPONSE: u16 = 0x0004;
    /// Channel-2 rendezvous data.
    pub const DATA: u16 = 0x0005;
    /// Empty marker the host appends when relaying.
    pub const HOST_MARKER: u16 = 0x000B;
}

/// Anonymous warning flag in [`EvilRequest::send_as`].
pub const SEND_AS_ANONYMOUS: u16 = 0x0001;

/// `AddParameters` (0x02): the client's own channel parameters.
///
/// Accepted and discarded; the server neither stores nor enforces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddParameters {
    /// Channel the parameters apply to.
    pub channel: u16,
    /// Channel flag bits.
    pub flags: u32,
    /// Maximum incoming message length.
    pub max_incoming_len: u16,
    /// Maximum sender warning level.
    pub max_source_evil: u16,
    /// Maximum recipient warning level.
    pub max_dest_evil: u16,
    /// Minimum interval between messages, milliseconds.
    pub min_interval: u32,
}

impl AddParameters {
    /// Decode the fixed parameter record.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            channel: wire::read_u16(buf)?,
            flags: wire::read_u32(buf)?,
            max_incoming_len: wire::read_u16(buf)?,
            max_source_evil: wire::read_u16(buf)?,
            max_dest_evil: wire::read_u16(buf)?,
            min_interval: wire::read_u32(buf)?,
        })
    }

    /// Encode the fixed parameter record.
    pub fn encode(self, buf: &mut impl BufMut) {
        buf.put_u16(self.channel);
        buf.put_u32(self.flags);
        buf.put_u16(self.max_incoming_len);
        buf.put_u16(self.max_source_evil);
        buf.put_u16(self.max_dest_evil);
        buf.put_u32(self.min_interval);
    }
}

/// `ParameterReply` (0x05): canned messaging parameters, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterReply {
    /// Maximum message slots.
    pub max_slots: u16,
    /// Channel flag bits.
    pub flags: u32,
    /// Maximum incoming message length.
    pub max_incoming_len: u16,
    /// Maximum sender warning level to still deliver.
    pub max_source_evil: u16,
    /// Maximum recipient warning level to still deliver.
    pub max_dest_evil: u16,
    /// Minimum interval between messages, milliseconds.
    pub min_interval: u32,
}

impl ParameterReply {
    /// Decode the fixed parameter record.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            max_slots: wire::read_u16(buf)?,
            flags: wire::read_u32(buf)?,
            max_incoming_len: wire::read_u16(buf)?,
            max_source_evil: wire::read_u16(buf)?,
            max_dest_evil: wire::read_u16(buf)?,
            min_interval: wire::read_u32(buf)?,
        })
    }

    /// Encode the fixed parameter record.
    pub fn encode(self, buf: &mut impl BufMut) {
        buf.put_u16(self.max_slots);
        buf.put_u32(self.flags);
        buf.put_u16(self.max_incoming_len);
        buf.put_u16(self.max_source_evil);
        buf.put_u16(self.max_dest_evil);
        buf.put_u32(self.min_interval);
    }
}

/// `ChannelMsgToHost` (0x06): outbound message from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMsgToHost {
    /// Message cookie, echoed on acks and errors.
    pub cookie: [u8; 8],
    /// Message channel (1 = plain IM, 2 = rendezvous).
    pub channel: u16,
    /// Recipient screen name.
    pub screen_name: String,
    /// Message TLVs, relayed verbatim to the recipient.
    pub tlvs: TlvBlock,
}

impl ChannelMsgToHost {
    /// Decode cookie, channel, recipient, and trailing TLVs.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            cookie: wire::read_array(buf)?,
            channel: wire::read_u16(buf)?,
            screen_name: wire::read_string8(buf)?,
            tlvs: TlvBlock::decode_rest(buf)?,
        })
    }

    /// Encode cookie, channel, recipient, and TLVs.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_slice(&self.cookie);
        buf.put_u16(self.channel);
        wire::write_string8(buf, &self.screen_name)?;
        self.tlvs.encode_rest(buf)
    }
}

/// `ChannelMsgToClient` (0x07): message relayed to the recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMsgToClient {
    /// Cookie copied from the sender's request.
    pub cookie: [u8; 8],
    /// Channel copied from the sender's request.
    pub channel: u16,
    /// Sender's user-info block.
    pub sender: TlvUserInfo,
    /// Host marker plus the sender's TLVs copied verbatim.
    pub tlvs: TlvBlock,
}

impl ChannelMsgToClient {
    /// Decode cookie, channel, sender info, and trailing TLVs.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            cookie: wire::read_array(buf)?,
            channel: wire::read_u16(buf)?,
            sender: TlvUserInfo::decode(buf)?,
            tlvs: TlvBlock::decode_rest(buf)?,
        })
    }

    /// Encode cookie, channel, sender info, and TLVs.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_slice(&self.cookie);
        buf.put_u16(self.channel);
        self.sender.encode(buf)?;
        self.tlvs.encode_rest(buf)
    }
}

/// `EvilRequest` (0x08): warn a user, optionally anonymously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvilRequest {
    /// [`SEND_AS_ANONYMOUS`] for anonymous warnings, zero otherwise.
    pub send_as: u16,
    /// Target screen name.
    pub screen_name: String,
}

impl EvilRequest {
    /// Decode the send-as flag and target name.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { send_as: wire::read_u16(buf)?, screen_name: wire::read_string8(buf)? })
    }

    /// Encode the send-as flag and target name.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u16(self.send_as);
        wire::write_string8(buf, &self.screen_name)
    }
}

/// `EvilReply` (0x09): delta applied and the target's updated level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvilReply {
    /// Warning units added by this request.
    pub delta: u16,
    /// Target's warning level after the increment.
    pub updated_evil: u16,
}

impl EvilReply {
    /// Decode the delta and updated level.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { delta: wire::read_u16(buf)?, updated_evil: wire::read_u16(buf)? })
    }

    /// Encode the delta and updated level.
    pub fn encode(self, buf: &mut impl BufMut) {
        buf.put_u16(self.delta);
        buf.put_u16(self.updated_evil);
    }
}

/// `HostAck` (0x0C): echoes cookie, channel, and recipient to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAck {
    /// Cookie from the acknowledged message.
    pub cookie: [u8; 8],
    /// Channel from the acknowledged message.
    pub channel: u16,
    /// Recipient the message was relayed to.
    pub screen_name: String,
}

impl HostAck {
    /// Decode cookie, channel, and recipient.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            cookie: wire::read_array(buf)?,
            channel: wire::read_u16(buf)?,
            screen_name: wire::read_string8(buf)?,
        })
    }

    /// Encode cookie, channel, and recipient.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_slice(&self.cookie);
        buf.put_u16(self.channel);
        wire::write_string8(buf, &self.screen_name)
    }
}

/// `ClientEvent` (0x14): typing indicator relay.
///
/// Inbound, `screen_name` is the intended recipient; on relay the host
/// rewrites it to the sender so the receiving client attributes the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEvent {
    /// Event cookie.
    pub cookie: [u8; 8],
    /// Message channel.
    pub channel: u16,
    /// Recipient (inbound) or sender (relayed).
    pub screen_name: String,
    /// Event code (0 = stopped, 1 = typed, 2 = typing).
    pub event: u16,
}

impl ClientEvent {
    /// Decode cookie, channel, name, and event code.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            cookie: wire::read_array(buf)?,
            channel: wire::read_u16(buf)?,
            screen_name: wire::read_string8(buf)?,
            event: wire::read_u16(buf)?,
        })
    }

    /// Encode cookie, channel, name, and event code.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_slice(&self.cookie);
        buf.put_u16(self.channel);
        wire::write_string8(buf, &self.screen_name)?;
        buf.put_u16(self.event);
        Ok(())
    }
}
