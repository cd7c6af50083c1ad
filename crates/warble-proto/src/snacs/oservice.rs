//! OService food group (0x01): connection-wide concerns.

use bytes::{BufMut, Bytes};

use crate::{
    errors::Result,
    tlv::TlvBlock,
    user_info::TlvUserInfo,
    wire,
};

/// Subgroup codes.
pub mod sub {
    /// Error response.
    pub const ERR: u16 = 0x0001;
    /// Client declares itself ready for service.
    pub const CLIENT_ONLINE: u16 = 0x0002;
    /// Server announces available food groups.
    pub const HOST_ONLINE: u16 = 0x0003;
    /// Client asks for a redirect to another service.
    pub const SERVICE_REQUEST: u16 = 0x0004;
    /// Redirect response.
    pub const SERVICE_RESPONSE: u16 = 0x0005;
    /// Rate parameter query.
    pub const RATE_PARAMS_QUERY: u16 = 0x0006;
    /// Rate parameter reply.
    pub const RATE_PARAMS_REPLY: u16 = 0x0007;
    /// Client subscribes to rate classes.
    pub const RATE_PARAMS_SUB_ADD: u16 = 0x0008;
    /// Client asks for its own user info.
    pub const USER_INFO_QUERY: u16 = 0x000E;
    /// Own user info reply.
    pub const USER_INFO_UPDATE: u16 = 0x000F;
    /// Warning notification pushed to the warned user.
    pub const EVIL_NOTIFICATION: u16 = 0x0010;
    /// Idle state report.
    pub const IDLE_NOTIFICATION: u16 = 0x0011;
    /// Client's supported food group versions.
    pub const CLIENT_VERSIONS: u16 = 0x0017;
    /// Server's supported food group versions.
    pub const HOST_VERSIONS: u16 = 0x0018;
    /// Status/visibility update.
    pub const SET_USER_INFO_FIELDS: u16 = 0x001E;
}

/// TLV tags used by OService bodies.
pub mod tags {
    /// Redirect target host, `"host:port"`.
    pub const RECONNECT_HERE: u16 = 0x0005;
    /// Authorization cookie for the redirect target.
    pub const LOGIN_COOKIE: u16 = 0x0006;
    /// Food group the redirect applies to.
    pub const GROUP_ID: u16 = 0x000D;
    /// Room identification block inside a chat service request.
    pub const ROOM: u16 = 0x0001;
    /// User status bitmask.
    pub const USER_STATUS: u16 = 0x0006;
    /// SSL state (always empty; TLS is not offered).
    pub const SSL_STATE: u16 = 0x008E;
    /// SSL certificate name (always empty).
    pub const SSL_CERT_NAME: u16 = 0x008D;
}

/// One food-group version entry in client/host version lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoodGroupVersion {
    /// Food group id.
    pub food_group: u16,
    /// Highest protocol version supported.
    pub version: u16,
}

/// `ClientVersions` (0x17) and `HostVersions` (0x18): flat list of
/// food-group/version pairs. The server echoes the client's list unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Versions {
    /// Version entries in wire order.
    pub versions: Vec<FoodGroupVersion>,
}

impl Versions {
    /// Decode pairs until the body is exhausted.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let mut versions = Vec::new();
        while !buf.is_empty() {
            let food_group = wire::read_u16(buf)?;
            let version = wire::read_u16(buf)?;
            versions.push(FoodGroupVersion { food_group, version });
        }
        Ok(Self { versions })
    }

    /// Encode all pairs.
    pub fn encode(&self, buf: &mut impl BufMut) {
        for v in &self.versions {
            buf.put_u16(v.food_group);
            buf.put_u16(v.version);
        }
    }
}

/// `ClientOnline` (0x02): the client is ready; one record per food group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOnline {
    /// Per-group version/tool records.
    pub group_versions: Vec<GroupVersion>,
}

/// Per-food-group record inside [`ClientOnline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupVersion {
    /// Food group id.
    pub food_group: u16,
    /// Protocol version.
    pub version: u16,
    /// Tool id reported by the client.
    pub tool_id: u16,
    /// Tool version reported by the client.
    pub tool_version: u16,
}

impl ClientOnline {
    /// Decode records until the body is exhausted.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let mut group_versions = Vec::new();
        while !buf.is_empty() {
            group_versions.push(GroupVersion {
                food_group: wire::read_u16(buf)?,
                version: wire::read_u16(buf)?,
                tool_id: wire::read_u16(buf)?,
                tool_version: wire::read_u16(buf)?,
            });
        }
        Ok(Self { group_versions })
    }

    /// Encode all records.
    pub fn encode(&self, buf: &mut impl BufMut) {
        for g in &self.group_versions {
            buf.put_u16(g.food_group);
            buf.put_u16(g.version);
            buf.put_u16(g.tool_id);
            buf.put_u16(g.tool_version);
        }
    }
}

/// `HostOnline` (0x03): food groups available on this connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostOnline {
    /// Available food group ids.
    pub food_groups: Vec<u16>,
}

impl HostOnline {
    /// Decode ids until the body is exhausted.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let mut food_groups = Vec::new();
        while !buf.is_empty() {
            food_groups.push(wire::read_u16(buf)?);
        }
        Ok(Self { food_groups })
    }

    /// Encode all ids.
    pub fn encode(&self, buf: &mut impl BufMut) {
        for fg in &self.food_groups {
            buf.put_u16(*fg);
        }
    }
}

/// `ServiceRequest` (0x04): ask for a redirect to another service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    /// Requested food group; only Chat is honored.
    pub food_group: u16,
    /// Request TLVs; [`tags::ROOM`] carries the chat target.
    pub tlvs: TlvBlock,
}

impl ServiceRequest {
    /// Decode the food group word and trailing TLVs.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let food_group = wire::read_u16(buf)?;
        let tlvs = TlvBlock::decode_rest(buf)?;
        Ok(Self { food_group, tlvs })
    }

    /// Encode the food group word and TLVs.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u16(self.food_group);
        self.tlvs.encode_rest(buf)
    }
}

/// Value of the [`tags::ROOM`] TLV inside a chat [`ServiceRequest`]:
/// `exchange(be16) | cookie(len8) | instance(be16)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatServiceTarget {
    /// Exchange the room lives on.
    pub exchange: u16,
    /// Room cookie.
    pub cookie: String,
    /// Room instance number.
    pub instance: u16,
}

impl ChatServiceTarget {
    /// Decode a room target from TLV value bytes.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let exchange = wire::read_u16(buf)?;
        let cookie = wire::read_string8(buf)?;
        let instance = wire::read_u16(buf)?;
        Ok(Self { exchange, cookie, instance })
    }

    /// Encode the room target for embedding in a TLV.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u16(self.exchange);
        wire::write_string8(buf, &self.cookie)?;
        buf.put_u16(self.instance);
        Ok(())
    }
}

/// `ServiceResponse` (0x05): where to reconnect and what cookie to present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceResponse {
    /// Response TLVs: reconnect host, login cookie, group id, SSL blanks.
    pub tlvs: TlvBlock,
}

impl ServiceResponse {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}

/// One rate class in a [`RateParamsReply`]. Thresholds are advisory; this
/// server performs no enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateClass {
    /// Class id.
    pub id: u16,
    /// Averaging window size.
    pub window_size: u32,
    /// Level at which the clear state is restored.
    pub clear_level: u32,
    /// Level at which the client should warn the user.
    pub alert_level: u32,
    /// Level at which requests are (notionally) limited.
    pub limit_level: u32,
    /// Level at which the host may disconnect.
    pub disconnect_level: u32,
    /// Current running average.
    pub current_level: u32,
    /// Maximum observed level.
    pub max_level: u32,
    /// Time of the last transmission.
    pub last_time: u32,
    /// Current rate state.
    pub current_state: u8,
}

impl RateClass {
    fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self {
            id: wire::read_u16(buf)?,
            window_size: wire::read_u32(buf)?,
            clear_level: wire::read_u32(buf)?,
            alert_level: wire::read_u32(buf)?,
            limit_level: wire::read_u32(buf)?,
            disconnect_level: wire::read_u32(buf)?,
            current_level: wire::read_u32(buf)?,
            max_level: wire::read_u32(buf)?,
            last_time: wire::read_u32(buf)?,
            current_state: wire::read_u8(buf)?,
        })
    }

    fn encode(self, buf: &mut impl BufMut) {
        buf.put_u16(self.id);
        buf.put_u32(self.window_size);
        buf.put_u32(self.clear_level);
        buf.put_u32(self.alert_level);
        buf.put_u32(self.limit_level);
        buf.put_u32(self.disconnect_level);
        buf.put_u32(self.current_level);
        buf.put_u32(self.max_level);
        buf.put_u32(self.last_time);
        buf.put_u8(self.current_state);
    }
}

/// Rate group: a class id and the SNAC pairs it governs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateGroup {
    /// Rate class this group belongs to.
    pub id: u16,
    /// `(food group, subgroup)` pairs governed by the class.
    pub pairs: Vec<(u16, u16)>,
}

impl RateGroup {
    fn decode(buf: &mut Bytes) -> Result<Self> {
        let id = wire::read_u16(buf)?;
        let count = wire::read_u16(buf)?;
        let mut pairs = Vec::with_capacity(usize::from(count.min(256)));
        for _ in 0..count {
            pairs.push((wire::read_u16(buf)?, wire::read_u16(buf)?));
        }
        Ok(Self { id, pairs })
    }

    fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        let count = self.pairs.len();
        if count > usize::from(u16::MAX) {
            return Err(crate::errors::ProtocolError::ValueTooLong {
                len: count,
                max: usize::from(u16::MAX),
            });
        }
        buf.put_u16(self.id);
        buf.put_u16(count as u16);
        for (fg, sg) in &self.pairs {
            buf.put_u16(*fg);
            buf.put_u16(*sg);
        }
        Ok(())
    }
}

/// `RateParamsReply` (0x07): class table plus group membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateParamsReply {
    /// Advisory rate classes.
    pub classes: Vec<RateClass>,
    /// Group membership per class.
    pub groups: Vec<RateGroup>,
}

impl RateParamsReply {
    /// Decode the class table and trailing groups.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let count = wire::read_u16(buf)?;
        let mut classes = Vec::with_capacity(usize::from(count.min(16)));
        for _ in 0..count {
            classes.push(RateClass::decode(buf)?);
        }
        let mut groups = Vec::new();
        while !buf.is_empty() {
            groups.push(RateGroup::decode(buf)?);
        }
        Ok(Self { classes, groups })
    }

    /// Encode the class table and groups.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        let count = self.classes.len();
        if count > usize::from(u16::MAX) {
            return Err(crate::errors::ProtocolError::ValueTooLong {
                len: count,
                max: usize::from(u16::MAX),
            });
        }
        buf.put_u16(count as u16);
        for class in &self.classes {
            class.encode(buf);
        }
        for group in &self.groups {
            group.encode(buf)?;
        }
        Ok(())
    }
}

/// `RateParamsSubAdd` (0x08): class ids the client subscribes to. Accepted
/// and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateParamsSubAdd {
    /// Subscribed class ids.
    pub class_ids: Vec<u16>,
}

impl RateParamsSubAdd {
    /// Decode ids until the body is exhausted.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let mut class_ids = Vec::new();
        while !buf.is_empty() {
            class_ids.push(wire::read_u16(buf)?);
        }
        Ok(Self { class_ids })
    }

    /// Encode all ids.
    pub fn encode(&self, buf: &mut impl BufMut) {
        for id in &self.class_ids {
            buf.put_u16(*id);
        }
    }
}

/// `UserInfoUpdate` (0x0F): the requester's own user-info block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfoUpdate {
    /// Requester's current user info.
    pub user_info: TlvUserInfo,
}

impl UserInfoUpdate {
    /// Decode the embedded user-info record.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { user_info: TlvUserInfo::decode(buf)? })
    }

    /// Encode the embedded user-info record.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.user_info.encode(buf)
    }
}

/// `EvilNotification` (0x10): pushed to a user whose warning level rose.
///
/// The anonymous form omits the snitcher record entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvilNotification {
    /// New warning level after the increment.
    pub new_evil: u16,
    /// Who warned; absent for anonymous warnings.
    pub snitcher: Option<TlvUserInfo>,
}

impl EvilNotification {
    /// Decode the level and optional snitcher.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let new_evil = wire::read_u16(buf)?;
        let snitcher = if buf.is_empty() { None } else { Some(TlvUserInfo::decode(buf)?) };
        Ok(Self { new_evil, snitcher })
    }

    /// Encode the level and optional snitcher.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u16(self.new_evil);
        if let Some(snitcher) = &self.snitcher {
            snitcher.encode(buf)?;
        }
        Ok(())
    }
}

/// `IdleNotification` (0x11): zero seconds means active again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleNotification {
    /// Seconds the user has been idle; zero clears idle state.
    pub idle_seconds: u32,
}

impl IdleNotification {
    /// Decode the idle-seconds word.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { idle_seconds: wire::read_u32(buf)? })
    }

    /// Encode the idle-seconds word.
    pub fn encode(self, buf: &mut impl BufMut) {
        buf.put_u32(self.idle_seconds);
    }
}

/// `SetUserInfoFields` (0x1E): status TLV toggles visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetUserInfoFields {
    /// Update TLVs; [`tags::USER_STATUS`] is the one this server interprets.
    pub tlvs: TlvBlock,
}

impl SetUserInfoFields {
    /// Decode the TLV body.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Ok(Self { tlvs: TlvBlock::decode_rest(buf)? })
    }

    /// Encode the TLV body.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.tlvs.encode_rest(buf)
    }
}
