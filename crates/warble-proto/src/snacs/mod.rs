//! Typed SNAC bodies.
//!
//! The frame header's `(food group, subgroup)` pair identifies the body type,
//! so bodies carry no discriminator of their own. [`SnacBody`] covers every
//! message this server sends or receives; [`SnacBody::decode`] dispatches on
//! the header and [`SnacBody::ids`] recovers the pair for encoding.
//!
//! # Invariants
//!
//! Each variant maps to exactly one `(food group, subgroup)` pair, except the
//! shared [`SnacBody::Error`] which binds subgroup `0x01` in its carried food
//! group. Round-trip encoding must reproduce identical values; TLV order is
//! preserved throughout.

pub mod alert;
pub mod bucp;
pub mod buddy;
pub mod chat;
pub mod chat_nav;
pub mod feedbag;
pub mod icbm;
pub mod locate;
pub mod oservice;

use bytes::{BufMut, Bytes};

use crate::{
    errors::{ProtocolError, Result},
    snac::{ErrorCode, SnacFrame, foodgroup},
    wire,
};

/// Subgroup shared by every food group for error responses.
pub const SUB_ERR: u16 = 0x0001;

/// A decoded SNAC body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnacBody {
    /// Error response in any food group (subgroup 0x01).
    Error {
        /// Food group the error is reported under.
        food_group: u16,
        /// Protocol error code.
        code: ErrorCode,
    },

    // OService
    /// Client is ready for service.
    ClientOnline(oservice::ClientOnline),
    /// Food groups available on this connection.
    HostOnline(oservice::HostOnline),
    /// Redirect request.
    ServiceRequest(oservice::ServiceRequest),
    /// Redirect response.
    ServiceResponse(oservice::ServiceResponse),
    /// Rate parameter query.
    RateParamsQuery,
    /// Rate parameter reply.
    RateParamsReply(oservice::RateParamsReply),
    /// Rate class subscription.
    RateParamsSubAdd(oservice::RateParamsSubAdd),
    /// Own-info query.
    UserInfoQuery,
    /// Own-info reply.
    UserInfoUpdate(oservice::UserInfoUpdate),
    /// Warning level notification.
    EvilNotification(oservice::EvilNotification),
    /// Idle state report.
    IdleNotification(oservice::IdleNotification),
    /// Client food group versions.
    ClientVersions(oservice::Versions),
    /// Host food group versions.
    HostVersions(oservice::Versions),
    /// Status/visibility update.
    SetUserInfoFields(oservice::SetUserInfoFields),

    // Locate
    /// Locate rights query.
    LocateRightsQuery(locate::RightsQuery),
    /// Locate rights reply.
    LocateRightsReply(locate::RightsReply),
    /// Profile/away update.
    SetInfo(locate::SetInfo),
    /// User-info reply.
    UserInfoReply(locate::UserInfoReply),
    /// Directory update.
    SetDirInfo(locate::SetDirInfo),
    /// Directory update reply.
    SetDirReply(locate::ResultReply),
    /// Keyword update.
    SetKeywordInfo(locate::SetKeywordInfo),
    /// Keyword update reply.
    SetKeywordReply(locate::ResultReply),
    /// User-info query with section bitmask.
    UserInfoQuery2(locate::UserInfoQuery2),

    // Buddy
    /// Buddy rights query.
    BuddyRightsQuery(buddy::RightsQuery),
    /// Buddy rights reply.
    BuddyRightsReply(buddy::RightsReply),
    /// Buddy arrival notification.
    BuddyArrived(buddy::Arrived),
    /// Buddy departure notification.
    BuddyDeparted(buddy::Departed),

    // ICBM
    /// Client channel parameters.
    IcbmAddParameters(icbm::AddParameters),
    /// Messaging parameter query.
    IcbmParameterQuery,
    /// Messaging parameter reply.
    IcbmParameterReply(icbm::ParameterReply),
    /// Outbound instant message.
    ChannelMsgToHost(icbm::ChannelMsgToHost),
    /// Relayed instant message.
    ChannelMsgToClient(icbm::ChannelMsgToClient),
    /// Warning request.
    EvilRequest(icbm::EvilRequest),
    /// Warning reply.
    EvilReply(icbm::EvilReply),
    /// Delivery acknowledgement.
    HostAck(icbm::HostAck),
    /// Typing event.
    ClientEvent(icbm::ClientEvent),

    // ChatNav
    /// Chat rights query.
    RequestChatRights,
    /// Room info query.
    RequestRoomInfo(chat_nav::RequestRoomInfo),
    /// Room creation request.
    CreateRoom(chat_nav::CreateRoom),
    /// ChatNav reply.
    NavInfo(chat_nav::NavInfo),

    // Chat
    /// Room metadata update.
    ChatRoomInfoUpdate(chat::RoomInfoUpdate),
    /// Participants joined.
    ChatUsersJoined(chat::UsersJoined),
    /// Participants left.
    ChatUsersLeft(chat::UsersLeft),
    /// Outbound room message.
    ChatChannelMsgToHost(chat::ChannelMsgToHost),
    /// Broadcast room message.
    ChatChannelMsgToClient(chat::ChannelMsgToClient),

    // Feedbag
    /// Feedbag rights query.
    FeedbagRightsQuery(feedbag::RightsQuery),
    /// Feedbag rights reply.
    FeedbagRightsReply(feedbag::RightsReply),
    /// Full list query.
    FeedbagQuery,
    /// Conditional list query.
    FeedbagQueryIfModified(feedbag::QueryIfModified),
    /// Full list reply.
    FeedbagReply(feedbag::Reply),
    /// List activation.
    FeedbagUse,
    /// Insert items.
    FeedbagInsertItem(feedbag::ItemBatch),
    /// Update items.
    FeedbagUpdateItem(feedbag::ItemBatch),
    /// Delete items.
    FeedbagDeleteItem(feedbag::ItemBatch),
    /// Per-item mutation results.
    FeedbagStatus(feedbag::Status),
    /// List unchanged since the client's timestamp.
    FeedbagReplyNotModified(feedbag::ReplyNotModified),
    /// Begin batched edit.
    FeedbagStartCluster(feedbag::StartCluster),
    /// End batched edit.
    FeedbagEndCluster,

    // BUCP
    /// Login challenge request.
    BucpChallengeRequest(bucp::ChallengeRequest),
    /// Login challenge response.
    BucpChallengeResponse(bucp::ChallengeResponse),
    /// Login request.
    BucpLoginRequest(bucp::LoginRequest),
    /// Login response.
    BucpLoginResponse(bucp::LoginResponse),

    // Alert
    /// Alert capability notification.
    AlertNotifyCapabilities(alert::Notify),
    /// Alert display capability notification.
    AlertNotifyDisplayCapabilities(alert::Notify),
}

impl SnacBody {
    /// `(food group, subgroup)` pair identifying this body on the wire.
    #[must_use]
    pub fn ids(&self) -> (u16, u16) {
        match self {
            Self::Error { food_group, .. } => (*food_group, SUB_ERR),

            Self::ClientOnline(_) => (foodgroup::OSERVICE, oservice::sub::CLIENT_ONLINE),
            Self::HostOnline(_) => (foodgroup::OSERVICE, oservice::sub::HOST_ONLINE),
            Self::ServiceRequest(_) => (foodgroup::OSERVICE, oservice::sub::SERVICE_REQUEST),
            Self::ServiceResponse(_) => (foodgroup::OSERVICE, oservice::sub::SERVICE_RESPONSE),
            Self::RateParamsQuery => (foodgroup::OSERVICE, oservice::sub::RATE_PARAMS_QUERY),
            Self::RateParamsReply(_) => (foodgroup::OSERVICE, oservice::sub::RATE_PARAMS_REPLY),
            Self::RateParamsSubAdd(_) => {
                (foodgroup::OSERVICE, oservice::sub::RATE_PARAMS_SUB_ADD)
            },
            Self::UserInfoQuery => (foodgroup::OSERVICE, oservice::sub::USER_INFO_QUERY),
            Self::UserInfoUpdate(_) => (foodgroup::OSERVICE, oservice::sub::USER_INFO_UPDATE),
            Self::EvilNotification(_) => {
                (foodgroup::OSERVICE, oservice::sub::EVIL_NOTIFICATION)
            },
            Self::IdleNotification(_) => {
                (foodgroup::OSERVICE, oservice::sub::IDLE_NOTIFICATION)
            },
            Self::ClientVersions(_) => (foodgroup::OSERVICE, oservice::sub::CLIENT_VERSIONS),
            Self::HostVersions(_) => (foodgroup::OSERVICE, oservice::sub::HOST_VERSIONS),
            Self::SetUserInfoFields(_) => {
                (foodgroup::OSERVICE, oservice::sub::SET_USER_INFO_FIELDS)
            },

            Self::LocateRightsQuery(_) => (foodgroup::LOCATE, locate::sub::RIGHTS_QUERY),
            Self::LocateRightsReply(_) => (foodgroup::LOCATE, locate::sub::RIGHTS_REPLY),
            Self::SetInfo(_) => (foodgroup::LOCATE, locate::sub::SET_INFO),
            Self::UserInfoReply(_) => (foodgroup::LOCATE, locate::sub::USER_INFO_REPLY),
            Self::SetDirInfo(_) => (foodgroup::LOCATE, locate::sub::SET_DIR_INFO),
            Self::SetDirReply(_) => (foodgroup::LOCATE, locate::sub::SET_DIR_REPLY),
            Self::SetKeywordInfo(_) => (foodgroup::LOCATE, locate::sub::SET_KEYWORD_INFO),
            Self::SetKeywordReply(_) => (foodgroup::LOCATE, locate::sub::SET_KEYWORD_REPLY),
            Self::UserInfoQuery2(_) => (foodgroup::LOCATE, locate::sub::USER_INFO_QUERY2),

            Self::BuddyRightsQuery(_) => (foodgroup::BUDDY, buddy::sub::RIGHTS_QUERY),
            Self::BuddyRightsReply(_) => (foodgroup::BUDDY, buddy::sub::RIGHTS_REPLY),
            Self::BuddyArrived(_) => (foodgroup::BUDDY, buddy::sub::ARRIVED),
            Self::BuddyDeparted(_) => (foodgroup::BUDDY, buddy::sub::DEPARTED),

            Self::IcbmAddParameters(_) => (foodgroup::ICBM, icbm::sub::ADD_PARAMETERS),
            Self::IcbmParameterQuery => (foodgroup::ICBM, icbm::sub::PARAMETER_QUERY),
            Self::IcbmParameterReply(_) => (foodgroup::ICBM, icbm::sub::PARAMETER_REPLY),
            Self::ChannelMsgToHost(_) => (foodgroup::ICBM, icbm::sub::CHANNEL_MSG_TO_HOST),
            Self::ChannelMsgToClient(_) => {
                (foodgroup::ICBM, icbm::sub::CHANNEL_MSG_TO_CLIENT)
            },
            Self::EvilRequest(_) => (foodgroup::ICBM, icbm::sub::EVIL_REQUEST),
            Self::EvilReply(_) => (foodgroup::ICBM, icbm::sub::EVIL_REPLY),
            Self::HostAck(_) => (foodgroup::ICBM, icbm::sub::HOST_ACK),
            Self::ClientEvent(_) => (foodgroup::ICBM, icbm::sub::CLIENT_EVENT),

            Self::RequestChatRights => {
                (foodgroup::CHAT_NAV, chat_nav::sub::REQUEST_CHAT_RIGHTS)
            },
            Self::RequestRoomInfo(_) => (foodgroup::CHAT_NAV, chat_nav::sub::REQUEST_ROOM_INFO),
            Self::CreateRoom(_) => (foodgroup::CHAT_NAV, chat_nav::sub::CREATE_ROOM),
            Self::NavInfo(_) => (foodgroup::CHAT_NAV, chat_nav::sub::NAV_INFO),

            Self::ChatRoomInfoUpdate(_) => (foodgroup::CHAT, chat::sub::ROOM_INFO_UPDATE),
            Self::ChatUsersJoined(_) => (foodgroup::CHAT, chat::sub::USERS_JOINED),
            Self::ChatUsersLeft(_) => (foodgroup::CHAT, chat::sub::USERS_LEFT),
            Self::ChatChannelMsgToHost(_) => (foodgroup::CHAT, chat::sub::CHANNEL_MSG_TO_HOST),
            Self::ChatChannelMsgToClient(_) => {
                (foodgroup::CHAT, chat::sub::CHANNEL_MSG_TO_CLIENT)
            },

            Self::FeedbagRightsQuery(_) => (foodgroup::FEEDBAG, feedbag::sub::RIGHTS_QUERY),
            Self::FeedbagRightsReply(_) => (foodgroup::FEEDBAG, feedbag::sub::RIGHTS_REPLY),
            Self::FeedbagQuery => (foodgroup::FEEDBAG, feedbag::sub::QUERY),
            Self::FeedbagQueryIfModified(_) => {
                (foodgroup::FEEDBAG, feedbag::sub::QUERY_IF_MODIFIED)
            },
            Self::FeedbagReply(_) => (foodgroup::FEEDBAG, feedbag::sub::REPLY),
            Self::FeedbagUse => (foodgroup::FEEDBAG, feedbag::sub::USE),
            Self::FeedbagInsertItem(_) => (foodgroup::FEEDBAG, feedbag::sub::INSERT_ITEM),
            Self::FeedbagUpdateItem(_) => (foodgroup::FEEDBAG, feedbag::sub::UPDATE_ITEM),
            Self::FeedbagDeleteItem(_) => (foodgroup::FEEDBAG, feedbag::sub::DELETE_ITEM),
            Self::FeedbagStatus(_) => (foodgroup::FEEDBAG, feedbag::sub::STATUS),
            Self::FeedbagReplyNotModified(_) => {
                (foodgroup::FEEDBAG, feedbag::sub::REPLY_NOT_MODIFIED)
            },
            Self::FeedbagStartCluster(_) => (foodgroup::FEEDBAG, feedbag::sub::START_CLUSTER),
            Self::FeedbagEndCluster => (foodgroup::FEEDBAG, feedbag::sub::END_CLUSTER),

            Self::BucpChallengeRequest(_) => (foodgroup::BUCP, bucp::sub::CHALLENGE_REQUEST),
            Self::BucpChallengeResponse(_) => (foodgroup::BUCP, bucp::sub::CHALLENGE_RESPONSE),
            Self::BucpLoginRequest(_) => (foodgroup::BUCP, bucp::sub::LOGIN_REQUEST),
            Self::BucpLoginResponse(_) => (foodgroup::BUCP, bucp::sub::LOGIN_RESPONSE),

            Self::AlertNotifyCapabilities(_) => {
                (foodgroup::ALERT, alert::sub::NOTIFY_CAPABILITIES)
            },
            Self::AlertNotifyDisplayCapabilities(_) => {
                (foodgroup::ALERT, alert::sub::NOTIFY_DISPLAY_CAPABILITIES)
            },
        }
    }

    /// Decode a body selected by the frame's `(food group, subgroup)`.
    ///
    /// Unknown pairs produce [`ProtocolError::UnsupportedSnac`]; the
    /// dispatcher maps that to an error SNAC in the request's food group.
    pub fn decode(frame: SnacFrame, buf: &mut Bytes) -> Result<Self> {
        let pair = (frame.food_group, frame.subgroup);
        match pair {
            (fg, SUB_ERR) => {
                let code = ErrorCode::from_u16(wire::read_u16(buf)?);
                Ok(Self::Error { food_group: fg, code })
            },

            (foodgroup::OSERVICE, oservice::sub::CLIENT_ONLINE) => {
                Ok(Self::ClientOnline(oservice::ClientOnline::decode(buf)?))
            },
            (foodgroup::OSERVICE, oservice::sub::HOST_ONLINE) => {
                Ok(Self::HostOnline(oservice::HostOnline::decode(buf)?))
            },
            (foodgroup::OSERVICE, oservice::sub::SERVICE_REQUEST) => {
                Ok(Self::ServiceRequest(oservice::ServiceRequest::decode(buf)?))
            },
            (foodgroup::OSERVICE, oservice::sub::SERVICE_RESPONSE) => {
                Ok(Self::ServiceResponse(oservice::ServiceResponse::decode(buf)?))
            },
            (foodgroup::OSERVICE, oservice::sub::RATE_PARAMS_QUERY) => Ok(Self::RateParamsQuery),
            (foodgroup::OSERVICE, oservice::sub::RATE_PARAMS_REPLY) => {
                Ok(Self::RateParamsReply(oservice::RateParamsReply::decode(buf)?))
            },
            (foodgroup::OSERVICE, oservice::sub::RATE_PARAMS_SUB_ADD) => {
                Ok(Self::RateParamsSubAdd(oservice::RateParamsSubAdd::decode(buf)?))
            },
            (foodgroup::OSERVICE, oservice::sub::USER_INFO_QUERY) => Ok(Self::UserInfoQuery),
            (foodgroup::OSERVICE, oservice::sub::USER_INFO_UPDATE) => {
                Ok(Self::UserInfoUpdate(oservice::UserInfoUpdate::decode(buf)?))
            },
            (foodgroup::OSERVICE, oservice::sub::EVIL_NOTIFICATION) => {
                Ok(Self::EvilNotification(oservice::EvilNotification::decode(buf)?))
            },
            (foodgroup::OSERVICE, oservice::sub::IDLE_NOTIFICATION) => {
                Ok(Self::IdleNotification(oservice::IdleNotification::decode(buf)?))
            },
            (foodgroup::OSERVICE, oservice::sub::CLIENT_VERSIONS) => {
                Ok(Self::ClientVersions(oservice::Versions::decode(buf)?))
            },
            (foodgroup::OSERVICE, oservice::sub::HOST_VERSIONS) => {
                Ok(Self::HostVersions(oservice::Versions::decode(buf)?))
            },
            (foodgroup::OSERVICE, oservice::sub::SET_USER_INFO_FIELDS) => {
                Ok(Self::SetUserInfoFields(oservice::SetUserInfoFields::decode(buf)?))
            },

            (foodgroup::LOCATE, locate::sub::RIGHTS_QUERY) => {
                Ok(Self::LocateRightsQuery(locate::RightsQuery::decode(buf)?))
            },
            (foodgroup::LOCATE, locate::sub::RIGHTS_REPLY) => {
                Ok(Self::LocateRightsReply(locate::RightsReply::decode(buf)?))
            },
            (foodgroup::LOCATE, locate::sub::SET_INFO) => {
                Ok(Self::SetInfo(locate::SetInfo::decode(buf)?))
            },
            (foodgroup::LOCATE, locate::sub::USER_INFO_REPLY) => {
                Ok(Self::UserInfoReply(locate::UserInfoReply::decode(buf)?))
            },
            (foodgroup::LOCATE, locate::sub::SET_DIR_INFO) => {
                Ok(Self::SetDirInfo(locate::SetDirInfo::decode(buf)?))
            },
            (foodgroup::LOCATE, locate::sub::SET_DIR_REPLY) => {
                Ok(Self::SetDirReply(locate::ResultReply::decode(buf)?))
            },
            (foodgroup::LOCATE, locate::sub::SET_KEYWORD_INFO) => {
                Ok(Self::SetKeywordInfo(locate::SetKeywordInfo::decode(buf)?))
            },
            (foodgroup::LOCATE, locate::sub::SET_KEYWORD_REPLY) => {
                Ok(Self::SetKeywordReply(locate::ResultReply::decode(buf)?))
            },
            (foodgroup::LOCATE, locate::sub::USER_INFO_QUERY2) => {
                Ok(Self::UserInfoQuery2(locate::UserInfoQuery2::decode(buf)?))
            },

            (foodgroup::BUDDY, buddy::sub::RIGHTS_QUERY) => {
                Ok(Self::BuddyRightsQuery(buddy::RightsQuery::decode(buf)?))
            },
            (foodgroup::BUDDY, buddy::sub::RIGHTS_REPLY) => {
                Ok(Self::BuddyRightsReply(buddy::RightsReply::decode(buf)?))
            },
            (foodgroup::BUDDY, buddy::sub::ARRIVED) => {
                Ok(Self::BuddyArrived(buddy::Arrived::decode(buf)?))
            },
            (foodgroup::BUDDY, buddy::sub::DEPARTED) => {
                Ok(Self::BuddyDeparted(buddy::Departed::decode(buf)?))
            },

            (foodgroup::ICBM, icbm::sub::ADD_PARAMETERS) => {
                Ok(Self::IcbmAddParameters(icbm::AddParameters::decode(buf)?))
            },
            (foodgroup::ICBM, icbm::sub::PARAMETER_QUERY) => Ok(Self::IcbmParameterQuery),
            (foodgroup::ICBM, icbm::sub::PARAMETER_REPLY) => {
                Ok(Self::IcbmParameterReply(icbm::ParameterReply::decode(buf)?))
            },
            (foodgroup::ICBM, icbm::sub::CHANNEL_MSG_TO_HOST) => {
                Ok(Self::ChannelMsgToHost(icbm::ChannelMsgToHost::decode(buf)?))
            },
            (foodgroup::ICBM, icbm::sub::CHANNEL_MSG_TO_CLIENT) => {
                Ok(Self::ChannelMsgToClient(icbm::ChannelMsgToClient::decode(buf)?))
            },
            (foodgroup::ICBM, icbm::sub::EVIL_REQUEST) => {
                Ok(Self::EvilRequest(icbm::EvilRequest::decode(buf)?))
            },
            (foodgroup::ICBM, icbm::sub::EVIL_REPLY) => {
                Ok(Self::EvilReply(icbm::EvilReply::decode(buf)?))
            },
            (foodgroup::ICBM, icbm::sub::HOST_ACK) => {
                Ok(Self::HostAck(icbm::HostAck::decode(buf)?))
            },
            (foodgroup::ICBM, icbm::sub::CLIENT_EVENT) => {
                Ok(Self::ClientEvent(icbm::ClientEvent::decode(buf)?))
            },

            (foodgroup::CHAT_NAV, chat_nav::sub::REQUEST_CHAT_RIGHTS) => {
                Ok(Self::RequestChatRights)
            },
            (foodgroup::CHAT_NAV, chat_nav::sub::REQUEST_ROOM_INFO) => {
                Ok(Self::RequestRoomInfo(chat_nav::RequestRoomInfo::decode(buf)?))
            },
            (foodgroup::CHAT_NAV, chat_nav::sub::CREATE_ROOM) => {
                Ok(Self::CreateRoom(chat_nav::CreateRoom::decode(buf)?))
            },
            (foodgroup::CHAT_NAV, chat_nav::sub::NAV_INFO) => {
                Ok(Self::NavInfo(chat_nav::NavInfo::decode(buf)?))
            },

            (foodgroup::CHAT, chat::sub::ROOM_INFO_UPDATE) => {
                Ok(Self::ChatRoomInfoUpdate(chat::RoomInfoUpdate::decode(buf)?))
            },
            (foodgroup::CHAT, chat::sub::USERS_JOINED) => {
                Ok(Self::ChatUsersJoined(chat::UsersJoined::decode(buf)?))
            },
            (foodgroup::CHAT, chat::sub::USERS_LEFT) => {
                Ok(Self::ChatUsersLeft(chat::UsersLeft::decode(buf)?))
            },
            (foodgroup::CHAT, chat::sub::CHANNEL_MSG_TO_HOST) => {
                Ok(Self::ChatChannelMsgToHost(chat::ChannelMsgToHost::decode(buf)?))
            },
            (foodgroup::CHAT, chat::sub::CHANNEL_MSG_TO_CLIENT) => {
                Ok(Self::ChatChannelMsgToClient(chat::ChannelMsgToClient::decode(buf)?))
            },

            (foodgroup::FEEDBAG, feedbag::sub::RIGHTS_QUERY) => {
                Ok(Self::FeedbagRightsQuery(feedbag::RightsQuery::decode(buf)?))
            },
            (foodgroup::FEEDBAG, feedbag::sub::RIGHTS_REPLY) => {
                Ok(Self::FeedbagRightsReply(feedbag::RightsReply::decode(buf)?))
            },
            (foodgroup::FEEDBAG, feedbag::sub::QUERY) => Ok(Self::FeedbagQuery),
            (foodgroup::FEEDBAG, feedbag::sub::QUERY_IF_MODIFIED) => {
                Ok(Self::FeedbagQueryIfModified(feedbag::QueryIfModified::decode(buf)?))
            },
            (foodgroup::FEEDBAG, feedbag::sub::REPLY) => {
                Ok(Self::FeedbagReply(feedbag::Reply::decode(buf)?))
            },
            (foodgroup::FEEDBAG, feedbag::sub::USE) => Ok(Self::FeedbagUse),
            (foodgroup::FEEDBAG, feedbag::sub::INSERT_ITEM) => {
                Ok(Self::FeedbagInsertItem(feedbag::ItemBatch::decode(buf)?))
            },
            (foodgroup::FEEDBAG, feedbag::sub::UPDATE_ITEM) => {
                Ok(Self::FeedbagUpdateItem(feedbag::ItemBatch::decode(buf)?))
            },
            (foodgroup::FEEDBAG, feedbag::sub::DELETE_ITEM) => {
                Ok(Self::FeedbagDeleteItem(feedbag::ItemBatch::decode(buf)?))
            },
            (foodgroup::FEEDBAG, feedbag::sub::STATUS) => {
                Ok(Self::FeedbagStatus(feedbag::Status::decode(buf)?))
            },
            (foodgroup::FEEDBAG, feedbag::sub::REPLY_NOT_MODIFIED) => {
                Ok(Self::FeedbagReplyNotModified(feedbag::ReplyNotModified::decode(buf)?))
            },
            (foodgroup::FEEDBAG, feedbag::sub::START_CLUSTER) => {
                Ok(Self::FeedbagStartCluster(feedbag::StartCluster::decode(buf)?))
            },
            (foodgroup::FEEDBAG, feedbag::sub::END_CLUSTER) => Ok(Self::FeedbagEndCluster),

            (foodgroup::BUCP, bucp::sub::CHALLENGE_REQUEST) => {
                Ok(Self::BucpChallengeRequest(bucp::ChallengeRequest::decode(buf)?))
            },
            (foodgroup::BUCP, bucp::sub::CHALLENGE_RESPONSE) => {
                Ok(Self::BucpChallengeResponse(bucp::ChallengeResponse::decode(buf)?))
            },
            (foodgroup::BUCP, bucp::sub::LOGIN_REQUEST) => {
                Ok(Self::BucpLoginRequest(bucp::LoginRequest::decode(buf)?))
            },
            (foodgroup::BUCP, bucp::sub::LOGIN_RESPONSE) => {
                Ok(Self::BucpLoginResponse(bucp::LoginResponse::decode(buf)?))
            },

            (foodgroup::ALERT, alert::sub::NOTIFY_CAPABILITIES) => {
                Ok(Self::AlertNotifyCapabilities(alert::Notify::decode(buf)?))
            },
            (foodgroup::ALERT, alert::sub::NOTIFY_DISPLAY_CAPABILITIES) => {
                Ok(Self::AlertNotifyDisplayCapabilities(alert::Notify::decode(buf)?))
            },

            (food_group, subgroup) => Err(ProtocolError::UnsupportedSnac { food_group, subgroup }),
        }
    }

    /// Encode the body (header excluded) onto the buffer.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        match self {
            Self::Error { code, .. } => {
                buf.put_u16(*code as u16);
                Ok(())
            },

            Self::ClientOnline(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::HostOnline(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::ServiceRequest(b) => b.encode(buf),
            Self::ServiceResponse(b) => b.encode(buf),
            Self::RateParamsQuery | Self::UserInfoQuery => Ok(()),
            Self::RateParamsReply(b) => b.encode(buf),
            Self::RateParamsSubAdd(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::UserInfoUpdate(b) => b.encode(buf),
            Self::EvilNotification(b) => b.encode(buf),
            Self::IdleNotification(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::ClientVersions(b) | Self::HostVersions(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::SetUserInfoFields(b) => b.encode(buf),

            Self::LocateRightsQuery(b) => b.encode(buf),
            Self::LocateRightsReply(b) => b.encode(buf),
            Self::SetInfo(b) => b.encode(buf),
            Self::UserInfoReply(b) => b.encode(buf),
            Self::SetDirInfo(b) => b.encode(buf),
            Self::SetDirReply(b) | Self::SetKeywordReply(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::SetKeywordInfo(b) => b.encode(buf),
            Self::UserInfoQuery2(b) => b.encode(buf),

            Self::BuddyRightsQuery(b) => b.encode(buf),
            Self::BuddyRightsReply(b) => b.encode(buf),
            Self::BuddyArrived(b) => b.encode(buf),
            Self::BuddyDeparted(b) => b.encode(buf),

            Self::IcbmParameterQuery => Ok(()),
            Self::IcbmAddParameters(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::IcbmParameterReply(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::ChannelMsgToHost(b) => b.encode(buf),
            Self::ChannelMsgToClient(b) => b.encode(buf),
            Self::EvilRequest(b) => b.encode(buf),
            Self::EvilReply(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::HostAck(b) => b.encode(buf),
            Self::ClientEvent(b) => b.encode(buf),

            Self::RequestChatRights => Ok(()),
            Self::RequestRoomInfo(b) => b.encode(buf),
            Self::CreateRoom(b) => b.encode(buf),
            Self::NavInfo(b) => b.encode(buf),

            Self::ChatRoomInfoUpdate(b) => b.encode(buf),
            Self::ChatUsersJoined(b) => b.encode(buf),
            Self::ChatUsersLeft(b) => b.encode(buf),
            Self::ChatChannelMsgToHost(b) => b.encode(buf),
            Self::ChatChannelMsgToClient(b) => b.encode(buf),

            Self::FeedbagRightsQuery(b) => b.encode(buf),
            Self::FeedbagRightsReply(b) => b.encode(buf),
            Self::FeedbagQuery | Self::FeedbagUse | Self::FeedbagEndCluster => Ok(()),
            Self::FeedbagQueryIfModified(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::FeedbagReply(b) => b.encode(buf),
            Self::FeedbagInsertItem(b) | Self::FeedbagUpdateItem(b)
            | Self::FeedbagDeleteItem(b) => b.encode(buf),
            Self::FeedbagStatus(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::FeedbagReplyNotModified(b) => {
                b.encode(buf);
                Ok(())
            },
            Self::FeedbagStartCluster(b) => b.encode(buf),

            Self::BucpChallengeRequest(b) => b.encode(buf),
            Self::BucpChallengeResponse(b) => b.encode(buf),
            Self::BucpLoginRequest(b) => b.encode(buf),
            Self::BucpLoginResponse(b) => b.encode(buf),

            Self::AlertNotifyCapabilities(b) | Self::AlertNotifyDisplayCapabilities(b) => {
                b.encode(buf)
            },
        }
    }
}

/// A SNAC ready to travel: header flags, request id, and a typed body.
///
/// The `(food group, subgroup)` header fields come from the body itself, so a
/// message can never carry a mismatched header/body pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnacMessage {
    /// Header flags; zero on everything this server emits.
    pub flags: u16,
    /// Request id echoed from the triggering request; zero for server pushes.
    pub request_id: u32,
    /// Typed body.
    pub body: SnacBody,
}

impl SnacMessage {
    /// Response correlated to a client request.
    #[must_use]
    pub fn reply(request_id: u32, body: SnacBody) -> Self {
        Self { flags: 0, request_id, body }
    }

    /// Server-initiated push with a zero request id.
    #[must_use]
    pub fn push(body: SnacBody) -> Self {
        Self { flags: 0, request_id: 0, body }
    }

    /// Frame header for this message.
    #[must_use]
    pub fn frame(&self) -> SnacFrame {
        let (food_group, subgroup) = self.body.ids();
        SnacFrame { food_group, subgroup, flags: self.flags, request_id: self.request_id }
    }

    /// Encode header and body onto the buffer.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        self.frame().encode(buf);
        self.body.encode(buf)
    }

    /// Decode a full SNAC (header and body) from a Data FLAP payload.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let frame = SnacFrame::decode(buf)?;
        let body = SnacBody::decode(frame, buf)?;
        Ok(Self { flags: frame.flags, request_id: frame.request_id, body })
    }
}
