//! OService handlers: connection-wide concerns on both endpoints.

use std::sync::Arc;

use warble_core::{
    ChatRegistry, ChatRoom, Environment, FeedbagStore, Session, SessionRegistry,
};
use warble_proto::{
    ErrorCode, SnacBody, SnacMessage, Tlv, TlvBlock, foodgroup,
    snacs::{
        chat::{RoomInfoUpdate, UsersJoined},
        oservice::{
            self, ChatServiceTarget, EvilNotification, HostOnline, IdleNotification,
            RateClass, RateGroup, RateParamsReply, ServiceRequest, ServiceResponse,
            SetUserInfoFields, UserInfoUpdate, Versions,
        },
    },
    user_info::status,
};

use crate::{config::Config, error::ServerError, presence::PresenceNotifier};

/// Food groups announced by the main service.
pub const BOS_FOOD_GROUPS: [u16; 7] = [
    foodgroup::OSERVICE,
    foodgroup::LOCATE,
    foodgroup::BUDDY,
    foodgroup::ICBM,
    foodgroup::CHAT_NAV,
    foodgroup::FEEDBAG,
    foodgroup::ALERT,
];

/// Food groups announced by the chat service.
pub const CHAT_FOOD_GROUPS: [u16; 2] = [foodgroup::OSERVICE, foodgroup::CHAT];

/// `HostOnline` push for a fresh connection.
#[must_use]
pub fn host_online(food_groups: &[u16]) -> SnacMessage {
    SnacMessage::push(SnacBody::HostOnline(HostOnline { food_groups: food_groups.to_vec() }))
}

/// OService handlers shared by the main and chat endpoints, plus the
/// main-only redirect and signon flows.
pub struct OService<E, F> {
    env: E,
    registry: Arc<SessionRegistry>,
    chat_registry: Arc<ChatRegistry>,
    presence: Arc<PresenceNotifier<F>>,
    feedbag: Arc<F>,
    config: Config,
}

impl<E: Environment, F: FeedbagStore> OService<E, F> {
    /// Service over the main registry, chat registry, and presence engine.
    pub fn new(
        env: E,
        registry: Arc<SessionRegistry>,
        chat_registry: Arc<ChatRegistry>,
        presence: Arc<PresenceNotifier<F>>,
        feedbag: Arc<F>,
        config: Config,
    ) -> Self {
        Self { env, registry, chat_registry, presence, feedbag, config }
    }

    /// `ClientVersions`: echo the list back as `HostVersions`. No
    /// negotiation; any version the client claims is accepted.
    #[must_use]
    pub fn client_versions(&self, request_id: u32, versions: &Versions) -> SnacMessage {
        SnacMessage::reply(request_id, SnacBody::HostVersions(versions.clone()))
    }

    /// `RateParamsQuery`: one advisory class covering every routed pair.
    /// Thresholds are informational; nothing is enforced.
    #[must_use]
    pub fn rate_params_query(&self, request_id: u32) -> SnacMessage {
        let class = RateClass {
            id: 1,
            window_size: 80,
            clear_level: 2500,
            alert_level: 2000,
            limit_level: 1500,
            disconnect_level: 800,
            current_level: 2500,
            max_level: 6000,
            last_time: 0,
            current_state: 0,
        };
        let pairs = rate_limited_pairs();
        let reply = RateParamsReply { classes: vec![class], groups: vec![RateGroup {
            id: 1,
            pairs,
        }] };
        SnacMessage::reply(request_id, SnacBody::RateParamsReply(reply))
    }

    /// `UserInfoQuery`: the requester's own info block.
    #[must_use]
    pub fn user_info_query(&self, session: &Session, request_id: u32) -> SnacMessage {
        let info = session.user_info(self.env.wall_clock_secs());
        SnacMessage::reply(request_id, SnacBody::UserInfoUpdate(UserInfoUpdate { user_info: info }))
    }

    /// `SetUserInfoFields`: interpret the status TLV, fanning out an arrival
    /// or departure when visibility flips. Malformed or absent status TLVs
    /// are tolerated silently.
    pub async fn set_user_info_fields(
        &self,
        session: &Session,
        body: &SetUserInfoFields,
    ) -> Result<(), ServerError> {
        let Some(Ok(raw_status)) = body.tlvs.u32(oservice::tags::USER_STATUS) else {
            return Ok(());
        };

        let invisible = raw_status & status::INVISIBLE != 0;
        let was_invisible = session.set_invisible(invisible);
        if invisible == was_invisible {
            return Ok(());
        }

        if invisible {
            self.presence.broadcast_departure(session).await?;
        } else {
            self.presence.broadcast_arrival(session, self.env.wall_clock_secs()).await?;
        }
        Ok(())
    }

    /// `IdleNotification`: zero seconds clears idle state. Either way the
    /// new idle time fans out so buddies observe it.
    pub async fn idle_notification(
        &self,
        session: &Session,
        body: IdleNotification,
    ) -> Result<(), ServerError> {
        let now = self.env.wall_clock_secs();
        if body.idle_seconds == 0 {
            session.set_active();
        } else {
            session.set_idle(u64::from(body.idle_seconds), now);
        }
        self.presence.broadcast_arrival(session, now).await?;
        Ok(())
    }

    /// `ServiceRequest` (main only): redirect the client to the chat service.
    ///
    /// Pre-binds the requester into the room's registry so the chat signon
    /// can find it, and issues a [`warble_proto::ChatCookie`] for the
    /// reconnect.
    pub async fn service_request(
        &self,
        session: &Arc<Session>,
        request_id: u32,
        request: &ServiceRequest,
    ) -> Result<SnacMessage, ServerError> {
        if request.food_group != foodgroup::CHAT {
            return Ok(snac_error(request_id, ErrorCode::ServiceUnavailable));
        }

        let Some(room_tlv) = request.tlvs.bytes(oservice::tags::ROOM) else {
            return Ok(snac_error(request_id, ErrorCode::NotSupportedByHost));
        };
        let mut room_buf = room_tlv;
        let target = ChatServiceTarget::decode(&mut room_buf)?;

        let Ok((room, participants)) = self.chat_registry.retrieve(&target.cookie) else {
            tracing::debug!(cookie = %target.cookie, "service request for unknown room");
            return Ok(snac_error(request_id, ErrorCode::NotSupportedByHost));
        };

        // Pre-bind a chat session under the same id; the chat connection
        // attaches to it at signon.
        let now = self.env.wall_clock_secs();
        let chat_session = participants.add(session.id(), session.screen_name().clone(), now);
        chat_session.set_chat_room_cookie(&room.cookie);

        let cookie =
            warble_proto::ChatCookie::new(&room.cookie, session.id()).to_bytes()?;
        let tlvs = TlvBlock::from_tlvs(vec![
            Tlv::string(oservice::tags::RECONNECT_HERE, self.config.chat_address()),
            Tlv::new(oservice::tags::LOGIN_COOKIE, cookie),
            Tlv::u16(oservice::tags::GROUP_ID, foodgroup::CHAT),
            Tlv::empty(oservice::tags::SSL_CERT_NAME),
            Tlv::empty(oservice::tags::SSL_STATE),
        ]);
        Ok(SnacMessage::reply(
            request_id,
            SnacBody::ServiceResponse(ServiceResponse { tlvs }),
        ))
    }

    /// `ClientOnline` on the main service: the user is fully signed on.
    ///
    /// Fans out the arrival, then sends the signing-on client one arrival per
    /// online, visible buddy so its list populates.
    pub async fn client_online_bos(&self, session: &Arc<Session>) -> Result<(), ServerError> {
        let now = self.env.wall_clock_secs();
        self.presence.broadcast_arrival(session, now).await?;

        for buddy in self.feedbag.buddies(session.ident()).await? {
            if let Some(buddy_session) = self.registry.retrieve_by_screen_name(&buddy) {
                if !buddy_session.invisible() {
                    self.presence.unicast_arrival(&buddy_session, session, now);
                }
            }
        }
        Ok(())
    }

    /// `ClientOnline` on the chat service: the user entered its room.
    ///
    /// Everyone else learns of the arrival; the arrival gets the room info
    /// and the full participant list.
    pub fn client_online_chat(
        &self,
        session: &Arc<Session>,
        room: &ChatRoom,
        participants: &SessionRegistry,
    ) -> Vec<SnacMessage> {
        let now = self.env.wall_clock_secs();

        participants.relay_to_all_except(
            session,
            &SnacMessage::push(SnacBody::ChatUsersJoined(UsersJoined {
                users: vec![session.user_info(now)],
            })),
        );

        let roster: Vec<_> =
            participants.all_sessions().iter().map(|s| s.user_info(now)).collect();
        vec![
            SnacMessage::push(SnacBody::ChatRoomInfoUpdate(RoomInfoUpdate {
                room: room.descriptor(),
            })),
            SnacMessage::push(SnacBody::ChatUsersJoined(UsersJoined { users: roster })),
        ]
    }

}

/// Evil-notification push for a freshly warned user. Anonymous warnings pass
/// `None` for the snitcher.
#[must_use]
pub fn evil_notification(
    new_evil: u16,
    snitcher: Option<warble_proto::TlvUserInfo>,
) -> SnacMessage {
    SnacMessage::push(SnacBody::EvilNotification(EvilNotification { new_evil, snitcher }))
}

/// `(food group, subgroup)` pairs listed in the advisory rate group.
fn rate_limited_pairs() -> Vec<(u16, u16)> {
    use warble_proto::snacs::{buddy, chat, chat_nav, feedbag, icbm, locate, oservice as os};

    vec![
        (foodgroup::OSERVICE, os::sub::CLIENT_VERSIONS),
        (foodgroup::OSERVICE, os::sub::RATE_PARAMS_QUERY),
        (foodgroup::OSERVICE, os::sub::USER_INFO_QUERY),
        (foodgroup::OSERVICE, os::sub::IDLE_NOTIFICATION),
        (foodgroup::OSERVICE, os::sub::SERVICE_REQUEST),
        (foodgroup::LOCATE, locate::sub::RIGHTS_QUERY),
        (foodgroup::LOCATE, locate::sub::SET_INFO),
        (foodgroup::LOCATE, locate::sub::USER_INFO_QUERY2),
        (foodgroup::BUDDY, buddy::sub::RIGHTS_QUERY),
        (foodgroup::ICBM, icbm::sub::PARAMETER_QUERY),
        (foodgroup::ICBM, icbm::sub::CHANNEL_MSG_TO_HOST),
        (foodgroup::ICBM, icbm::sub::EVIL_REQUEST),
        (foodgroup::ICBM, icbm::sub::CLIENT_EVENT),
        (foodgroup::CHAT_NAV, chat_nav::sub::REQUEST_CHAT_RIGHTS),
        (foodgroup::CHAT_NAV, chat_nav::sub::CREATE_ROOM),
        (foodgroup::CHAT, chat::sub::CHANNEL_MSG_TO_HOST),
        (foodgroup::FEEDBAG, feedbag::sub::QUERY),
        (foodgroup::FEEDBAG, feedbag::sub::INSERT_ITEM),
    ]
}

/// Error SNAC in the OService food group.
fn snac_error(request_id: u32, code: ErrorCode) -> SnacMessage {
    SnacMessage::reply(
        request_id,
        SnacBody::Error { food_group: foodgroup::OSERVICE, code },
    )
}

#[cfg(test)]
mod tests {
    use warble_core::{MemoryFeedbagStore, ScreenName, env::test_utils::MockEnv};
    use warble_proto::snacs::feedbag::FeedbagItem;

    use super::*;

    struct Fixture {
        service: OService<MockEnv, MemoryFeedbagStore>,
        registry: Arc<SessionRegistry>,
        chat_registry: Arc<ChatRegistry>,
        feedbag: Arc<MemoryFeedbagStore>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(SessionRegistry::new());
        let chat_registry = Arc::new(ChatRegistry::new());
        let feedbag = Arc::new(MemoryFeedbagStore::new());
        let presence =
            Arc::new(PresenceNotifier::new(Arc::clone(&registry), Arc::clone(&feedbag)));
        let service = OService::new(
            MockEnv::at(1_000_000),
            Arc::clone(&registry),
            Arc::clone(&chat_registry),
            presence,
            Arc::clone(&feedbag),
            Config::default(),
        );
        Fixture { service, registry, chat_registry, feedbag }
    }

    #[test]
    fn client_versions_echoes() {
        let fx = fixture();
        let versions = Versions {
            versions: vec![oservice::FoodGroupVersion { food_group: 0x01, version: 4 }],
        };
        let reply = fx.service.client_versions(9, &versions);
        assert_eq!(reply.request_id, 9);
        assert_eq!(reply.body, SnacBody::HostVersions(versions));
    }

    #[test]
    fn rate_params_are_canned() {
        let fx = fixture();
        match fx.service.rate_params_query(1).body {
            SnacBody::RateParamsReply(reply) => {
                assert_eq!(reply.classes.len(), 1);
                assert_eq!(reply.groups.len(), 1);
                assert!(!reply.groups[0].pairs.is_empty());
            },
            other => panic!("expected rate reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn visibility_flip_fans_out() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);
        let bob = fx.registry.add("sid-b", ScreenName::new("bob"), 100);
        let mut bob_rx = bob.take_outbound().unwrap();

        fx.feedbag
            .upsert(&"bob".into(), &[FeedbagItem::buddy("alice", 1, 1)], 100)
            .await
            .unwrap();

        let go_invisible = SetUserInfoFields {
            tlvs: TlvBlock::from_tlvs(vec![Tlv::u32(
                oservice::tags::USER_STATUS,
                status::INVISIBLE,
            )]),
        };
        fx.service.set_user_info_fields(&alice, &go_invisible).await.unwrap();

        match bob_rx.try_recv().unwrap() {
            warble_core::Outbound::Message(msg) => {
                assert!(matches!(msg.body, SnacBody::BuddyDeparted(_)));
            },
            other => panic!("unexpected outbound item: {other:?}"),
        }

        // Repeating the same status is a no-op.
        fx.service.set_user_info_fields(&alice, &go_invisible).await.unwrap();
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn service_request_rejects_non_chat_groups() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);

        let request = ServiceRequest { food_group: foodgroup::ICBM, tlvs: TlvBlock::new() };
        let reply = fx.service.service_request(&alice, 3, &request).await.unwrap();
        assert_eq!(
            reply.body,
            SnacBody::Error {
                food_group: foodgroup::OSERVICE,
                code: ErrorCode::ServiceUnavailable
            }
        );
    }

    #[tokio::test]
    async fn service_request_prebinds_and_issues_cookie() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);

        let participants = fx.chat_registry.register(warble_core::ChatRoom {
            cookie: "room-1".to_string(),
            exchange: 4,
            instance: 0,
            detail_level: 2,
            name: "party".to_string(),
            created_at: 100,
        });

        let mut target_raw = Vec::new();
        ChatServiceTarget { exchange: 4, cookie: "room-1".to_string(), instance: 0 }
            .encode(&mut target_raw)
            .unwrap();
        let request = ServiceRequest {
            food_group: foodgroup::CHAT,
            tlvs: TlvBlock::from_tlvs(vec![Tlv::new(oservice::tags::ROOM, target_raw)]),
        };

        let reply = fx.service.service_request(&alice, 3, &request).await.unwrap();
        match reply.body {
            SnacBody::ServiceResponse(resp) => {
                assert!(resp.tlvs.has(oservice::tags::LOGIN_COOKIE));
                assert_eq!(
                    resp.tlvs.u16(oservice::tags::GROUP_ID).unwrap().unwrap(),
                    foodgroup::CHAT
                );
            },
            other => panic!("expected service response, got {other:?}"),
        }

        // Requester is pre-bound into the room by session id.
        assert!(participants.retrieve("sid-a").is_some());
    }
}
