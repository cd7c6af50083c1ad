//! Locate handlers: profiles, away messages, user-info queries.

use std::sync::Arc;

use warble_core::{
    Environment, FeedbagStore, IdentScreenName, ProfileStore, Session, SessionRegistry,
};
use warble_proto::{
    ErrorCode, SnacBody, SnacMessage, Tlv, TlvBlock, foodgroup,
    snacs::locate::{
        self, AOLRTF_MIME, ResultReply, RightsReply, SetInfo, UserInfoQuery2, UserInfoReply,
        query_type,
    },
};

use crate::{error::ServerError, presence::PresenceNotifier};

/// Locate service over the profile store and presence engine.
pub struct LocateService<E, F, P> {
    env: E,
    registry: Arc<SessionRegistry>,
    feedbag: Arc<F>,
    profiles: Arc<P>,
    presence: Arc<PresenceNotifier<F>>,
}

impl<E, F, P> LocateService<E, F, P>
where
    E: Environment,
    F: FeedbagStore,
    P: ProfileStore,
{
    /// Service over the registry, feedbag and profile stores, and presence.
    pub fn new(
        env: E,
        registry: Arc<SessionRegistry>,
        feedbag: Arc<F>,
        profiles: Arc<P>,
        presence: Arc<PresenceNotifier<F>>,
    ) -> Self {
        Self { env, registry, feedbag, profiles, presence }
    }

    /// `RightsQuery`: canned capability limits.
    #[must_use]
    pub fn rights_query(&self, request_id: u32) -> SnacMessage {
        let tlvs = TlvBlock::from_tlvs(vec![
            Tlv::u16(0x0001, 0x0400), // max profile length
            Tlv::u16(0x0002, 0x0010), // max capabilities
        ]);
        SnacMessage::reply(request_id, SnacBody::LocateRightsReply(RightsReply { tlvs }))
    }

    /// `SetInfo`: upsert the profile and/or away message. Silent on success;
    /// fields the request omits are left untouched.
    pub async fn set_info(&self, session: &Session, body: &SetInfo) -> Result<(), ServerError> {
        if let Some(profile) = body.tlvs.string(locate::tags::INFO_SIG_DATA).transpose()? {
            self.profiles.upsert_profile(session.ident(), profile).await?;
        }

        if let Some(caps) = body.tlvs.bytes(locate::tags::INFO_CAPABILITIES) {
            session.set_caps(caps);
        }

        if let Some(away) = body.tlvs.string(locate::tags::INFO_UNAVAILABLE_DATA).transpose()? {
            session.set_away_message(away);
            // Buddies observe the away flag through an arrival event.
            self.presence.broadcast_arrival(session, self.env.wall_clock_secs()).await?;
        }
        Ok(())
    }

    /// `UserInfoQuery2`: another user's info, profile, and away message.
    ///
    /// A blocked pair (either direction) and an offline target are both
    /// reported as `NotLoggedOn`, so a blocker appears offline.
    pub async fn user_info_query2(
        &self,
        session: &Session,
        request_id: u32,
        request: &UserInfoQuery2,
    ) -> Result<SnacMessage, ServerError> {
        let target_ident = IdentScreenName::from(request.screen_name.as_str());

        if self
            .feedbag
            .blocked_state(session.ident(), &target_ident)
            .await?
            .is_blocked()
        {
            return Ok(snac_error(request_id, ErrorCode::NotLoggedOn));
        }

        let Some(target) = self.registry.retrieve_by_screen_name(&target_ident) else {
            return Ok(snac_error(request_id, ErrorCode::NotLoggedOn));
        };

        let mut tlvs = TlvBlock::new();
        if request.type2 & query_type::PROFILE != 0 {
            let profile = self.profiles.retrieve_profile(&target_ident).await?;
            tlvs.push(Tlv::string(locate::tags::INFO_SIG_MIME, AOLRTF_MIME));
            tlvs.push(Tlv::string(locate::tags::INFO_SIG_DATA, profile));
        }
        if request.type2 & query_type::AWAY_MESSAGE != 0 {
            tlvs.push(Tlv::string(locate::tags::INFO_UNAVAILABLE_MIME, AOLRTF_MIME));
            tlvs.push(Tlv::string(locate::tags::INFO_UNAVAILABLE_DATA, target.away_message()));
        }

        Ok(SnacMessage::reply(
            request_id,
            SnacBody::UserInfoReply(UserInfoReply {
                user_info: target.user_info(self.env.wall_clock_secs()),
                tlvs,
            }),
        ))
    }

    /// `SetDirInfo`: directory search is unimplemented; accept and confirm.
    #[must_use]
    pub fn set_dir_info(&self, request_id: u32) -> SnacMessage {
        SnacMessage::reply(request_id, SnacBody::SetDirReply(ResultReply::ok()))
    }

    /// `SetKeywordInfo`: keywords are unimplemented; accept and confirm.
    #[must_use]
    pub fn set_keyword_info(&self, request_id: u32) -> SnacMessage {
        SnacMessage::reply(request_id, SnacBody::SetKeywordReply(ResultReply::ok()))
    }
}

fn snac_error(request_id: u32, code: ErrorCode) -> SnacMessage {
    SnacMessage::reply(request_id, SnacBody::Error { food_group: foodgroup::LOCATE, code })
}

#[cfg(test)]
mod tests {
    use warble_core::{
        MemoryFeedbagStore, MemoryProfileStore, ScreenName, env::test_utils::MockEnv,
    };
    use warble_proto::snacs::feedbag::FeedbagItem;

    use super::*;

    struct Fixture {
        service: LocateService<MockEnv, MemoryFeedbagStore, MemoryProfileStore>,
        registry: Arc<SessionRegistry>,
        feedbag: Arc<MemoryFeedbagStore>,
        profiles: Arc<MemoryProfileStore>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(SessionRegistry::new());
        let feedbag = Arc::new(MemoryFeedbagStore::new());
        let profiles = Arc::new(MemoryProfileStore::new());
        let presence =
            Arc::new(PresenceNotifier::new(Arc::clone(&registry), Arc::clone(&feedbag)));
        let service = LocateService::new(
            MockEnv::at(1_000_000),
            Arc::clone(&registry),
            Arc::clone(&feedbag),
            Arc::clone(&profiles),
            presence,
        );
        Fixture { service, registry, feedbag, profiles }
    }

    #[tokio::test]
    async fn set_info_stores_profile() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);

        let body = SetInfo {
            tlvs: TlvBlock::from_tlvs(vec![Tlv::string(
                locate::tags::INFO_SIG_DATA,
                "<html>about me</html>",
            )]),
        };
        fx.service.set_info(&alice, &body).await.unwrap();

        assert_eq!(
            fx.profiles.retrieve_profile(alice.ident()).await.unwrap(),
            "<html>about me</html>"
        );
    }

    #[tokio::test]
    async fn set_info_away_message_updates_session() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);

        let body = SetInfo {
            tlvs: TlvBlock::from_tlvs(vec![Tlv::string(
                locate::tags::INFO_UNAVAILABLE_DATA,
                "out to lunch",
            )]),
        };
        fx.service.set_info(&alice, &body).await.unwrap();
        assert_eq!(alice.away_message(), "out to lunch");
    }

    #[tokio::test]
    async fn query_blocked_target_appears_offline() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);
        let _bob = fx.registry.add("sid-b", ScreenName::new("bob"), 100);
        fx.feedbag.upsert(&"bob".into(), &[FeedbagItem::deny("alice", 1)], 100).await.unwrap();

        let request = UserInfoQuery2 { type2: query_type::PROFILE, screen_name: "bob".into() };
        let reply = fx.service.user_info_query2(&alice, 1, &request).await.unwrap();
        assert_eq!(
            reply.body,
            SnacBody::Error { food_group: foodgroup::LOCATE, code: ErrorCode::NotLoggedOn }
        );
    }

    #[tokio::test]
    async fn query_returns_requested_sections() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);
        let bob = fx.registry.add("sid-b", ScreenName::new("bob"), 100);
        bob.set_away_message("afk");
        fx.profiles
            .upsert_profile(bob.ident(), "<html>bob</html>".to_string())
            .await
            .unwrap();

        let request = UserInfoQuery2 {
            type2: query_type::PROFILE | query_type::AWAY_MESSAGE,
            screen_name: "bob".into(),
        };
        let reply = fx.service.user_info_query2(&alice, 1, &request).await.unwrap();

        match reply.body {
            SnacBody::UserInfoReply(r) => {
                assert_eq!(r.user_info.screen_name, "bob");
                assert_eq!(
                    r.tlvs.string(locate::tags::INFO_SIG_DATA).unwrap().unwrap(),
                    "<html>bob</html>"
                );
                assert_eq!(
                    r.tlvs.string(locate::tags::INFO_UNAVAILABLE_DATA).unwrap().unwrap(),
                    "afk"
                );
                assert_eq!(
                    r.tlvs.string(locate::tags::INFO_SIG_MIME).unwrap().unwrap(),
                    AOLRTF_MIME
                );
            },
            other => panic!("expected user info reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_without_bits_omits_sections() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);
        let _bob = fx.registry.add("sid-b", ScreenName::new("bob"), 100);

        let request = UserInfoQuery2 { type2: 0, screen_name: "bob".into() };
        let reply = fx.service.user_info_query2(&alice, 1, &request).await.unwrap();
        match reply.body {
            SnacBody::UserInfoReply(r) => assert!(r.tlvs.is_empty()),
            other => panic!("expected user info reply, got {other:?}"),
        }
    }

    #[test]
    fn dir_and_keyword_get_canned_ok() {
        let fx = fixture();
        assert_eq!(
            fx.service.set_dir_info(4).body,
            SnacBody::SetDirReply(ResultReply::ok())
        );
        assert_eq!(
            fx.service.set_keyword_info(5).body,
            SnacBody::SetKeywordReply(ResultReply::ok())
        );
    }
}
