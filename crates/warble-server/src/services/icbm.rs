//! ICBM handlers: instant messages, typing events, warnings.

use std::sync::Arc;

use warble_core::{
    BlockedState, Environment, FeedbagStore, IdentScreenName, Session, SessionRegistry,
};
use warble_proto::{
    ErrorCode, SnacBody, SnacMessage, Tlv, TlvBlock, foodgroup,
    snacs::icbm::{
        self, ChannelMsgToClient, ChannelMsgToHost, ClientEvent, EvilReply, EvilRequest,
        HostAck, ParameterReply, SEND_AS_ANONYMOUS,
    },
};

use crate::{error::ServerError, presence::PresenceNotifier, services::oservice};

/// Warning units applied by a named warning.
const EVIL_DELTA: u16 = 100;
/// Warning units applied by an anonymous warning.
const EVIL_DELTA_ANONYMOUS: u16 = 30;

/// ICBM service over the registry, feedbag store, and presence engine.
pub struct IcbmService<E, F> {
    env: E,
    registry: Arc<SessionRegistry>,
    feedbag: Arc<F>,
    presence: Arc<PresenceNotifier<F>>,
}

impl<E: Environment, F: FeedbagStore> IcbmService<E, F> {
    /// Service over the main registry, feedbag store, and presence engine.
    pub fn new(
        env: E,
        registry: Arc<SessionRegistry>,
        feedbag: Arc<F>,
        presence: Arc<PresenceNotifier<F>>,
    ) -> Self {
        Self { env, registry, feedbag, presence }
    }

    /// `ParameterQuery`: canned messaging parameters. Not enforced; clients
    /// use them to shape their own behavior.
    #[must_use]
    pub fn parameter_query(&self, request_id: u32) -> SnacMessage {
        SnacMessage::reply(
            request_id,
            SnacBody::IcbmParameterReply(ParameterReply {
                max_slots: 100,
                flags: 3,
                max_incoming_len: 512,
                max_source_evil: 999,
                max_dest_evil: 999,
                min_interval: 0,
            }),
        )
    }

    /// `ChannelMsgToHost`: relay an instant message, honoring block state.
    pub async fn channel_msg_to_host(
        &self,
        session: &Session,
        request_id: u32,
        request: &ChannelMsgToHost,
    ) -> Result<Vec<SnacMessage>, ServerError> {
        let recipient_ident = IdentScreenName::from(request.screen_name.as_str());

        match self.feedbag.blocked_state(session.ident(), &recipient_ident).await? {
            BlockedState::FirstBlocksSecond => {
                return Ok(vec![snac_error(request_id, ErrorCode::InLocalPermitDeny)]);
            },
            BlockedState::SecondBlocksFirst | BlockedState::Mutual => {
                return Ok(vec![snac_error(request_id, ErrorCode::NotLoggedOn)]);
            },
            BlockedState::NotBlocked => {},
        }

        let Some(recipient) = self.registry.retrieve_by_screen_name(&recipient_ident) else {
            return Ok(vec![snac_error(request_id, ErrorCode::NotLoggedOn)]);
        };

        // Host marker first, then every request TLV verbatim: the message
        // bytes and any client-side flags ride through untouched.
        let mut tlvs = TlvBlock::new();
        tlvs.push(Tlv::empty(icbm::tags::HOST_MARKER));
        for tlv in &request.tlvs.tlvs {
            tlvs.push(tlv.clone());
        }

        let relay = SnacMessage::push(SnacBody::ChannelMsgToClient(ChannelMsgToClient {
            cookie: request.cookie,
            channel: request.channel,
            sender: session.user_info(self.env.wall_clock_secs()),
            tlvs,
        }));
        self.registry.relay_to_screen_name(&recipient_ident, relay);
        tracing::debug!(
            from = %session.ident(),
            to = %recipient.ident(),
            channel = request.channel,
            "message relayed"
        );

        if request.tlvs.has(icbm::tags::REQUEST_HOST_ACK) {
            return Ok(vec![SnacMessage::reply(
                request_id,
                SnacBody::HostAck(HostAck {
                    cookie: request.cookie,
                    channel: request.channel,
                    screen_name: request.screen_name.clone(),
                }),
            )]);
        }
        Ok(Vec::new())
    }

    /// `ClientEvent`: relay a typing indicator.
    ///
    /// Any block state suppresses the relay silently; the typer learns
    /// nothing from a typing event, so no error surfaces.
    pub async fn client_event(
        &self,
        session: &Session,
        request: &ClientEvent,
    ) -> Result<(), ServerError> {
        let recipient_ident = IdentScreenName::from(request.screen_name.as_str());

        if self
            .feedbag
            .blocked_state(session.ident(), &recipient_ident)
            .await?
            .is_blocked()
        {
            return Ok(());
        }

        self.registry.relay_to_screen_name(
            &recipient_ident,
            SnacMessage::push(SnacBody::ClientEvent(ClientEvent {
                cookie: request.cookie,
                channel: request.channel,
                screen_name: session.screen_name().as_str().to_string(),
                event: request.event,
            })),
        );
        Ok(())
    }

    /// `EvilRequest`: warn another user, with fan-out of the new level.
    pub async fn evil_request(
        &self,
        session: &Session,
        request_id: u32,
        request: &EvilRequest,
    ) -> Result<Vec<SnacMessage>, ServerError> {
        let target_ident = IdentScreenName::from(request.screen_name.as_str());

        if target_ident == *session.ident() {
            return Ok(vec![snac_error(request_id, ErrorCode::NotSupportedByHost)]);
        }

        if self
            .feedbag
            .blocked_state(session.ident(), &target_ident)
            .await?
            .is_blocked()
        {
            return Ok(vec![snac_error(request_id, ErrorCode::NotLoggedOn)]);
        }

        let Some(target) = self.registry.retrieve_by_screen_name(&target_ident) else {
            // No recipient, no warning; the warner gets nothing back.
            return Ok(Vec::new());
        };

        let anonymous = request.send_as == SEND_AS_ANONYMOUS;
        let delta = if anonymous { EVIL_DELTA_ANONYMOUS } else { EVIL_DELTA };
        let before = target.warning();
        let updated = target.incr_warning(delta);
        let applied = updated - before;

        let now = self.env.wall_clock_secs();
        let snitcher = if anonymous { None } else { Some(session.user_info(now)) };
        target.relay(oservice::evil_notification(updated, snitcher));

        self.presence.broadcast_arrival(&target, now).await?;
        tracing::info!(
            from = %session.ident(),
            to = %target.ident(),
            anonymous,
            updated,
            "warning applied"
        );

        Ok(vec![SnacMessage::reply(
            request_id,
            SnacBody::EvilReply(EvilReply { delta: applied, updated_evil: updated }),
        )])
    }
}

fn snac_error(request_id: u32, code: ErrorCode) -> SnacMessage {
    SnacMessage::reply(request_id, SnacBody::Error { food_group: foodgroup::ICBM, code })
}
