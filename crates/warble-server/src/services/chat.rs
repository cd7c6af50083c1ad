//! Chat handlers: in-room messaging and departure.

use std::sync::Arc;

use warble_core::{ChatRegistry, Environment, Session, SessionRegistry};
use warble_proto::{
    SnacBody, SnacMessage, Tlv, TlvBlock,
    snacs::chat::{self, ChannelMsgToClient, ChannelMsgToHost, UsersLeft},
};

use crate::error::ServerError;

/// Chat service over the room registry.
pub struct ChatService<E> {
    env: E,
    chat_registry: Arc<ChatRegistry>,
}

impl<E: Environment> ChatService<E> {
    /// Service over the chat room registry.
    pub fn new(env: E, chat_registry: Arc<ChatRegistry>) -> Self {
        Self { env, chat_registry }
    }

    /// `ChannelMsgToHost`: broadcast to the room, minus the sender.
    ///
    /// The broadcast copy carries the sender's TLVs verbatim plus an
    /// appended sender-information TLV. A sender that set the reflection
    /// flag receives the same SNAC back under its own request id.
    pub fn channel_msg_to_host(
        &self,
        session: &Session,
        participants: &SessionRegistry,
        request_id: u32,
        request: &ChannelMsgToHost,
    ) -> Result<Vec<SnacMessage>, ServerError> {
        let now = self.env.wall_clock_secs();

        let mut sender_info = Vec::new();
        session.user_info(now).encode(&mut sender_info)?;

        let mut tlvs = TlvBlock::new();
        for tlv in &request.tlvs.tlvs {
            tlvs.push(tlv.clone());
        }
        tlvs.push(Tlv::new(chat::tags::SENDER_INFORMATION, sender_info));

        let broadcast = ChannelMsgToClient {
            cookie: request.cookie,
            channel: request.channel,
            tlvs,
        };
        participants.relay_to_all_except(
            session,
            &SnacMessage::push(SnacBody::ChatChannelMsgToClient(broadcast.clone())),
        );
        tracing::debug!(
            from = %session.ident(),
            channel = request.channel,
            "room message broadcast"
        );

        if request.tlvs.has(chat::tags::ENABLE_REFLECTION) {
            return Ok(vec![SnacMessage::reply(
                request_id,
                SnacBody::ChatChannelMsgToClient(broadcast),
            )]);
        }
        Ok(Vec::new())
    }

    /// Room signout: announce the departure, unbind, and delete the room if
    /// it emptied.
    pub fn leave(&self, session: &Session, room_cookie: &str, participants: &SessionRegistry) {
        let now = self.env.wall_clock_secs();

        participants.remove(session.id());
        participants.relay_to_all_except(
            session,
            &SnacMessage::push(SnacBody::ChatUsersLeft(UsersLeft {
                users: vec![session.user_info(now)],
            })),
        );

        if self.chat_registry.remove_if_empty(room_cookie) {
            tracing::info!(cookie = %room_cookie, "room emptied, deleted");
        }
    }
}
