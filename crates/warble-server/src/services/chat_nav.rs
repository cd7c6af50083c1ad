//! ChatNav handlers: room creation and lookup on the main service.

use std::sync::Arc;

use warble_core::{ChatRegistry, ChatRoom, Environment, Session};
#[cfg_attr(not(test), allow(unused_imports))]
use warble_proto::{
    ErrorCode, SnacBody, SnacMessage, Tlv, TlvBlock, foodgroup,
    snacs::chat_nav::{self, CreateRoom, NavInfo, RequestRoomInfo, tags},
};

use crate::error::ServerError;

/// Fallback name for a creation request that omits the room-name TLV.
const UNNAMED_ROOM: &str = "chat room";

/// ChatNav service over the room registry.
pub struct ChatNavService<E> {
    env: E,
    chat_registry: Arc<ChatRegistry>,
}

impl<E: Environment> ChatNavService<E> {
    /// Service over the chat room registry.
    pub fn new(env: E, chat_registry: Arc<ChatRegistry>) -> Self {
        Self { env, chat_registry }
    }

    /// `RequestChatRights`: canned exchange descriptor.
    #[must_use]
    pub fn request_chat_rights(&self, request_id: u32) -> SnacMessage {
        // One public exchange (4), up to ten concurrent rooms per user.
        let mut exchange = Vec::new();
        exchange.extend_from_slice(&4u16.to_be_bytes());
        let tlvs = TlvBlock::from_tlvs(vec![
            Tlv::new(tags::MAX_CONCURRENT_ROOMS, vec![10u8]),
            Tlv::new(tags::EXCHANGE_INFO, exchange),
        ]);
        SnacMessage::reply(request_id, SnacBody::NavInfo(NavInfo { tlvs }))
    }

    /// `CreateRoom`: mint a cookie, register the room, pre-bind the creator.
    ///
    /// Entry happens later, when the client reconnects to the chat service
    /// with the handoff cookie from a follow-up service request.
    pub fn create_room(
        &self,
        session: &Arc<Session>,
        request_id: u32,
        request: &CreateRoom,
    ) -> Result<SnacMessage, ServerError> {
        let name = request.room.name().unwrap_or_else(|| UNNAMED_ROOM.to_string());
        let now = self.env.wall_clock_secs();

        let room = ChatRoom {
            cookie: self.env.new_uuid(),
            exchange: request.room.exchange,
            instance: request.room.instance,
            detail_level: request.room.detail_level,
            name,
            created_at: now,
        };
        tracing::info!(cookie = %room.cookie, name = %room.name, "room created");

        let participants = self.chat_registry.register(room.clone());
        let creator = participants.add(session.id(), session.screen_name().clone(), now);
        creator.set_chat_room_cookie(&room.cookie);

        let tlvs = TlvBlock::from_tlvs(vec![Tlv::new(
            tags::ROOM_INFO,
            room.descriptor().to_bytes()?,
        )]);
        Ok(SnacMessage::reply(request_id, SnacBody::NavInfo(NavInfo { tlvs })))
    }

    /// `RequestRoomInfo`: describe an existing room.
    pub fn request_room_info(
        &self,
        request_id: u32,
        request: &RequestRoomInfo,
    ) -> Result<SnacMessage, ServerError> {
        let Ok((room, _participants)) = self.chat_registry.retrieve(&request.cookie) else {
            return Ok(SnacMessage::reply(
                request_id,
                SnacBody::Error {
                    food_group: foodgroup::CHAT_NAV,
                    code: ErrorCode::NotSupportedByHost,
                },
            ));
        };

        let tlvs = TlvBlock::from_tlvs(vec![Tlv::new(
            tags::ROOM_INFO,
            room.descriptor().to_bytes()?,
        )]);
        Ok(SnacMessage::reply(request_id, SnacBody::NavInfo(NavInfo { tlvs })))
    }
}

#[cfg(test)]
mod tests {
    use warble_core::{ScreenName, SessionRegistry, env::test_utils::MockEnv};
    use warble_proto::snacs::chat::{RoomDescriptor, room_tags};

    use super::*;

    struct Fixture {
        service: ChatNavService<MockEnv>,
        chat_registry: Arc<ChatRegistry>,
        registry: Arc<SessionRegistry>,
    }

    fn fixture() -> Fixture {
        let chat_registry = Arc::new(ChatRegistry::new());
        let service = ChatNavService::new(MockEnv::at(1_000_000), Arc::clone(&chat_registry));
        Fixture { service, chat_registry, registry: Arc::new(SessionRegistry::new()) }
    }

    fn create_request(name: &str) -> CreateRoom {
        CreateRoom {
            room: RoomDescriptor {
                exchange: 4,
                cookie: chat_nav::CREATE_COOKIE.to_string(),
                instance: 0,
                detail_level: 2,
                tlvs: TlvBlock::from_tlvs(vec![Tlv::string(room_tags::ROOM_NAME, name)]),
            },
        }
    }

    #[test]
    fn create_room_registers_and_prebinds() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);

        let reply = fx.service.create_room(&alice, 7, &create_request("party")).unwrap();

        // The reply names the room via its descriptor TLV.
        let descriptor_raw = match reply.body {
            SnacBody::NavInfo(info) => info.tlvs.bytes(tags::ROOM_INFO).unwrap(),
            other => panic!("expected nav info, got {other:?}"),
        };
        let mut buf = descriptor_raw;
        let descriptor = RoomDescriptor::decode(&mut buf).unwrap();
        assert_eq!(descriptor.name().unwrap(), "party");

        // The registry knows the room, and the creator is pre-bound.
        let (room, participants) = fx.chat_registry.retrieve(&descriptor.cookie).unwrap();
        assert_eq!(room.name, "party");
        let bound = participants.retrieve("sid-a").unwrap();
        assert_eq!(bound.chat_room_cookie().unwrap(), room.cookie);
    }

    #[test]
    fn room_info_for_unknown_cookie_is_an_error() {
        let fx = fixture();
        let request = RequestRoomInfo {
            exchange: 4,
            cookie: "missing".to_string(),
            instance: 0,
            detail_level: 2,
        };
        let reply = fx.service.request_room_info(1, &request).unwrap();
        assert_eq!(
            reply.body,
            SnacBody::Error {
                food_group: foodgroup::CHAT_NAV,
                code: ErrorCode::NotSupportedByHost
            }
        );
    }

    #[test]
    fn room_info_describes_existing_room() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);
        let created = fx.service.create_room(&alice, 1, &create_request("lounge")).unwrap();

        let cookie = match created.body {
            SnacBody::NavInfo(info) => {
                let mut buf = info.tlvs.bytes(tags::ROOM_INFO).unwrap();
                RoomDescriptor::decode(&mut buf).unwrap().cookie
            },
            other => panic!("expected nav info, got {other:?}"),
        };

        let request = RequestRoomInfo { exchange: 4, cookie, instance: 0, detail_level: 2 };
        let reply = fx.service.request_room_info(2, &request).unwrap();
        assert!(matches!(reply.body, SnacBody::NavInfo(_)));
    }
}
