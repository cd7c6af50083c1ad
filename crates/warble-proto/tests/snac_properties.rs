//! Codec round-trip properties.
//!
//! `marshal(unmarshal(x)) == x` for every body with a canonical form, with
//! TLV order preserved. Strategies build structurally valid values; malformed
//! input is covered by the unit tests beside each codec.

use bytes::Bytes;
use proptest::prelude::*;
use warble_proto::{
    ChatCookie, FlapFrame, FlapType, SnacBody, SnacFrame, SnacMessage, Tlv, TlvBlock,
    TlvUserInfo, foodgroup,
    snacs::{
        bucp, buddy,
        chat::{self, RoomDescriptor},
        chat_nav, feedbag, icbm, locate, oservice,
    },
};

fn arb_screen_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{0,15}"
}

fn arb_tlv() -> impl Strategy<Value = Tlv> {
    (any::<u16>(), prop::collection::vec(any::<u8>(), 0..48))
        .prop_map(|(tag, value)| Tlv::new(tag, value))
}

fn arb_tlv_block() -> impl Strategy<Value = TlvBlock> {
    prop::collection::vec(arb_tlv(), 0..6).prop_map(TlvBlock::from_tlvs)
}

fn arb_user_info() -> impl Strategy<Value = TlvUserInfo> {
    (arb_screen_name(), any::<u16>(), arb_tlv_block())
        .prop_map(|(name, warning, tlvs)| TlvUserInfo::new(name, warning, tlvs))
}

fn arb_feedbag_item() -> impl Strategy<Value = feedbag::FeedbagItem> {
    (arb_screen_name(), any::<u16>(), any::<u16>(), 0u16..8, arb_tlv_block()).prop_map(
        |(name, group_id, item_id, class, tlvs)| feedbag::FeedbagItem {
            name,
            group_id,
            item_id,
            class_id: feedbag::ClassId::from_u16(class),
            tlvs,
        },
    )
}

fn arb_room() -> impl Strategy<Value = RoomDescriptor> {
    (any::<u16>(), "[a-f0-9-]{1,36}", any::<u16>(), any::<u8>(), arb_tlv_block()).prop_map(
        |(exchange, cookie, instance, detail_level, tlvs)| RoomDescriptor {
            exchange,
            cookie,
            instance,
            detail_level,
            tlvs,
        },
    )
}

fn arb_body() -> impl Strategy<Value = SnacBody> {
    prop_oneof![
        arb_user_info().prop_map(|u| SnacBody::BuddyArrived(buddy::Arrived { user_info: u })),
        (arb_screen_name(), any::<u16>()).prop_map(|(n, w)| {
            SnacBody::BuddyDeparted(buddy::Departed { user_info: TlvUserInfo::bare(n, w) })
        }),
        (any::<[u8; 8]>(), any::<u16>(), arb_screen_name(), arb_tlv_block()).prop_map(
            |(cookie, channel, screen_name, tlvs)| {
                SnacBody::ChannelMsgToHost(icbm::ChannelMsgToHost {
                    cookie,
                    channel,
                    screen_name,
                    tlvs,
                })
            }
        ),
        (any::<[u8; 8]>(), any::<u16>(), arb_user_info(), arb_tlv_block()).prop_map(
            |(cookie, channel, sender, tlvs)| {
                SnacBody::ChannelMsgToClient(icbm::ChannelMsgToClient {
                    cookie,
                    channel,
                    sender,
                    tlvs,
                })
            }
        ),
        prop::collection::vec(arb_feedbag_item(), 0..5)
            .prop_map(|items| SnacBody::FeedbagInsertItem(feedbag::ItemBatch::new(items))),
        (any::<u8>(), prop::collection::vec(arb_feedbag_item(), 0..5), any::<u32>()).prop_map(
            |(version, items, last_update)| {
                SnacBody::FeedbagReply(feedbag::Reply { version, items, last_update })
            }
        ),
        arb_room().prop_map(|room| SnacBody::CreateRoom(chat_nav::CreateRoom { room })),
        arb_room()
            .prop_map(|room| SnacBody::ChatRoomInfoUpdate(chat::RoomInfoUpdate { room })),
        prop::collection::vec(arb_user_info(), 0..4)
            .prop_map(|users| SnacBody::ChatUsersJoined(chat::UsersJoined { users })),
        (any::<[u8; 8]>(), any::<u16>(), arb_tlv_block()).prop_map(
            |(cookie, channel, tlvs)| {
                SnacBody::ChatChannelMsgToHost(chat::ChannelMsgToHost { cookie, channel, tlvs })
            }
        ),
        arb_tlv_block()
            .prop_map(|tlvs| SnacBody::BucpLoginRequest(bucp::LoginRequest { tlvs })),
        (any::<u32>(), arb_screen_name()).prop_map(|(type2, screen_name)| {
            SnacBody::UserInfoQuery2(locate::UserInfoQuery2 { type2, screen_name })
        }),
        (any::<u16>(), prop::option::of(arb_user_info())).prop_map(|(new_evil, snitcher)| {
            SnacBody::EvilNotification(oservice::EvilNotification { new_evil, snitcher })
        }),
        prop::collection::vec(any::<u16>(), 0..8)
            .prop_map(|food_groups| SnacBody::HostOnline(oservice::HostOnline { food_groups })),
        Just(SnacBody::FeedbagQuery),
        Just(SnacBody::IcbmParameterQuery),
    ]
}

proptest! {
    #[test]
    fn snac_message_round_trip(request_id in any::<u32>(), body in arb_body()) {
        let msg = SnacMessage::reply(request_id, body);

        let mut wire = Vec::new();
        msg.encode(&mut wire).expect("should encode");

        let mut buf = Bytes::from(wire);
        let parsed = SnacMessage::decode(&mut buf).expect("should decode");
        prop_assert_eq!(msg, parsed);
        prop_assert!(buf.is_empty());
    }

    #[test]
    fn snac_encode_is_stable(body in arb_body()) {
        // Encoding the decoded form reproduces the original bytes exactly,
        // TLV order included.
        let msg = SnacMessage::push(body);

        let mut first = Vec::new();
        msg.encode(&mut first).expect("should encode");

        let mut buf = Bytes::from(first.clone());
        let parsed = SnacMessage::decode(&mut buf).expect("should decode");

        let mut second = Vec::new();
        parsed.encode(&mut second).expect("should re-encode");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn flap_frame_round_trip(
        seq in any::<u16>(),
        payload in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let frame = FlapFrame::new(FlapType::Data, seq, payload);

        let mut wire = Vec::new();
        frame.encode(&mut wire).expect("should encode");

        let mut buf = Bytes::from(wire);
        let parsed = FlapFrame::decode(&mut buf).expect("should decode");
        prop_assert_eq!(frame, parsed);
    }

    #[test]
    fn chat_cookie_round_trip(room in "[a-f0-9-]{1,36}", session in "[a-f0-9-]{1,36}") {
        let cookie = ChatCookie::new(room, session);
        let raw = cookie.to_bytes().expect("should encode");

        let mut buf = raw;
        let parsed = ChatCookie::decode(&mut buf).expect("should decode");
        prop_assert_eq!(cookie, parsed);
    }
}

#[test]
fn unknown_pair_is_unsupported() {
    let frame = SnacFrame::new(0x00F0, 0x0099, 7);
    let mut buf = Bytes::new();
    let err = SnacBody::decode(frame, &mut buf).unwrap_err();
    assert_eq!(
        err,
        warble_proto::ProtocolError::UnsupportedSnac { food_group: 0x00F0, subgroup: 0x0099 }
    );
}

#[test]
fn error_body_binds_request_food_group() {
    let body = SnacBody::Error {
        food_group: foodgroup::ICBM,
        code: warble_proto::ErrorCode::InLocalPermitDeny,
    };
    assert_eq!(body.ids(), (foodgroup::ICBM, 0x0001));

    let msg = SnacMessage::reply(42, body);
    let mut wire = Vec::new();
    msg.encode(&mut wire).unwrap();

    let mut buf = Bytes::from(wire);
    let parsed = SnacMessage::decode(&mut buf).unwrap();
    assert_eq!(msg, parsed);
}

#[test]
fn golden_icbm_frame_layout() {
    // ICBM ChannelMsgToHost for recipient "bo" with one empty TLV, wrapped in
    // a Data FLAP. Every offset hand-checked against the frame layout.
    let msg = SnacMessage::reply(
        0x0000_0001,
        SnacBody::ChannelMsgToHost(icbm::ChannelMsgToHost {
            cookie: [1, 2, 3, 4, 5, 6, 7, 8],
            channel: 1,
            screen_name: "bo".to_string(),
            tlvs: TlvBlock::from_tlvs(vec![Tlv::empty(icbm::tags::REQUEST_HOST_ACK)]),
        }),
    );

    let mut snac = Vec::new();
    msg.encode(&mut snac).unwrap();

    let frame = FlapFrame::new(FlapType::Data, 0x0102, snac);
    let mut wire = Vec::new();
    frame.encode(&mut wire).unwrap();

    let expected = hex::decode(
        "2a020102001b\
         00040006000000000001\
         0102030405060708\
         0001\
         02626f\
         00030000",
    )
    .unwrap();
    assert_eq!(wire, expected);

    // Structural assertions kept explicit so a layout regression pinpoints
    // the broken field rather than a hex blob diff.
    assert_eq!(wire[0], 0x2A);
    assert_eq!(wire[1], 0x02);
    assert_eq!(&wire[2..4], &[0x01, 0x02]);
    let payload_len = u16::from_be_bytes([wire[4], wire[5]]) as usize;
    assert_eq!(payload_len, wire.len() - 6);
    // SNAC header
    assert_eq!(&wire[6..8], &[0x00, 0x04]); // ICBM
    assert_eq!(&wire[8..10], &[0x00, 0x06]); // ChannelMsgToHost
    assert_eq!(&wire[10..12], &[0x00, 0x00]); // flags
    assert_eq!(&wire[12..16], &[0x00, 0x00, 0x00, 0x01]); // request id
    // body: cookie, channel, screen name, TLV
    assert_eq!(&wire[16..24], &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(&wire[24..26], &[0x00, 0x01]);
    assert_eq!(wire[26], 2);
    assert_eq!(&wire[27..29], b"bo");
    assert_eq!(&wire[29..33], &[0x00, 0x03, 0x00, 0x00]);
    assert_eq!(wire.len(), 33);
}
