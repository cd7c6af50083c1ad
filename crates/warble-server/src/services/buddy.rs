//! Buddy food group handlers.
//!
//! Arrival and departure events are produced by the presence engine; the only
//! request clients send here is the rights query.

use warble_proto::{
    SnacBody, SnacMessage, Tlv, TlvBlock,
    snacs::buddy::{RightsReply, tags},
};

/// Buddy rights handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuddyService;

impl BuddyService {
    /// `RightsQuery`: advisory watcher limits.
    #[must_use]
    pub fn rights_query(&self, request_id: u32) -> SnacMessage {
        let tlvs = TlvBlock::from_tlvs(vec![
            Tlv::u16(tags::MAX_BUDDIES, 500),
            Tlv::u16(tags::MAX_WATCHERS, 500),
            Tlv::u16(tags::MAX_TEMP_BUDDIES, 160),
        ]);
        SnacMessage::reply(request_id, SnacBody::BuddyRightsReply(RightsReply { tlvs }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rights_reply_carries_limits() {
        let reply = BuddyService.rights_query(3);
        assert_eq!(reply.request_id, 3);
        match reply.body {
            SnacBody::BuddyRightsReply(r) => {
                assert_eq!(r.tlvs.u16(tags::MAX_BUDDIES).unwrap().unwrap(), 500);
            },
            other => panic!("expected rights reply, got {other:?}"),
        }
    }
}
