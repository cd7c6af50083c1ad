//! Feedbag handlers: the server-stored buddy list and its presence
//! side-effects.

use std::sync::Arc;

use warble_core::{Environment, FeedbagStore, IdentScreenName, Session, SessionRegistry};
use warble_proto::{
    ErrorCode, SnacBody, SnacMessage, Tlv, TlvBlock, foodgroup,
    snacs::feedbag::{
        self, ClassId, FeedbagItem, ItemBatch, QueryIfModified, Reply, ReplyNotModified,
        RightsReply, Status,
    },
};

use crate::{error::ServerError, presence::PresenceNotifier};

/// Normalized form of the screen name an item refers to.
fn ident_of(item: &FeedbagItem) -> IdentScreenName {
    IdentScreenName::from(item.name.as_str())
}

/// Feedbag service over the store and presence engine.
pub struct FeedbagService<E, F> {
    env: E,
    registry: Arc<SessionRegistry>,
    feedbag: Arc<F>,
    presence: Arc<PresenceNotifier<F>>,
}

impl<E: Environment, F: FeedbagStore> FeedbagService<E, F> {
    /// Service over the main registry, feedbag store, and presence engine.
    pub fn new(
        env: E,
        registry: Arc<SessionRegistry>,
        feedbag: Arc<F>,
        presence: Arc<PresenceNotifier<F>>,
    ) -> Self {
        Self { env, registry, feedbag, presence }
    }

    /// `RightsQuery`: advisory list-size limits.
    #[must_use]
    pub fn rights_query(&self, request_id: u32) -> SnacMessage {
        // Per-class maxima, Buddy first. Values are advisory; nothing is
        // enforced server-side.
        let mut limits = Vec::new();
        for max in [400u16, 61, 200, 200, 1, 1] {
            limits.extend_from_slice(&max.to_be_bytes());
        }
        let tlvs = TlvBlock::from_tlvs(vec![
            Tlv::new(feedbag::tags::MAX_ITEMS_BY_CLASS, limits),
            Tlv::u16(feedbag::tags::MAX_CLASS, 0x0005),
        ]);
        SnacMessage::reply(request_id, SnacBody::FeedbagRightsReply(RightsReply { tlvs }))
    }

    /// `Query`: the full list plus its timestamp.
    pub async fn query(
        &self,
        session: &Session,
        request_id: u32,
    ) -> Result<SnacMessage, ServerError> {
        let items = self.feedbag.retrieve(session.ident()).await?;
        let last_update = self.feedbag.last_modified(session.ident()).await?;
        Ok(SnacMessage::reply(
            request_id,
            SnacBody::FeedbagReply(Reply { version: 0, items, last_update: last_update as u32 }),
        ))
    }

    /// `QueryIfModified`: the full list, or a not-modified stub when the
    /// store's timestamp is strictly before the client's.
    pub async fn query_if_modified(
        &self,
        session: &Session,
        request_id: u32,
        request: QueryIfModified,
    ) -> Result<SnacMessage, ServerError> {
        let last_update = self.feedbag.last_modified(session.ident()).await?;
        if last_update < u64::from(request.last_update) {
            let count = self.feedbag.retrieve(session.ident()).await?.len();
            return Ok(SnacMessage::reply(
                request_id,
                SnacBody::FeedbagReplyNotModified(ReplyNotModified {
                    last_update: last_update as u32,
                    count: count as u16,
                }),
            ));
        }
        self.query(session, request_id).await
    }

    /// `InsertItem`: upsert the batch, then emit derived presence events.
    ///
    /// A deny naming the owner rejects the whole batch with
    /// `NotSupportedByHost` and persists nothing.
    pub async fn insert_item(
        &self,
        session: &Session,
        request_id: u32,
        batch: &ItemBatch,
    ) -> Result<SnacMessage, ServerError> {
        if batch.items.iter().any(|item| {
            item.class_id == ClassId::Deny && ident_of(item) == *session.ident()
        }) {
            tracing::debug!(owner = %session.ident(), "rejecting self-deny");
            return Ok(snac_error(request_id, ErrorCode::NotSupportedByHost));
        }

        // Snapshot denies before the write so repeating a deny emits no
        // duplicate departure.
        let prior = self.feedbag.retrieve(session.ident()).await?;
        let now = self.env.wall_clock_secs();
        self.feedbag.upsert(session.ident(), &batch.items, now).await?;

        for item in &batch.items {
            match item.class_id {
                ClassId::Buddy | ClassId::Permit => self.emit_arrival_from(session, item, now),
                ClassId::Deny => {
                    let already_denied = prior.iter().any(|p| {
                        p.class_id == ClassId::Deny && ident_of(p) == ident_of(item)
                    });
                    if !already_denied {
                        self.emit_block_departure(session, item);
                    }
                },
                _ => {},
            }
        }

        Ok(SnacMessage::reply(
            request_id,
            SnacBody::FeedbagStatus(Status::success(batch.items.len())),
        ))
    }

    /// `UpdateItem`: upsert plus the buddy/permit arrival side-effect. No
    /// deny-derived departures.
    pub async fn update_item(
        &self,
        session: &Session,
        request_id: u32,
        batch: &ItemBatch,
    ) -> Result<SnacMessage, ServerError> {
        let now = self.env.wall_clock_secs();
        self.feedbag.upsert(session.ident(), &batch.items, now).await?;

        for item in &batch.items {
            if matches!(item.class_id, ClassId::Buddy | ClassId::Permit) {
                self.emit_arrival_from(session, item, now);
            }
        }

        Ok(SnacMessage::reply(
            request_id,
            SnacBody::FeedbagStatus(Status::success(batch.items.len())),
        ))
    }

    /// `DeleteItem`: delete; each removed deny re-announces both sides to
    /// each other when online and visible.
    pub async fn delete_item(
        &self,
        session: &Session,
        request_id: u32,
        batch: &ItemBatch,
    ) -> Result<SnacMessage, ServerError> {
        let now = self.env.wall_clock_secs();
        self.feedbag.delete(session.ident(), &batch.items, now).await?;

        for item in &batch.items {
            if item.class_id != ClassId::Deny {
                continue;
            }
            let Some(unblocked) = self.registry.retrieve_by_screen_name(&ident_of(item))
            else {
                continue;
            };
            let Some(owner) = self.registry.retrieve_by_screen_name(session.ident()) else {
                continue;
            };
            if !unblocked.invisible() {
                self.presence.unicast_arrival(&unblocked, &owner, now);
            }
            if !owner.invisible() {
                self.presence.unicast_arrival(&owner, &unblocked, now);
            }
        }

        Ok(SnacMessage::reply(
            request_id,
            SnacBody::FeedbagStatus(Status::success(batch.items.len())),
        ))
    }

    /// Buddy/permit insert side-effect: the named user appears to the owner
    /// if online and visible.
    fn emit_arrival_from(&self, session: &Session, item: &FeedbagItem, now: u64) {
        let Some(named) = self.registry.retrieve_by_screen_name(&ident_of(item)) else {
            return;
        };
        let Some(owner) = self.registry.retrieve_by_screen_name(session.ident()) else {
            return;
        };
        if !named.invisible() {
            self.presence.unicast_arrival(&named, &owner, now);
        }
    }

    /// Deny insert side-effect: the blocker goes dark for the blocked user.
    fn emit_block_departure(&self, session: &Session, item: &FeedbagItem) {
        if session.invisible() {
            return;
        }
        let Some(blocked) = self.registry.retrieve_by_screen_name(&ident_of(item)) else {
            return;
        };
        let Some(owner) = self.registry.retrieve_by_screen_name(session.ident()) else {
            return;
        };
        self.presence.unicast_departure(&owner, &blocked);
    }
}

fn snac_error(request_id: u32, code: ErrorCode) -> SnacMessage {
    SnacMessage::reply(request_id, SnacBody::Error { food_group: foodgroup::FEEDBAG, code })
}

#[cfg(test)]
mod tests {
    use warble_core::{MemoryFeedbagStore, Outbound, ScreenName, env::test_utils::MockEnv};

    use super::*;

    struct Fixture {
        service: FeedbagService<MockEnv, MemoryFeedbagStore>,
        registry: Arc<SessionRegistry>,
        feedbag: Arc<MemoryFeedbagStore>,
        env: MockEnv,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(SessionRegistry::new());
        let feedbag = Arc::new(MemoryFeedbagStore::new());
        let presence =
            Arc::new(PresenceNotifier::new(Arc::clone(&registry), Arc::clone(&feedbag)));
        let env = MockEnv::at(1_000_000);
        let service = FeedbagService::new(
            env.clone(),
            Arc::clone(&registry),
            Arc::clone(&feedbag),
            presence,
        );
        Fixture { service, registry, feedbag, env }
    }

    fn try_recv_body(rx: &mut tokio::sync::mpsc::Receiver<Outbound>) -> Option<SnacBody> {
        match rx.try_recv() {
            Ok(Outbound::Message(msg)) => Some(msg.body),
            _ => None,
        }
    }

    #[tokio::test]
    async fn self_deny_is_rejected_and_not_persisted() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);

        let batch = ItemBatch::new(vec![FeedbagItem::deny("Alice", 1)]);
        let reply = fx.service.insert_item(&alice, 5, &batch).await.unwrap();

        assert_eq!(
            reply.body,
            SnacBody::Error {
                food_group: foodgroup::FEEDBAG,
                code: ErrorCode::NotSupportedByHost
            }
        );
        assert!(fx.feedbag.retrieve(alice.ident()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_reports_success_per_item() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);

        let batch = ItemBatch::new(vec![
            FeedbagItem::buddy("bob", 1, 10),
            FeedbagItem::buddy("carol", 1, 11),
        ]);
        let reply = fx.service.insert_item(&alice, 5, &batch).await.unwrap();

        assert_eq!(reply.body, SnacBody::FeedbagStatus(Status::success(2)));
        assert_eq!(fx.feedbag.retrieve(alice.ident()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn inserting_online_buddy_emits_arrival_to_owner() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);
        let _bob = fx.registry.add("sid-b", ScreenName::new("bob"), 100);
        let mut alice_rx = alice.take_outbound().unwrap();

        let batch = ItemBatch::new(vec![FeedbagItem::buddy("bob", 1, 10)]);
        fx.service.insert_item(&alice, 1, &batch).await.unwrap();

        match try_recv_body(&mut alice_rx) {
            Some(SnacBody::BuddyArrived(arrived)) => {
                assert_eq!(arrived.user_info.screen_name, "bob");
            },
            other => panic!("expected arrival, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deny_makes_blocker_depart_for_blocked() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);
        let bob = fx.registry.add("sid-b", ScreenName::new("bob"), 100);
        let mut bob_rx = bob.take_outbound().unwrap();

        let batch = ItemBatch::new(vec![FeedbagItem::deny("bob", 1)]);
        fx.service.insert_item(&alice, 1, &batch).await.unwrap();

        match try_recv_body(&mut bob_rx) {
            Some(SnacBody::BuddyDeparted(departed)) => {
                assert_eq!(departed.user_info.screen_name, "alice");
            },
            other => panic!("expected departure, got {other:?}"),
        }

        // Re-denying the same pair emits nothing.
        let batch = ItemBatch::new(vec![FeedbagItem::deny("bob", 1)]);
        fx.service.insert_item(&alice, 2, &batch).await.unwrap();
        assert!(try_recv_body(&mut bob_rx).is_none());
    }

    #[tokio::test]
    async fn deleting_deny_reannounces_both_sides() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);
        let bob = fx.registry.add("sid-b", ScreenName::new("bob"), 100);

        let deny = ItemBatch::new(vec![FeedbagItem::deny("bob", 1)]);
        fx.service.insert_item(&alice, 1, &deny).await.unwrap();

        let mut alice_rx = alice.take_outbound().unwrap();
        let mut bob_rx = bob.take_outbound().unwrap();
        // Drain the departure bob received at deny time.
        while try_recv_body(&mut bob_rx).is_some() {}

        fx.service.delete_item(&alice, 2, &deny).await.unwrap();

        assert!(matches!(try_recv_body(&mut alice_rx), Some(SnacBody::BuddyArrived(_))));
        assert!(matches!(try_recv_body(&mut bob_rx), Some(SnacBody::BuddyArrived(_))));
    }

    #[tokio::test]
    async fn query_if_modified_returns_stub_when_unchanged() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);

        fx.env.set_wall_clock(100);
        let batch = ItemBatch::new(vec![
            FeedbagItem::buddy("bob", 1, 10),
            FeedbagItem::buddy("carol", 1, 11),
        ]);
        fx.service.insert_item(&alice, 1, &batch).await.unwrap();

        // Client's timestamp is after the store's.
        let reply = fx
            .service
            .query_if_modified(&alice, 2, QueryIfModified { last_update: 200, count: 2 })
            .await
            .unwrap();
        assert_eq!(
            reply.body,
            SnacBody::FeedbagReplyNotModified(ReplyNotModified { last_update: 100, count: 2 })
        );

        // Client's timestamp is before the store's: full reply.
        let reply = fx
            .service
            .query_if_modified(&alice, 3, QueryIfModified { last_update: 50, count: 2 })
            .await
            .unwrap();
        assert!(matches!(reply.body, SnacBody::FeedbagReply(_)));
    }

    #[tokio::test]
    async fn empty_list_has_zero_timestamp() {
        let fx = fixture();
        let alice = fx.registry.add("sid-a", ScreenName::new("alice"), 100);

        let reply = fx.service.query(&alice, 1).await.unwrap();
        match reply.body {
            SnacBody::FeedbagReply(r) => {
                assert!(r.items.is_empty());
                assert_eq!(r.last_update, 0);
            },
            other => panic!("expected reply, got {other:?}"),
        }
    }
}
