//! Presence fan-out.
//!
//! Arrival and departure events flow to the "interested users" of a session:
//! everyone whose feedbag lists it as a buddy with no deny in either
//! direction. The feedbag store computes that set; delivery goes through the
//! main session registry's best-effort relays.

use std::sync::Arc;

use warble_core::{FeedbagStore, Session, SessionRegistry, StoreError};
use warble_proto::{
    SnacBody, SnacMessage, TlvUserInfo,
    snacs::buddy::{Arrived, Departed},
};

/// Emits buddy arrival/departure SNACs to interested users.
pub struct PresenceNotifier<F> {
    registry: Arc<SessionRegistry>,
    feedbag: Arc<F>,
}

impl<F: FeedbagStore> PresenceNotifier<F> {
    /// Notifier over the main registry and the feedbag store.
    pub fn new(registry: Arc<SessionRegistry>, feedbag: Arc<F>) -> Self {
        Self { registry, feedbag }
    }

    fn arrived(info: TlvUserInfo) -> SnacMessage {
        SnacMessage::push(SnacBody::BuddyArrived(Arrived { user_info: info }))
    }

    fn departed(session: &Session) -> SnacMessage {
        // Departures carry the bare record only; a populated TLV block makes
        // legacy clients mis-parse the event.
        SnacMessage::push(SnacBody::BuddyDeparted(Departed {
            user_info: TlvUserInfo::bare(session.screen_name().as_str(), session.warning()),
        }))
    }

    /// Announce the session to every interested user.
    ///
    /// Invisible sessions are never announced.
    pub async fn broadcast_arrival(&self, session: &Session, now: u64) -> Result<(), StoreError> {
        if session.invisible() {
            return Ok(());
        }
        let recipients = self.feedbag.adjacent_users(session.ident()).await?;
        tracing::debug!(
            screen_name = %session.ident(),
            recipients = recipients.len(),
            "arrival fan-out"
        );
        self.registry.relay_to_screen_names(&recipients, &Self::arrived(session.user_info(now)));
        Ok(())
    }

    /// Announce the session's departure to every interested user.
    pub async fn broadcast_departure(&self, session: &Session) -> Result<(), StoreError> {
        let recipients = self.feedbag.adjacent_users(session.ident()).await?;
        tracing::debug!(
            screen_name = %session.ident(),
            recipients = recipients.len(),
            "departure fan-out"
        );
        self.registry.relay_to_screen_names(&recipients, &Self::departed(session));
        Ok(())
    }

    /// Tell `to` that `from` arrived.
    pub fn unicast_arrival(&self, from: &Session, to: &Session, now: u64) {
        to.relay(Self::arrived(from.user_info(now)));
    }

    /// Tell `to` that `from` departed (or now appears offline).
    pub fn unicast_departure(&self, from: &Session, to: &Session) {
        to.relay(Self::departed(from));
    }
}

#[cfg(test)]
mod tests {
    use warble_core::{MemoryFeedbagStore, ScreenName, session::Outbound};
    use warble_proto::snacs::feedbag::FeedbagItem;

    use super::*;

    fn fixture() -> (Arc<SessionRegistry>, Arc<MemoryFeedbagStore>) {
        (Arc::new(SessionRegistry::new()), Arc::new(MemoryFeedbagStore::new()))
    }

    fn recv_body(rx: &mut tokio::sync::mpsc::Receiver<Outbound>) -> SnacBody {
        match rx.try_recv().unwrap() {
            Outbound::Message(msg) => msg.body,
            other => panic!("unexpected outbound item: {other:?}"),
        }
    }

    #[tokio::test]
    async fn arrival_reaches_adjacent_users_only() {
        let (registry, feedbag) = fixture();
        let presence = PresenceNotifier::new(Arc::clone(&registry), Arc::clone(&feedbag));

        let alice = registry.add("sid-a", ScreenName::new("alice"), 100);
        let bob = registry.add("sid-b", ScreenName::new("bob"), 100);
        let carol = registry.add("sid-c", ScreenName::new("carol"), 100);
        let mut bob_rx = bob.take_outbound().unwrap();
        let mut carol_rx = carol.take_outbound().unwrap();

        // Only bob watches alice.
        feedbag
            .upsert(&"bob".into(), &[FeedbagItem::buddy("alice", 1, 1)], 100)
            .await
            .unwrap();

        presence.broadcast_arrival(&alice, 100).await.unwrap();

        match recv_body(&mut bob_rx) {
            SnacBody::BuddyArrived(arrived) => {
                assert_eq!(arrived.user_info.screen_name, "alice");
            },
            other => panic!("expected arrival, got {other:?}"),
        }
        assert!(carol_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn invisible_sessions_are_not_announced() {
        let (registry, feedbag) = fixture();
        let presence = PresenceNotifier::new(Arc::clone(&registry), Arc::clone(&feedbag));

        let alice = registry.add("sid-a", ScreenName::new("alice"), 100);
        let bob = registry.add("sid-b", ScreenName::new("bob"), 100);
        let mut bob_rx = bob.take_outbound().unwrap();

        feedbag
            .upsert(&"bob".into(), &[FeedbagItem::buddy("alice", 1, 1)], 100)
            .await
            .unwrap();

        alice.set_invisible(true);
        presence.broadcast_arrival(&alice, 100).await.unwrap();
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn departure_carries_bare_user_info() {
        let (registry, feedbag) = fixture();
        let presence = PresenceNotifier::new(Arc::clone(&registry), Arc::clone(&feedbag));

        let alice = registry.add("sid-a", ScreenName::new("alice"), 100);
        let bob = registry.add("sid-b", ScreenName::new("bob"), 100);
        let mut bob_rx = bob.take_outbound().unwrap();

        feedbag
            .upsert(&"bob".into(), &[FeedbagItem::buddy("alice", 1, 1)], 100)
            .await
            .unwrap();

        alice.incr_warning(30);
        presence.broadcast_departure(&alice).await.unwrap();

        match recv_body(&mut bob_rx) {
            SnacBody::BuddyDeparted(departed) => {
                assert_eq!(departed.user_info.screen_name, "alice");
                assert_eq!(departed.user_info.warning_level, 30);
                assert!(departed.user_info.tlvs.is_empty());
            },
            other => panic!("expected departure, got {other:?}"),
        }
    }
}
