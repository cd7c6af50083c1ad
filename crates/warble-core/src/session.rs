//! Per-user session state and the outbound message queue.
//!
//! A session is one authenticated login: mutable presence state guarded by a
//! mutex, plus a single bounded FIFO of outbound SNACs. A writer task owns
//! the receiving end and serializes everything onto the connection; any
//! component may enqueue. Fan-out enqueues never block: a full queue means
//! the peer has stopped draining, and the session is closed as stuck.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use warble_proto::{
    SnacMessage, Tlv, TlvBlock, TlvUserInfo,
    user_info::{class, status, tags},
};

use crate::screen_name::{IdentScreenName, ScreenName};

/// Outbound FIFO capacity per session.
///
/// Generous for interactive traffic; only a wedged peer fills it.
pub const OUTBOUND_QUEUE_CAP: usize = 128;

/// Warning level ceiling (99.9%).
pub const MAX_WARNING: u16 = 0x03E7;

/// One queued item for the writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Marshal and send this SNAC.
    Message(SnacMessage),
    /// Send a Signoff frame and close the connection.
    Terminate,
    /// Send an Error frame and close the connection; used when the peer sent
    /// something unrecoverable.
    Abort,
}

/// Result of a non-blocking enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayResult {
    /// Message accepted.
    Sent,
    /// Queue full; the session has been closed as stuck.
    Stuck,
    /// Session already closed; message dropped.
    Closed,
}

#[derive(Debug)]
struct SessionState {
    warning: u16,
    signon_time: u64,
    idle_since: Option<u64>,
    invisible: bool,
    away_message: String,
    caps: Bytes,
    chat_room_cookie: Option<String>,
}

/// One authenticated, connected user.
///
/// Owned by exactly one [`crate::registry::SessionRegistry`] at a time and
/// shared by `Arc`. All mutable state sits behind a mutex so user-info blocks
/// are computed from a consistent snapshot.
#[derive(Debug)]
pub struct Session {
    id: String,
    screen_name: ScreenName,
    ident: IdentScreenName,
    state: Mutex<SessionState>,
    tx: mpsc::Sender<Outbound>,
    rx: Mutex<Option<mpsc::Receiver<Outbound>>>,
    closed: AtomicBool,
    close_tx: watch::Sender<bool>,
}

impl Session {
    /// Session with a fresh outbound queue.
    ///
    /// `signon_time` is the wall clock at creation, reported in user-info
    /// blocks for the lifetime of the login.
    #[must_use]
    pub fn new(id: impl Into<String>, screen_name: ScreenName, signon_time: u64) -> Self {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAP);
        let (close_tx, _) = watch::channel(false);
        let ident = screen_name.ident();
        Self {
            id: id.into(),
            screen_name,
            ident,
            state: Mutex::new(SessionState {
                warning: 0,
                signon_time,
                idle_since: None,
                invisible: false,
                away_message: String::new(),
                caps: Bytes::new(),
                chat_room_cookie: None,
            }),
            tx,
            rx: Mutex::new(Some(rx)),
            closed: AtomicBool::new(false),
            close_tx,
        }
    }

    /// Session id issued at login.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display-form screen name.
    #[must_use]
    pub fn screen_name(&self) -> &ScreenName {
        &self.screen_name
    }

    /// Identifier-form screen name.
    #[must_use]
    pub fn ident(&self) -> &IdentScreenName {
        &self.ident
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // A poisoned session mutex means a panic mid-update; propagating the
        // panic to every other connection would take the server down for one
        // bad session, so recover the inner value instead.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Current warning level.
    #[must_use]
    pub fn warning(&self) -> u16 {
        self.state().warning
    }

    /// Add warning units, saturating at [`MAX_WARNING`]. Returns the new
    /// level.
    pub fn incr_warning(&self, delta: u16) -> u16 {
        let mut state = self.state();
        state.warning = state.warning.saturating_add(delta).min(MAX_WARNING);
        state.warning
    }

    /// Signon time, epoch seconds.
    #[must_use]
    pub fn signon_time(&self) -> u64 {
        self.state().signon_time
    }

    /// Mark the session idle since `now - idle_seconds`.
    pub fn set_idle(&self, idle_seconds: u64, now: u64) {
        self.state().idle_since = Some(now.saturating_sub(idle_seconds));
    }

    /// Clear idle state.
    pub fn set_active(&self) {
        self.state().idle_since = None;
    }

    /// Whether the session is invisible to presence fan-out.
    #[must_use]
    pub fn invisible(&self) -> bool {
        self.state().invisible
    }

    /// Toggle invisibility. Returns the previous value.
    pub fn set_invisible(&self, invisible: bool) -> bool {
        std::mem::replace(&mut self.state().invisible, invisible)
    }

    /// Current away message; empty when available.
    #[must_use]
    pub fn away_message(&self) -> String {
        self.state().away_message.clone()
    }

    /// Replace the away message. Empty clears it.
    pub fn set_away_message(&self, message: impl Into<String>) {
        self.state().away_message = message.into();
    }

    /// Replace the advertised capability blob.
    pub fn set_caps(&self, caps: Bytes) {
        self.state().caps = caps;
    }

    /// Cookie of the chat room this session is bound to, if any.
    #[must_use]
    pub fn chat_room_cookie(&self) -> Option<String> {
        self.state().chat_room_cookie.clone()
    }

    /// Bind the session to a chat room.
    pub fn set_chat_room_cookie(&self, cookie: impl Into<String>) {
        self.state().chat_room_cookie = Some(cookie.into());
    }

    /// User-info block from an atomic snapshot of the session state.
    #[must_use]
    pub fn user_info(&self, now: u64) -> TlvUserInfo {
        let state = self.state();

        let mut user_class = class::FREE;
        if !state.away_message.is_empty() {
            user_class |= class::AWAY;
        }

        let mut tlvs = TlvBlock::new();
        tlvs.push(Tlv::u16(tags::USER_CLASS, user_class));
        tlvs.push(Tlv::u32(tags::SIGNON_TOD, state.signon_time as u32));
        tlvs.push(Tlv::u32(
            tags::USER_STATUS,
            if state.invisible { status::INVISIBLE } else { status::VISIBLE },
        ));
        if let Some(since) = state.idle_since {
            let idle_minutes = now.saturating_sub(since) / 60;
            tlvs.push(Tlv::u16(tags::IDLE_TIME, idle_minutes.min(u64::from(u16::MAX)) as u16));
        }
        if !state.caps.is_empty() {
            tlvs.push(Tlv::new(tags::CAPABILITIES, state.caps.clone()));
        }

        TlvUserInfo::new(self.screen_name.as_str(), state.warning, tlvs)
    }

    /// Non-blocking enqueue for fan-out.
    ///
    /// A full queue closes the session: the peer has stopped draining and
    /// holding the sender's request hostage on it would stall the fleet.
    pub fn relay(&self, msg: SnacMessage) -> RelayResult {
        if self.closed.load(Ordering::Acquire) {
            return RelayResult::Closed;
        }
        match self.tx.try_send(Outbound::Message(msg)) {
            Ok(()) => RelayResult::Sent,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(session = %self.ident, "outbound queue full, closing stuck session");
                self.close();
                RelayResult::Stuck
            },
            Err(mpsc::error::TrySendError::Closed(_)) => RelayResult::Closed,
        }
    }

    /// Blocking enqueue for responses on the session's own connection.
    ///
    /// Applies backpressure to the requesting client instead of closing it.
    pub async fn send(&self, msg: SnacMessage) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let _ = self.tx.send(Outbound::Message(msg)).await;
    }

    /// Take the queue's receiving end; the writer task calls this once.
    #[must_use]
    pub fn take_outbound(&self) -> Option<mpsc::Receiver<Outbound>> {
        match self.rx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Watch handle that flips to `true` when the session closes.
    #[must_use]
    pub fn closed_watch(&self) -> watch::Receiver<bool> {
        self.close_tx.subscribe()
    }

    /// Whether the session has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the outbound stream exactly once.
    ///
    /// Idempotent: later calls are no-ops. The writer observes either the
    /// queued [`Outbound::Terminate`] or the close watch, whichever first.
    pub fn close(&self) {
        self.close_with(Outbound::Terminate);
    }

    /// Close with an Error frame instead of a Signoff; same once-only
    /// semantics as [`Session::close`].
    pub fn abort(&self) {
        self.close_with(Outbound::Abort);
    }

    fn close_with(&self, last: Outbound) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.tx.try_send(last);
        let _ = self.close_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("sid-1", ScreenName::new("Chatting Chuck"), 1_000_000)
    }

    #[test]
    fn warning_saturates_at_ceiling() {
        let sess = session();
        assert_eq!(sess.incr_warning(100), 100);
        assert_eq!(sess.incr_warning(950), MAX_WARNING);
        assert_eq!(sess.warning(), MAX_WARNING);
    }

    #[test]
    fn user_info_reflects_away_and_idle() {
        let sess = session();
        sess.set_away_message("brb");
        sess.set_idle(300, 1_000_300);

        let info = sess.user_info(1_000_300);
        assert_eq!(info.screen_name, "Chatting Chuck");
        let user_class = info.tlvs.u16(tags::USER_CLASS).unwrap().unwrap();
        assert_ne!(user_class & class::AWAY, 0);
        assert_eq!(info.tlvs.u16(tags::IDLE_TIME).unwrap().unwrap(), 5);
    }

    #[test]
    fn user_info_reports_invisibility() {
        let sess = session();
        sess.set_invisible(true);

        let info = sess.user_info(1_000_000);
        assert_eq!(info.tlvs.u32(tags::USER_STATUS).unwrap().unwrap(), status::INVISIBLE);
    }

    #[test]
    fn close_is_idempotent() {
        let sess = session();
        let mut rx = sess.take_outbound().unwrap();

        sess.close();
        sess.close();

        assert_eq!(rx.try_recv().unwrap(), Outbound::Terminate);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn relay_after_close_is_dropped() {
        let sess = session();
        sess.close();

        let msg = SnacMessage::push(warble_proto::SnacBody::FeedbagQuery);
        assert_eq!(sess.relay(msg), RelayResult::Closed);
    }

    #[test]
    fn full_queue_marks_session_stuck() {
        let sess = session();
        let _rx = sess.take_outbound().unwrap();

        let msg = SnacMessage::push(warble_proto::SnacBody::FeedbagQuery);
        // One slot is consumed by Terminate once the queue jams, so fill
        // every slot first.
        for _ in 0..OUTBOUND_QUEUE_CAP {
            assert_eq!(sess.relay(msg.clone()), RelayResult::Sent);
        }
        assert_eq!(sess.relay(msg.clone()), RelayResult::Stuck);
        assert!(sess.is_closed());
        assert_eq!(sess.relay(msg), RelayResult::Closed);
    }

    #[tokio::test]
    async fn send_enqueues_in_order() {
        let sess = session();
        let mut rx = sess.take_outbound().unwrap();

        let a = SnacMessage::reply(1, warble_proto::SnacBody::FeedbagQuery);
        let b = SnacMessage::reply(2, warble_proto::SnacBody::IcbmParameterQuery);
        sess.send(a.clone()).await;
        sess.send(b.clone()).await;

        assert_eq!(rx.recv().await.unwrap(), Outbound::Message(a));
        assert_eq!(rx.recv().await.unwrap(), Outbound::Message(b));
    }
}
