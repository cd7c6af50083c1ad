//! Alert food group handlers.
//!
//! AIM 5.x clients send capability notifications during signon. There is no
//! alert backend; the notifications are accepted silently so signon finishes
//! clean.

use warble_core::Session;
use warble_proto::snacs::alert::Notify;

/// Alert handler: accepts and discards capability notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertService;

impl AlertService {
    /// `NotifyCapabilities` / `NotifyDisplayCapabilities`: log and drop.
    pub fn notify(&self, session: &Session, body: &Notify) {
        tracing::debug!(
            screen_name = %session.ident(),
            tlv_count = body.tlvs.len(),
            "alert capabilities accepted"
        );
    }
}
