//! Chat-service handoff cookie.
//!
//! When the main service redirects a client to the chat service, it issues an
//! opaque cookie binding the target room to the requester's session:
//!
//! `cookieLen(be16) | roomCookie[cookieLen] | sessionId(len8)`
//!
//! The cookie is never signed; both services run in the same trust domain and
//! the chat service validates it against a pending room registration instead.

use bytes::{BufMut, Bytes};

use crate::{errors::Result, wire};

/// Handoff token presented at chat-service signon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCookie {
    /// Cookie of the room the client was invited into.
    pub room_cookie: String,
    /// Main-service session id of the reconnecting user.
    pub session_id: String,
}

impl ChatCookie {
    /// Cookie binding a room to a session.
    #[must_use]
    pub fn new(room_cookie: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self { room_cookie: room_cookie.into(), session_id: session_id.into() }
    }

    /// Decode a cookie from its wire form.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let room_cookie = wire::read_string16(buf)?;
        let session_id = wire::read_string8(buf)?;
        Ok(Self { room_cookie, session_id })
    }

    /// Encode the cookie to its wire form.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        wire::write_string16(buf, &self.room_cookie)?;
        wire::write_string8(buf, &self.session_id)
    }

    /// Encoded cookie as a standalone byte blob, for embedding in a TLV.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}
