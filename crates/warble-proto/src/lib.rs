//! Wire protocol types for the Warble OSCAR server.
//!
//! The legacy AIM/ICQ protocol stacks three layers:
//!
//! - [`flap`]: link-level frames with a start marker, type byte, and
//!   per-connection sequence numbers
//! - [`snac`] + [`snacs`]: typed request/response units identified by a
//!   `(food group, subgroup)` pair inside Data frames
//! - [`tlv`]: tag-length-value fields composing most SNAC bodies
//!
//! Everything here is pure codec: no I/O, no session state. Decoding is
//! zero-copy where the layout allows ([`bytes::Bytes`] slices), and every
//! body type round-trips byte-exactly, TLV order included.

mod cookie;
pub mod errors;
pub mod flap;
pub mod snac;
pub mod snacs;
pub mod tlv;
pub mod user_info;
pub mod wire;

pub use cookie::ChatCookie;
pub use errors::{ProtocolError, Result};
pub use flap::{FLAP_MARKER, FlapFrame, FlapHeader, FlapType, SignonFrame, TAG_LOGIN_COOKIE};
pub use snac::{ErrorCode, SnacFrame, foodgroup};
pub use snacs::{SnacBody, SnacMessage};
pub use tlv::{Tlv, TlvBlock};
pub use user_info::TlvUserInfo;
