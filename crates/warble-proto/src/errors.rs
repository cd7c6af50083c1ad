//! Protocol error types.

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire data.
///
/// Decoding errors are fatal for the connection that produced them: a peer
/// that sends a malformed frame cannot be resynchronized, because FLAP
/// framing carries no resync marker beyond the start byte.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Ran out of bytes while a fixed-size field still needed more.
    #[error("unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the current field required.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// First byte of a FLAP frame was not the `0x2A` start marker.
    #[error("invalid FLAP start marker: {0:#04x}")]
    BadFlapMarker(u8),

    /// FLAP frame type byte outside the known range (1..=5).
    #[error("unknown FLAP frame type: {0:#04x}")]
    UnknownFlapType(u8),

    /// Payload or value too large for its length-prefix width.
    #[error("value of {len} bytes exceeds the {max}-byte limit of its length prefix")]
    ValueTooLong {
        /// Actual value length.
        len: usize,
        /// Maximum the prefix can express.
        max: usize,
    },

    /// A required TLV tag was absent from a block.
    #[error("required TLV {0:#06x} not present")]
    TagNotFound(u16),

    /// No body codec registered for this `(food group, subgroup)` pair.
    #[error("unsupported SNAC ({food_group:#06x}, {subgroup:#06x})")]
    UnsupportedSnac {
        /// Food group from the SNAC frame.
        food_group: u16,
        /// Subgroup from the SNAC frame.
        subgroup: u16,
    },

    /// A length-prefixed string field was not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidString,

    /// Structurally invalid body with a specific reason.
    #[error("malformed body: {0}")]
    Malformed(&'static str),
}
