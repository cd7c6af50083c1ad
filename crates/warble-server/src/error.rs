//! Server error types.

use warble_core::{ChatError, StoreError};
use warble_proto::ProtocolError;

/// Errors that can occur while serving a connection.
///
/// All of these are fatal for the connection that produced them; protocol
/// conditions that map to an error SNAC never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Malformed wire data; the connection cannot be resynchronized.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A backing store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Chat room registry failure that no handler mapped to a SNAC error.
    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    /// Socket failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Signon presented a cookie that resolves to no session.
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// Connection idle past the configured read deadline.
    #[error("read deadline expired")]
    ReadTimeout,

    /// Startup configuration problem.
    #[error("configuration error: {0}")]
    Config(String),
}
