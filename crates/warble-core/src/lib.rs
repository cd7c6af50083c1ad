//! Session, registry, and store layer for the Warble OSCAR server.
//!
//! This crate is pure state machinery with no sockets: sessions with bounded
//! outbound queues, the screen-name-keyed session registry, the chat room
//! registry, and the async store traits the services consume. The server
//! crate wires these to real connections; tests drive them directly.

pub mod chat;
pub mod env;
pub mod registry;
pub mod screen_name;
pub mod session;
pub mod stores;

pub use chat::{ChatError, ChatRegistry, ChatRoom};
pub use env::Environment;
pub use registry::SessionRegistry;
pub use screen_name::{IdentScreenName, ScreenName};
pub use session::{MAX_WARNING, Outbound, RelayResult, Session};
pub use stores::{
    BlockedState, FeedbagStore, MemoryFeedbagStore, MemoryProfileStore, MemoryUserStore,
    ProfileStore, StoreError, User, UserStore, compute_password_hash,
};
