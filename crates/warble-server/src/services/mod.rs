//! Per-food-group request handlers.
//!
//! Each service holds the registries and stores it needs and exposes one
//! method per operation. Handlers perform their fan-out (relays to other
//! sessions) before returning, and return the SNACs destined for the
//! requesting connection; the dispatcher enqueues those afterwards, so
//! presence side-effects always precede the triggering request's response.

pub mod alert;
pub mod auth;
pub mod buddy;
pub mod chat;
pub mod chat_nav;
pub mod feedbag;
pub mod icbm;
pub mod locate;
pub mod oservice;

pub use alert::AlertService;
pub use auth::AuthService;
pub use buddy::BuddyService;
pub use chat::ChatService;
pub use chat_nav::ChatNavService;
pub use feedbag::FeedbagService;
pub use icbm::IcbmService;
pub use locate::LocateService;
pub use oservice::OService;
