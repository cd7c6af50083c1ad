//! Persistent store abstractions.
//!
//! The core consumes three trait-shaped stores: accounts, feedbags, and
//! profiles. The traits are async so a database-backed implementation can
//! drop in; the in-memory implementations in [`memory`] are the default
//! backends and the test fixtures.

mod memory;

use async_trait::async_trait;
use md5::{Digest, Md5};
pub use memory::{MemoryFeedbagStore, MemoryProfileStore, MemoryUserStore};
use warble_proto::snacs::{bucp::HASH_SALT, feedbag::FeedbagItem};

use crate::screen_name::{IdentScreenName, ScreenName};

/// Store operation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not complete the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Display-form screen name.
    pub screen_name: ScreenName,
    /// Random per-account salt mixed into the login hash.
    pub auth_key: String,
    /// `md5(authKey || md5(password) || salt)` for the account password.
    pub password_hash: Vec<u8>,
}

impl User {
    /// Account with a hash derived from `password` under `auth_key`.
    pub fn with_password(
        screen_name: ScreenName,
        auth_key: impl Into<String>,
        password: &str,
    ) -> Self {
        let auth_key = auth_key.into();
        let password_hash = compute_password_hash(&auth_key, password);
        Self { screen_name, auth_key, password_hash }
    }

    /// Whether the client-supplied hash matches this account's password.
    #[must_use]
    pub fn hash_matches(&self, candidate: &[u8]) -> bool {
        self.password_hash == candidate
    }
}

/// The weak MD5 login hash fixed by the protocol:
/// `md5(authKey || md5(password) || "AOL Instant Messenger (SM)")`.
#[must_use]
pub fn compute_password_hash(auth_key: &str, password: &str) -> Vec<u8> {
    let inner = Md5::digest(password.as_bytes());
    let mut outer = Md5::new();
    outer.update(auth_key.as_bytes());
    outer.update(inner);
    outer.update(HASH_SALT);
    outer.finalize().to_vec()
}

/// Block relationship for an ordered screen-name pair `(a, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockedState {
    /// Neither side blocks the other.
    NotBlocked,
    /// `a` has a deny entry for `b`.
    FirstBlocksSecond,
    /// `b` has a deny entry for `a`.
    SecondBlocksFirst,
    /// Both directions are denied.
    Mutual,
}

impl BlockedState {
    /// Whether either side blocks the other.
    #[must_use]
    pub fn is_blocked(self) -> bool {
        self != Self::NotBlocked
    }
}

/// Account lookup and persistence.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Account by normalized screen name, or `None` if unregistered.
    async fn get_user(&self, ident: &IdentScreenName) -> Result<Option<User>, StoreError>;

    /// Insert or replace an account.
    async fn upsert_user(&self, user: User) -> Result<(), StoreError>;
}

/// Server-stored buddy list persistence and derived relationship queries.
#[async_trait]
pub trait FeedbagStore: Send + Sync + 'static {
    /// All of an owner's items in storage order.
    async fn retrieve(&self, owner: &IdentScreenName) -> Result<Vec<FeedbagItem>, StoreError>;

    /// List timestamp in epoch seconds; zero when the list is empty.
    async fn last_modified(&self, owner: &IdentScreenName) -> Result<u64, StoreError>;

    /// Insert or replace items, keyed per owner on `(class, item id)`.
    ///
    /// Advances the list timestamp monotonically even if the wall clock has
    /// not moved since the previous mutation.
    async fn upsert(
        &self,
        owner: &IdentScreenName,
        items: &[FeedbagItem],
        now: u64,
    ) -> Result<(), StoreError>;

    /// Delete items keyed on `(class, item id)`; unknown keys are ignored.
    async fn delete(
        &self,
        owner: &IdentScreenName,
        items: &[FeedbagItem],
        now: u64,
    ) -> Result<(), StoreError>;

    /// Screen names the owner lists as buddies.
    async fn buddies(&self, owner: &IdentScreenName)
    -> Result<Vec<IdentScreenName>, StoreError>;

    /// Presence fan-out recipients: users listing `owner` as a buddy with no
    /// deny in either direction.
    async fn adjacent_users(
        &self,
        owner: &IdentScreenName,
    ) -> Result<Vec<IdentScreenName>, StoreError>;

    /// Block relationship for the ordered pair `(a, b)`.
    async fn blocked_state(
        &self,
        a: &IdentScreenName,
        b: &IdentScreenName,
    ) -> Result<BlockedState, StoreError>;
}

/// Profile body persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    /// Stored profile body; empty string when none was set.
    async fn retrieve_profile(&self, owner: &IdentScreenName) -> Result<String, StoreError>;

    /// Insert or replace the profile body.
    async fn upsert_profile(
        &self,
        owner: &IdentScreenName,
        body: String,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_matches_reference_construction() {
        // Independently computed: md5("K" || md5("pw") || salt).
        let hash = compute_password_hash("K", "pw");
        assert_eq!(hash.len(), 16);

        let mut outer = Md5::new();
        outer.update(b"K");
        outer.update(Md5::digest(b"pw"));
        outer.update(b"AOL Instant Messenger (SM)");
        assert_eq!(hash, outer.finalize().to_vec());
    }

    #[test]
    fn user_with_password_round_trips() {
        let user = User::with_password(ScreenName::new("alice"), "K", "pw");
        assert!(user.hash_matches(&compute_password_hash("K", "pw")));
        assert!(!user.hash_matches(&compute_password_hash("K", "wrong")));
        assert!(!user.hash_matches(&compute_password_hash("L", "pw")));
    }
}
