//! In-memory store implementations.
//!
//! `HashMap`s behind mutexes, shared by `Arc`-cloning the store value.
//! Nothing here survives a restart; these are the development and test
//! backends.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use warble_proto::snacs::feedbag::{ClassId, FeedbagItem};

use super::{BlockedState, FeedbagStore, ProfileStore, StoreError, User, UserStore};
use crate::screen_name::IdentScreenName;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// In-memory account store.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<Mutex<HashMap<IdentScreenName, User>>>,
}

impl MemoryUserStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user(&self, ident: &IdentScreenName) -> Result<Option<User>, StoreError> {
        Ok(lock(&self.users).get(ident).cloned())
    }

    async fn upsert_user(&self, user: User) -> Result<(), StoreError> {
        lock(&self.users).insert(user.screen_name.ident(), user);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FeedbagRecord {
    items: Vec<FeedbagItem>,
    last_modified: u64,
}

impl FeedbagRecord {
    fn touch(&mut self, now: u64) {
        // Monotonic even when mutations land within the same second.
        self.last_modified = now.max(self.last_modified + 1);
    }

    fn denies(&self, target: &IdentScreenName) -> bool {
        self.items
            .iter()
            .any(|i| i.class_id == ClassId::Deny && IdentScreenName::from(i.name.as_str()) == *target)
    }

    fn lists_buddy(&self, target: &IdentScreenName) -> bool {
        self.items
            .iter()
            .any(|i| i.class_id == ClassId::Buddy && IdentScreenName::from(i.name.as_str()) == *target)
    }
}

/// In-memory feedbag store.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeedbagStore {
    feedbags: Arc<Mutex<HashMap<IdentScreenName, FeedbagRecord>>>,
}

impl MemoryFeedbagStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbagStore for MemoryFeedbagStore {
    async fn retrieve(&self, owner: &IdentScreenName) -> Result<Vec<FeedbagItem>, StoreError> {
        Ok(lock(&self.feedbags).get(owner).map(|r| r.items.clone()).unwrap_or_default())
    }

    async fn last_modified(&self, owner: &IdentScreenName) -> Result<u64, StoreError> {
        Ok(lock(&self.feedbags).get(owner).map_or(0, |r| r.last_modified))
    }

    async fn upsert(
        &self,
        owner: &IdentScreenName,
        items: &[FeedbagItem],
        now: u64,
    ) -> Result<(), StoreError> {
        let mut feedbags = lock(&self.feedbags);
        let record = feedbags.entry(owner.clone()).or_default();
        for item in items {
            match record
                .items
                .iter_mut()
                .find(|i| i.class_id == item.class_id && i.item_id == item.item_id)
            {
                Some(existing) => *existing = item.clone(),
                None => record.items.push(item.clone()),
            }
        }
        record.touch(now);
        Ok(())
    }

    async fn delete(
        &self,
        owner: &IdentScreenName,
        items: &[FeedbagItem],
        now: u64,
    ) -> Result<(), StoreError> {
        let mut feedbags = lock(&self.feedbags);
        let Some(record) = feedbags.get_mut(owner) else {
            return Ok(());
        };
        record
            .items
            .retain(|i| !items.iter().any(|d| d.class_id == i.class_id && d.item_id == i.item_id));
        record.touch(now);
        Ok(())
    }

    async fn buddies(
        &self,
        owner: &IdentScreenName,
    ) -> Result<Vec<IdentScreenName>, StoreError> {
        Ok(lock(&self.feedbags).get(owner).map_or_else(Vec::new, |r| {
            r.items
                .iter()
                .filter(|i| i.class_id == ClassId::Buddy)
                .map(|i| IdentScreenName::from(i.name.as_str()))
                .collect()
        }))
    }

    async fn adjacent_users(
        &self,
        owner: &IdentScreenName,
    ) -> Result<Vec<IdentScreenName>, StoreError> {
        let feedbags = lock(&self.feedbags);
        let owner_denies: Option<&FeedbagRecord> = feedbags.get(owner);
        let mut out = Vec::new();
        for (other, record) in feedbags.iter() {
            if other == owner || !record.lists_buddy(owner) {
                continue;
            }
            if record.denies(owner) || owner_denies.is_some_and(|r| r.denies(other)) {
                continue;
            }
            out.push(other.clone());
        }
        out.sort();
        Ok(out)
    }

    async fn blocked_state(
        &self,
        a: &IdentScreenName,
        b: &IdentScreenName,
    ) -> Result<BlockedState, StoreError> {
        let feedbags = lock(&self.feedbags);
        let a_denies_b = feedbags.get(a).is_some_and(|r| r.denies(b));
        let b_denies_a = feedbags.get(b).is_some_and(|r| r.denies(a));
        Ok(match (a_denies_b, b_denies_a) {
            (false, false) => BlockedState::NotBlocked,
            (true, false) => BlockedState::FirstBlocksSecond,
            (false, true) => BlockedState::SecondBlocksFirst,
            (true, true) => BlockedState::Mutual,
        })
    }
}

/// In-memory profile store.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<Mutex<HashMap<IdentScreenName, String>>>,
}

impl MemoryProfileStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn retrieve_profile(&self, owner: &IdentScreenName) -> Result<String, StoreError> {
        Ok(lock(&self.profiles).get(owner).cloned().unwrap_or_default())
    }

    async fn upsert_profile(
        &self,
        owner: &IdentScreenName,
        body: String,
    ) -> Result<(), StoreError> {
        lock(&self.profiles).insert(owner.clone(), body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> IdentScreenName {
        IdentScreenName::from(name)
    }

    #[tokio::test]
    async fn upsert_replaces_matching_item_id() {
        let store = MemoryFeedbagStore::new();
        let owner = ident("alice");

        let item = FeedbagItem::buddy("bob", 1, 10);
        store.upsert(&owner, &[item.clone()], 100).await.unwrap();
        store.upsert(&owner, &[item.clone()], 150).await.unwrap();

        let items = store.retrieve(&owner).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0], item);
    }

    #[tokio::test]
    async fn last_modified_is_monotonic() {
        let store = MemoryFeedbagStore::new();
        let owner = ident("alice");

        store.upsert(&owner, &[FeedbagItem::buddy("bob", 1, 10)], 100).await.unwrap();
        let first = store.last_modified(&owner).await.unwrap();
        assert_eq!(first, 100);

        // Same wall-clock second; timestamp still advances.
        store.upsert(&owner, &[FeedbagItem::buddy("carol", 1, 11)], 100).await.unwrap();
        let second = store.last_modified(&owner).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn empty_feedbag_has_zero_timestamp() {
        let store = MemoryFeedbagStore::new();
        assert_eq!(store.last_modified(&ident("nobody")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_removes_by_class_and_item_id() {
        let store = MemoryFeedbagStore::new();
        let owner = ident("alice");

        store
            .upsert(
                &owner,
                &[FeedbagItem::buddy("bob", 1, 10), FeedbagItem::deny("mallory", 20)],
                100,
            )
            .await
            .unwrap();
        store.delete(&owner, &[FeedbagItem::deny("mallory", 20)], 200).await.unwrap();

        let items = store.retrieve(&owner).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "bob");
    }

    #[tokio::test]
    async fn adjacent_users_requires_buddy_and_no_deny() {
        let store = MemoryFeedbagStore::new();

        // bob and carol both list alice; carol blocks alice.
        store.upsert(&ident("bob"), &[FeedbagItem::buddy("alice", 1, 1)], 100).await.unwrap();
        store
            .upsert(
                &ident("carol"),
                &[FeedbagItem::buddy("alice", 1, 1), FeedbagItem::deny("alice", 2)],
                100,
            )
            .await
            .unwrap();

        let adjacent = store.adjacent_users(&ident("alice")).await.unwrap();
        assert_eq!(adjacent, vec![ident("bob")]);
    }

    #[tokio::test]
    async fn adjacent_users_excludes_watchers_the_owner_blocks() {
        let store = MemoryFeedbagStore::new();

        store.upsert(&ident("bob"), &[FeedbagItem::buddy("alice", 1, 1)], 100).await.unwrap();
        store.upsert(&ident("alice"), &[FeedbagItem::deny("bob", 1)], 100).await.unwrap();

        let adjacent = store.adjacent_users(&ident("alice")).await.unwrap();
        assert!(adjacent.is_empty());
    }

    #[tokio::test]
    async fn blocked_state_covers_all_directions() {
        let store = MemoryFeedbagStore::new();
        let a = ident("a");
        let b = ident("b");

        assert_eq!(store.blocked_state(&a, &b).await.unwrap(), BlockedState::NotBlocked);

        store.upsert(&a, &[FeedbagItem::deny("b", 1)], 100).await.unwrap();
        assert_eq!(store.blocked_state(&a, &b).await.unwrap(), BlockedState::FirstBlocksSecond);
        assert_eq!(store.blocked_state(&b, &a).await.unwrap(), BlockedState::SecondBlocksFirst);

        store.upsert(&b, &[FeedbagItem::deny("a", 1)], 100).await.unwrap();
        assert_eq!(store.blocked_state(&a, &b).await.unwrap(), BlockedState::Mutual);
    }

    #[tokio::test]
    async fn blocked_state_uses_normalized_names() {
        let store = MemoryFeedbagStore::new();
        store
            .upsert(&ident("alice"), &[FeedbagItem::deny("Bad Guy", 1)], 100)
            .await
            .unwrap();
        assert_eq!(
            store.blocked_state(&ident("alice"), &ident("badguy")).await.unwrap(),
            BlockedState::FirstBlocksSecond
        );
    }

    #[tokio::test]
    async fn profile_store_round_trip() {
        let store = MemoryProfileStore::new();
        let owner = ident("alice");

        assert_eq!(store.retrieve_profile(&owner).await.unwrap(), "");
        store.upsert_profile(&owner, "<html>hi</html>".to_string()).await.unwrap();
        assert_eq!(store.retrieve_profile(&owner).await.unwrap(), "<html>hi</html>");
    }
}
