//! Chat rooms and the cookie-keyed room registry.
//!
//! Every room pairs its metadata with a dedicated participant
//! [`SessionRegistry`]. Rooms are created by ChatNav, entered through the
//! chat service after a cookie handoff, and deleted when the participant
//! registry empties. Create, retrieve, and remove serialize on one lock so
//! removal cannot race a concurrent join on the same cookie.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use warble_proto::{
    Tlv, TlvBlock,
    snacs::chat::{RoomDescriptor, room_tags},
};

use crate::registry::SessionRegistry;

/// Errors from room registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// No room registered under the cookie.
    #[error("chat room not found: {0}")]
    RoomNotFound(String),
}

/// Metadata identifying one chat room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRoom {
    /// Globally unique room cookie.
    pub cookie: String,
    /// Exchange the room lives on.
    pub exchange: u16,
    /// Instance number.
    pub instance: u16,
    /// Detail level from the creation request.
    pub detail_level: u8,
    /// Display name.
    pub name: String,
    /// Creation time, epoch seconds.
    pub created_at: u64,
}

impl ChatRoom {
    /// Wire descriptor for this room, with name and creation-time TLVs.
    #[must_use]
    pub fn descriptor(&self) -> RoomDescriptor {
        RoomDescriptor {
            exchange: self.exchange,
            cookie: self.cookie.clone(),
            instance: self.instance,
            detail_level: self.detail_level,
            tlvs: TlvBlock::from_tlvs(vec![
                Tlv::string(room_tags::ROOM_NAME, &self.name),
                Tlv::u32(room_tags::CREATION_TIME, self.created_at as u32),
            ]),
        }
    }
}

#[derive(Clone)]
struct Entry {
    room: ChatRoom,
    participants: Arc<SessionRegistry>,
}

/// Registry of rooms keyed by cookie.
#[derive(Default)]
pub struct ChatRegistry {
    inner: Mutex<HashMap<String, Entry>>,
}

impl ChatRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a room with a fresh participant registry.
    ///
    /// Re-registering an existing cookie returns the existing participants
    /// unchanged, so a duplicate create cannot orphan pre-bound sessions.
    pub fn register(&self, room: ChatRoom) -> Arc<SessionRegistry> {
        let mut inner = self.lock();
        let entry = inner.entry(room.cookie.clone()).or_insert_with(|| Entry {
            room,
            participants: Arc::new(SessionRegistry::new()),
        });
        Arc::clone(&entry.participants)
    }

    /// Room and participants for a cookie.
    pub fn retrieve(&self, cookie: &str) -> Result<(ChatRoom, Arc<SessionRegistry>), ChatError> {
        self.lock()
            .get(cookie)
            .map(|entry| (entry.room.clone(), Arc::clone(&entry.participants)))
            .ok_or_else(|| ChatError::RoomNotFound(cookie.to_string()))
    }

    /// Remove a room unconditionally.
    pub fn remove(&self, cookie: &str) {
        self.lock().remove(cookie);
    }

    /// Remove the room if its participant registry is empty.
    ///
    /// The emptiness check happens under the registry lock, so a join that
    /// has already pre-bound a session keeps the room alive.
    pub fn remove_if_empty(&self, cookie: &str) -> bool {
        let mut inner = self.lock();
        let empty = inner.get(cookie).is_some_and(|entry| entry.participants.is_empty());
        if empty {
            inner.remove(cookie);
        }
        empty
    }

    /// Number of registered rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no rooms are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl std::fmt::Debug for ChatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRegistry").field("room_count", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen_name::ScreenName;

    fn room(cookie: &str) -> ChatRoom {
        ChatRoom {
            cookie: cookie.to_string(),
            exchange: 4,
            instance: 0,
            detail_level: 2,
            name: "party".to_string(),
            created_at: 1_000_000,
        }
    }

    #[test]
    fn register_and_retrieve() {
        let registry = ChatRegistry::new();
        registry.register(room("r-1"));

        let (found, participants) = registry.retrieve("r-1").unwrap();
        assert_eq!(found.name, "party");
        assert!(participants.is_empty());
    }

    #[test]
    fn retrieve_unknown_room_fails() {
        let registry = ChatRegistry::new();
        assert!(matches!(
            registry.retrieve("nope"),
            Err(ChatError::RoomNotFound(ref s)) if s == "nope"
        ));
    }

    #[test]
    fn duplicate_register_keeps_participants() {
        let registry = ChatRegistry::new();
        let participants = registry.register(room("r-1"));
        participants.add("sid-1", ScreenName::new("alice"), 100);

        let again = registry.register(room("r-1"));
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn remove_if_empty_spares_occupied_rooms() {
        let registry = ChatRegistry::new();
        let participants = registry.register(room("r-1"));
        participants.add("sid-1", ScreenName::new("alice"), 100);

        assert!(!registry.remove_if_empty("r-1"));
        assert!(registry.retrieve("r-1").is_ok());

        participants.remove("sid-1");
        assert!(registry.remove_if_empty("r-1"));
        assert!(registry.retrieve("r-1").is_err());
    }

    #[test]
    fn descriptor_carries_name_and_creation_time() {
        let desc = room("r-1").descriptor();
        assert_eq!(desc.cookie, "r-1");
        assert_eq!(desc.name().unwrap(), "party");
        assert_eq!(desc.tlvs.u32(room_tags::CREATION_TIME).unwrap().unwrap(), 1_000_000);
    }
}
