use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::RoomError;
use crate::models::room::Room;
use crate::store::RoomStore;

// In-process room store used by the test suite and for embedded setups
// without a database. Every operation runs under one mutex, which makes
// the conditional claim atomic by construction.
pub struct MemoryRoomStore {
    inner: Mutex<Inner>,
}

struct Inner {
    rooms: BTreeMap<u64, Room>,
    next_id: u64,
}

impl MemoryRoomStore {
    pub fn new() -> MemoryRoomStore {
        MemoryRoomStore {
            inner: Mutex::new(Inner {
                rooms: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().rooms.is_empty()
    }
}

impl Default for MemoryRoomStore {
    fn default() -> Self {
        MemoryRoomStore::new()
    }
}

fn parse_key(room_id: &str) -> Option<u64> {
    room_id.parse::<u64>().ok()
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn find_available_and_block(
        &self,
        exclude_room_id: Option<&str>,
    ) -> Result<Option<Room>, RoomError> {
        let exclude_key = exclude_room_id.and_then(parse_key);
        let mut inner = self.lock();
        // lowest id first, matching the database adapter's ordering
        for (id, room) in inner.rooms.iter_mut() {
            if Some(*id) == exclude_key {
                continue;
            }
            if room.available && !room.blocked && !room.owned {
                room.blocked = true;
                return Ok(Some(room.clone()));
            }
        }
        Ok(None)
    }

    async fn find_by_id(&self, room_id: &str) -> Result<Option<Room>, RoomError> {
        let key = match parse_key(room_id) {
            Some(key) => key,
            None => return Ok(None),
        };
        Ok(self.lock().rooms.get(&key).cloned())
    }

    async fn insert(&self, room: &Room) -> Result<String, RoomError> {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        let mut stored = room.clone();
        stored.room_id = Some(id.to_string());
        inner.rooms.insert(id, stored);
        Ok(id.to_string())
    }

    async fn update(&self, room_id: &str, room: &Room) -> Result<bool, RoomError> {
        let key = match parse_key(room_id) {
            Some(key) => key,
            None => return Ok(false),
        };
        let mut inner = self.lock();
        match inner.rooms.get_mut(&key) {
            Some(stored) => {
                *stored = room.clone();
                stored.room_id = Some(key.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_blocked(&self, room_id: &str) -> Result<(), RoomError> {
        let key = match parse_key(room_id) {
            Some(key) => key,
            None => return Ok(()),
        };
        if let Some(room) = self.lock().rooms.get_mut(&key) {
            room.blocked = true;
        }
        Ok(())
    }

    async fn delete_last_changed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RoomError> {
        let mut inner = self.lock();
        let before = inner.rooms.len();
        inner.rooms.retain(|_, room| room.last_change_date >= cutoff);
        Ok((before - inner.rooms.len()) as u64)
    }
}
