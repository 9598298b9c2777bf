use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::RoomError;
use crate::models::room::Room;

pub mod memory;
pub mod mysql;

// Contract with the storage engine: a document-oriented store with an
// atomic conditional find-and-update, lookup by id, bulk delete and
// field-level update by id. Room identifiers are opaque strings that the
// adapter converts to its native key type; an id that does not parse
// simply matches nothing.
#[async_trait]
pub trait RoomStore: Send + Sync {
    // Atomically claim one room matching {available, not blocked, not
    // owned}, excluding `exclude_room_id` when given, setting
    // blocked=true in the same atomic step. Under concurrent callers no
    // two of them are handed the same room.
    async fn find_available_and_block(
        &self,
        exclude_room_id: Option<&str>,
    ) -> Result<Option<Room>, RoomError>;

    async fn find_by_id(&self, room_id: &str) -> Result<Option<Room>, RoomError>;

    // Persist a new room; the store assigns and returns the identifier
    async fn insert(&self, room: &Room) -> Result<String, RoomError>;

    // Overwrite the room document with the given id. Returns false when
    // no document matched, so callers can detect a room that vanished.
    async fn update(&self, room_id: &str, room: &Room) -> Result<bool, RoomError>;

    async fn set_blocked(&self, room_id: &str) -> Result<(), RoomError>;

    // Bulk delete of rooms untouched since `cutoff`; reaper only.
    // Returns the number of deleted rooms.
    async fn delete_last_changed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RoomError>;
}
