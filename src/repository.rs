use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, info};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::errors::RoomError;
use crate::models::room::Room;
use crate::store::RoomStore;

// Floor for both reaper parameters, keeps a misconfigured deployment
// from thrashing the store
const MIN_REAPER_PERIOD: Duration = Duration::from_secs(60 * 60);

// Persistence and concurrency-control boundary for rooms. The store is
// the only shared mutable state; no room is cached across requests, so
// correctness reduces to the atomicity of the individual store calls.
#[derive(Clone)]
pub struct RoomRepository {
    store: Arc<dyn RoomStore>,
}

impl RoomRepository {
    pub fn new(store: Arc<dyn RoomStore>) -> RoomRepository {
        RoomRepository { store }
    }

    // Atomically claim the first available, unblocked, public room,
    // skipping the room the caller's session is already bound to
    pub async fn find_available_and_block(
        &self,
        exclude_room_id: Option<&str>,
    ) -> Result<Option<Room>, RoomError> {
        self.store.find_available_and_block(exclude_room_id).await
    }

    pub async fn find_by_id(&self, room_id: &str) -> Result<Room, RoomError> {
        self.store
            .find_by_id(room_id)
            .await?
            .ok_or(RoomError::NotFound)
    }

    // Private-join path: the room must be an owned room, and a full room
    // only admits callers whose session is already bound to it
    pub async fn find_by_id_and_check_access_rights(
        &self,
        room_id: &str,
        session_room_id: Option<&str>,
    ) -> Result<Room, RoomError> {
        let room = self.find_by_id(room_id).await?;
        if !room.owned {
            return Err(RoomError::AccessDenied);
        }
        if !room.is_available() && session_room_id != Some(room_id) {
            return Err(RoomError::RoomFull);
        }
        Ok(room)
    }

    // Insert when the room has no identifier yet, writing the assigned
    // id back into it; update otherwise, stamping last_change_date as
    // part of the same write. Returns false when the update matched no
    // document, so callers can detect a room that vanished mid-session.
    pub async fn save(&self, room: &mut Room) -> Result<bool, RoomError> {
        room.available = room.is_available();
        match room.room_id.clone() {
            None => {
                let id = self.store.insert(room).await?;
                debug!("Inserted new room {}", id);
                room.room_id = Some(id);
                Ok(true)
            }
            Some(id) => {
                room.last_change_date = Utc::now();
                self.store.update(&id, room).await
            }
        }
    }

    // Fire and forget: the room is already being vacated, and a room
    // left unblocked here is removed by the next reaper pass
    pub async fn block_by_id(&self, room_id: &str) {
        if let Err(err) = self.store.set_blocked(room_id).await {
            error!("Failed to block the room with id {}: {:?}", room_id, err);
        }
    }

    // Delete every room untouched for longer than max_inactive_age
    pub async fn delete_inactive(&self, max_inactive_age: Duration) -> Result<u64, RoomError> {
        let max_age = chrono::Duration::from_std(max_inactive_age)
            .map_err(|_| RoomError::ConfigError)?;
        let cutoff = Utc::now() - max_age;
        self.store.delete_last_changed_before(cutoff).await
    }

    // Spawn the periodic inactive-room sweep. The first sweep runs
    // immediately, then once per interval; a failed tick is logged and
    // the loop keeps running. Both parameters are bounded to at least
    // one hour.
    pub fn start_reaper(
        &self,
        interval: Duration,
        max_inactive_age: Duration,
    ) -> Result<ReaperHandle, RoomError> {
        if interval < MIN_REAPER_PERIOD || max_inactive_age < MIN_REAPER_PERIOD {
            return Err(RoomError::ConfigError);
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let repository = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("Check for inactive rooms to delete");
                        match repository.delete_inactive(max_inactive_age).await {
                            Ok(0) => {}
                            Ok(count) => info!("Deleted {} inactive rooms", count),
                            Err(err) => error!("Inactive room sweep failed: {:?}", err),
                        }
                    }
                    _ = stop_rx.changed() => {
                        debug!("Reaper stopping");
                        break;
                    }
                }
            }
        });

        Ok(ReaperHandle {
            stop: stop_tx,
            task,
        })
    }
}

// Handle on the running reaper task; dropping it without calling stop
// leaves the task running for the lifetime of the runtime
pub struct ReaperHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    // Signal the task and wait for it to wind down
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}
