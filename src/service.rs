use std::time::Duration;

use log::{error, info};

use crate::errors::RoomError;
use crate::models::game_status::Symbol;
use crate::models::player::Player;
use crate::models::room::Room;
use crate::repository::{ReaperHandle, RoomRepository};

// Slots arrive from the transport layer and are validated once here;
// Room methods assume a validated slot
fn check_slot(slot: u8) -> Result<(), RoomError> {
    if slot == 1 || slot == 2 {
        Ok(())
    } else {
        Err(RoomError::InvalidMove)
    }
}

// The operations the transport layer may call on the matchmaking core.
// Every operation works on a detached Room snapshot and persists it
// before returning.
#[derive(Clone)]
pub struct GameService {
    repository: RoomRepository,
}

impl GameService {
    pub fn new(repository: RoomRepository) -> GameService {
        GameService { repository }
    }

    pub fn repository(&self) -> &RoomRepository {
        &self.repository
    }

    // A fresh empty room, persisted so it carries its store-assigned id
    pub async fn create_empty_room(&self, is_private: bool) -> Result<Room, RoomError> {
        let mut room = Room::create_empty(is_private);
        self.repository.save(&mut room).await?;
        info!(
            "Created new {} room {:?}",
            if is_private { "private" } else { "public" },
            room.room_id
        );
        Ok(room)
    }

    // Matchmaking entry: atomically claim an available public room. The
    // caller passes its current room id so a player leaving a room is
    // never matched back into it.
    pub async fn claim_available_room(
        &self,
        exclude_room_id: Option<&str>,
    ) -> Result<Option<Room>, RoomError> {
        self.repository.find_available_and_block(exclude_room_id).await
    }

    pub async fn get_room_by_id(&self, room_id: &str) -> Result<Room, RoomError> {
        self.repository.find_by_id(room_id).await
    }

    // Private-join path with the access checks applied
    pub async fn get_room_with_access_check(
        &self,
        room_id: &str,
        session_room_id: Option<&str>,
    ) -> Result<Room, RoomError> {
        self.repository
            .find_by_id_and_check_access_rights(room_id, session_room_id)
            .await
    }

    // Put a joining player into the first open slot with the next free
    // symbol. The player holding X opens the game. Persisting the
    // assignment ends the claim window, so the room is unblocked in the
    // same write.
    pub async fn assign_player_to_room(
        &self,
        room: &mut Room,
        name: &str,
    ) -> Result<Player, RoomError> {
        let slot = match room.available_player_slot() {
            Some(slot) => slot,
            None => {
                // callers check availability before assignment, so this
                // branch is a broken precondition
                error!("No open player slot in room {:?} at assignment", room.room_id);
                return Err(RoomError::RoomFull);
            }
        };
        let symbol = match room.available_game_symbol() {
            Some(symbol) => symbol,
            None => {
                error!("No free game symbol in room {:?} at assignment", room.room_id);
                return Err(RoomError::RoomFull);
            }
        };

        let player = Player {
            name: name.to_string(),
            symbol: Some(symbol),
            slot,
            has_turn: symbol == Symbol::X,
            restarting_request: false,
        };
        room.add_player(player.clone());
        room.blocked = false;

        if !self.repository.save(room).await? {
            return Err(RoomError::NotFound);
        }
        info!("Assigned player to slot {} of room {:?}", slot, room.room_id);
        Ok(player)
    }

    // Apply one move for the given slot and hand the turn over. Only the
    // slot holding the turn may move; anything else is an invalid move.
    pub async fn apply_player_move(
        &self,
        room: &mut Room,
        slot: u8,
        coord: (u8, u8),
    ) -> Result<(), RoomError> {
        check_slot(slot)?;
        let player = room.player(slot);
        if !player.has_turn {
            return Err(RoomError::InvalidMove);
        }
        let symbol = player.symbol.ok_or(RoomError::InvalidMove)?;

        room.game_status = room.game_status.apply_move(symbol, coord)?;
        room.set_players_turn(slot);

        if !self.repository.save(room).await? {
            return Err(RoomError::NotFound);
        }
        Ok(())
    }

    // One side answered the restart prompt; the board only resets once
    // both sides have
    pub async fn request_restart(&self, room: &mut Room, slot: u8) -> Result<(), RoomError> {
        check_slot(slot)?;
        room.handle_game_restart(slot);
        if !self.repository.save(room).await? {
            return Err(RoomError::NotFound);
        }
        Ok(())
    }

    // A player leaves: clear the slot, persist, then block the vacated
    // room so it is never handed to a stranger while the remaining
    // player winds down. The block is best effort.
    pub async fn release_player_slot(&self, room: &mut Room, slot: u8) -> Result<(), RoomError> {
        check_slot(slot)?;
        room.remove_player(slot);
        if !self.repository.save(room).await? {
            return Err(RoomError::NotFound);
        }
        if let Some(room_id) = room.room_id.clone() {
            self.repository.block_by_id(&room_id).await;
        }
        Ok(())
    }

    pub fn start_reaper(
        &self,
        interval: Duration,
        max_inactive_age: Duration,
    ) -> Result<ReaperHandle, RoomError> {
        self.repository.start_reaper(interval, max_inactive_age)
    }
}
