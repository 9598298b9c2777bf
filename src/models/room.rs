use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::game_status::{GameStatus, Symbol};
use crate::models::player::Player;

// Slot arguments throughout are 1 or 2 (slot 1 lives at index 0). The
// service layer validates slots before calling in here.
fn other_slot(slot: u8) -> u8 {
    if slot == 1 {
        2
    } else {
        1
    }
}

fn slot_index(slot: u8) -> usize {
    debug_assert!(slot == 1 || slot == 2, "slot must be 1 or 2");
    slot as usize - 1
}

// A two-player game session. The in-memory value is a detached copy of
// the persisted document, valid for the duration of one request.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Room {
    // assigned by the store on first save
    pub room_id: Option<String>,
    pub players: [Player; 2],
    pub game_status: GameStatus,
    // derived from slot occupancy, recomputed on every mutation
    pub available: bool,
    pub creation_date: DateTime<Utc>,
    pub last_change_date: DateTime<Utc>,
    // claimed-for-assignment flag, distinct from fullness
    pub blocked: bool,
    // private rooms are joinable by id only, never by matchmaking
    pub owned: bool,
}

impl Room {
    // A fresh room for a player requesting a new game session, used when
    // matchmaking found no available room to claim.
    pub fn create_empty(is_private: bool) -> Room {
        let now = Utc::now();
        Room {
            room_id: None,
            players: [Player::unassigned(), Player::unassigned()],
            game_status: GameStatus::empty(),
            available: true,
            creation_date: now,
            last_change_date: now,
            blocked: false,
            owned: is_private,
        }
    }

    pub fn player(&self, slot: u8) -> &Player {
        &self.players[slot_index(slot)]
    }

    // At least one player slot is open. Always recomputed from the
    // slots, never read from the cached field.
    pub fn is_available(&self) -> bool {
        self.available_player_slot().is_some()
    }

    // The open slot a joining player should take, slot 1 when both are
    // open, None when the room is full.
    pub fn available_player_slot(&self) -> Option<u8> {
        if self.players[0].is_unassigned() {
            Some(1)
        } else if self.players[1].is_unassigned() {
            Some(2)
        } else {
            None
        }
    }

    // The symbol not in use yet, X by default. None with both slots
    // occupied is a precondition violation: callers check the slot
    // availability first.
    pub fn available_game_symbol(&self) -> Option<Symbol> {
        match (self.players[0].symbol, self.players[1].symbol) {
            (None, None) => Some(Symbol::X),
            (Some(taken), None) | (None, Some(taken)) => Some(taken.other()),
            (Some(_), Some(_)) => None,
        }
    }

    // Write the player into the slot it carries and refresh availability
    pub fn add_player(&mut self, player: Player) {
        let idx = slot_index(player.slot);
        self.players[idx] = player;
        self.available = self.is_available();
    }

    // Clear a slot. The room becomes joinable again even if the other
    // slot holds stale data.
    pub fn remove_player(&mut self, slot: u8) {
        self.players[slot_index(slot)].clear();
        self.available = true;
    }

    // Hand the turn over after a successful move by `slot`. Exactly one
    // slot holds the turn afterwards.
    pub fn set_players_turn(&mut self, slot: u8) {
        self.players[slot_index(slot)].has_turn = false;
        self.players[slot_index(other_slot(slot))].has_turn = true;
    }

    // The game ended: flag both slots so the restart prompt is shown and
    // a restart cycle begins.
    pub fn init_game_restart(&mut self) {
        self.players[0].restarting_request = true;
        self.players[1].restarting_request = true;
    }

    // One side answered the restart prompt. The slot's own flag is
    // cleared; the board resets only when the other side cleared its
    // flag earlier, so no unilateral request completes the reset.
    pub fn handle_game_restart(&mut self, slot: u8) {
        let this = slot_index(slot);
        let other = slot_index(other_slot(slot));
        if self.players[this].restarting_request {
            self.players[this].restarting_request = false;
            if !self.players[other].restarting_request {
                self.game_status.reset();
            }
        }
    }

    // A restart cycle has just begun and neither side has acted yet
    pub fn is_game_restart_initialized(&self) -> bool {
        self.players[0].restarting_request && self.players[1].restarting_request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, symbol: Symbol, slot: u8) -> Player {
        Player {
            name: name.to_string(),
            symbol: Some(symbol),
            slot,
            has_turn: false,
            restarting_request: false,
        }
    }

    #[test]
    fn empty_room_is_available_and_unblocked() {
        let room = Room::create_empty(false);
        assert!(room.available);
        assert!(room.is_available());
        assert!(!room.blocked);
        assert!(!room.owned);
        assert!(room.room_id.is_none());
        assert_eq!(room.creation_date, room.last_change_date);
    }

    #[test]
    fn private_room_is_owned() {
        assert!(Room::create_empty(true).owned);
    }

    #[test]
    #[should_panic(expected = "slot must be 1 or 2")]
    fn slot_zero_violates_the_slot_precondition() {
        let room = Room::create_empty(false);
        let _ = room.player(0);
    }

    #[test]
    #[should_panic(expected = "slot must be 1 or 2")]
    fn slot_three_violates_the_slot_precondition() {
        let room = Room::create_empty(false);
        let _ = room.player(3);
    }

    #[test]
    fn slot_selection_prefers_slot_one() {
        let mut room = Room::create_empty(false);
        assert_eq!(room.available_player_slot(), Some(1));

        room.add_player(player("Ann", Symbol::X, 1));
        assert_eq!(room.available_player_slot(), Some(2));

        room.add_player(player("Bob", Symbol::O, 2));
        assert_eq!(room.available_player_slot(), None);
    }

    #[test]
    fn slot_two_open_alone_is_returned() {
        let mut room = Room::create_empty(false);
        room.add_player(player("Ann", Symbol::X, 1));
        room.add_player(player("Bob", Symbol::O, 2));
        room.remove_player(2);
        assert_eq!(room.available_player_slot(), Some(2));
    }

    #[test]
    fn symbol_defaults_to_x_and_complements_otherwise() {
        let mut room = Room::create_empty(false);
        assert_eq!(room.available_game_symbol(), Some(Symbol::X));

        room.add_player(player("Ann", Symbol::X, 1));
        assert_eq!(room.available_game_symbol(), Some(Symbol::O));

        let mut room = Room::create_empty(false);
        room.add_player(player("Bob", Symbol::O, 2));
        assert_eq!(room.available_game_symbol(), Some(Symbol::X));
    }

    #[test]
    fn symbol_is_none_when_full() {
        let mut room = Room::create_empty(false);
        room.add_player(player("Ann", Symbol::X, 1));
        room.add_player(player("Bob", Symbol::O, 2));
        assert_eq!(room.available_game_symbol(), None);
    }

    #[test]
    fn availability_tracks_slot_occupancy() {
        let mut room = Room::create_empty(false);
        room.add_player(player("Ann", Symbol::X, 1));
        assert!(room.available);
        assert_eq!(room.available, room.available_player_slot().is_some());

        room.add_player(player("Bob", Symbol::O, 2));
        assert!(!room.available);
        assert_eq!(room.available, room.available_player_slot().is_some());
    }

    #[test]
    fn remove_player_forces_availability() {
        let mut room = Room::create_empty(false);
        room.add_player(player("Ann", Symbol::X, 1));
        room.add_player(player("Bob", Symbol::O, 2));
        assert!(!room.available);

        room.remove_player(1);
        assert!(room.available);
        assert!(room.players[0].is_unassigned());
        assert!(!room.players[1].is_unassigned());
    }

    #[test]
    fn turn_alternation_leaves_exactly_one_turn_holder() {
        let mut room = Room::create_empty(false);
        room.add_player(player("Ann", Symbol::X, 1));
        room.add_player(player("Bob", Symbol::O, 2));

        room.set_players_turn(1);
        assert!(!room.player(1).has_turn);
        assert!(room.player(2).has_turn);

        room.set_players_turn(2);
        assert!(room.player(1).has_turn);
        assert!(!room.player(2).has_turn);
    }

    #[test]
    fn restart_needs_both_sides() {
        let mut room = Room::create_empty(false);
        room.add_player(player("Ann", Symbol::X, 1));
        room.add_player(player("Bob", Symbol::O, 2));
        room.game_status = room.game_status.apply_move(Symbol::X, (0, 0)).unwrap();

        room.init_game_restart();
        assert!(room.is_game_restart_initialized());

        // one side alone does not reset the board
        room.handle_game_restart(1);
        assert!(room.game_status.board[0][0].is_some());
        assert!(!room.is_game_restart_initialized());

        // the other side completes the agreement
        room.handle_game_restart(2);
        assert!(room.game_status.board[0][0].is_none());
        assert!(!room.players[0].restarting_request);
        assert!(!room.players[1].restarting_request);
    }

    #[test]
    fn restart_without_pending_request_does_nothing() {
        let mut room = Room::create_empty(false);
        room.add_player(player("Ann", Symbol::X, 1));
        room.add_player(player("Bob", Symbol::O, 2));
        room.game_status = room.game_status.apply_move(Symbol::X, (1, 1)).unwrap();

        room.handle_game_restart(1);
        room.handle_game_restart(1);
        assert!(room.game_status.board[1][1].is_some());
    }
}
