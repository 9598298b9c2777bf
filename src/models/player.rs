use serde::{Deserialize, Serialize};

use crate::models::game_status::Symbol;

// One of the two player slots of a room. An unassigned slot has an empty
// name, no symbol and slot number 0 at the same time; a partially filled
// slot is never persisted.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Player {
    pub name: String,
    pub symbol: Option<Symbol>,
    pub slot: u8,
    pub has_turn: bool,
    pub restarting_request: bool,
}

impl Player {
    pub fn unassigned() -> Player {
        Player {
            name: String::new(),
            symbol: None,
            slot: 0,
            has_turn: false,
            restarting_request: false,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.name.is_empty() && self.symbol.is_none() && self.slot == 0
    }

    // Back to the unassigned triple, turn flag dropped
    pub fn clear(&mut self) {
        self.name.clear();
        self.symbol = None;
        self.slot = 0;
        self.has_turn = false;
    }
}
