use serde::{Deserialize, Serialize};

use crate::errors::RoomError;

pub const BOARD_SIZE: usize = 3;

// A player mark on the board. An empty cell is Option<Symbol>::None.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    // The symbol held by the opponent
    pub fn other(&self) -> Symbol {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

// The last accepted move: sequence marker, board coordinate and mark.
// id 0 with no coordinate and no symbol is the "no move yet" marker.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GameMove {
    pub id: u32,
    pub coord: Option<(u8, u8)>,
    pub symbol: Option<Symbol>,
}

impl GameMove {
    pub fn empty() -> GameMove {
        GameMove {
            id: 0,
            coord: None,
            symbol: None,
        }
    }
}

// Board snapshot of one room. Mutated once per accepted move, fully
// cleared on a mutual restart agreement.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GameStatus {
    pub board: [[Option<Symbol>; BOARD_SIZE]; BOARD_SIZE],
    pub last_move: GameMove,
}

impl GameStatus {
    pub fn empty() -> GameStatus {
        GameStatus {
            board: [[None; BOARD_SIZE]; BOARD_SIZE],
            last_move: GameMove::empty(),
        }
    }

    // Produce the status after one move. Does not touch the receiver:
    // the caller decides whether to store the result.
    pub fn apply_move(&self, symbol: Symbol, coord: (u8, u8)) -> Result<GameStatus, RoomError> {
        let (row, col) = coord;
        if row as usize >= BOARD_SIZE || col as usize >= BOARD_SIZE {
            return Err(RoomError::InvalidMove);
        }
        if self.board[row as usize][col as usize].is_some() {
            return Err(RoomError::InvalidMove);
        }

        let mut next = self.clone();
        next.board[row as usize][col as usize] = Some(symbol);
        next.last_move = GameMove {
            id: self.last_move.id + 1,
            coord: Some(coord),
            symbol: Some(symbol),
        };
        Ok(next)
    }

    // Clear the board and the last-move marker. Only called once both
    // players agreed on a restart.
    pub fn reset(&mut self) {
        self.board = [[None; BOARD_SIZE]; BOARD_SIZE];
        self.last_move = GameMove::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_move_sets_exactly_one_cell() {
        let status = GameStatus::empty();
        let next = status.apply_move(Symbol::X, (1, 1)).unwrap();
        let mut set_cells = 0;
        for row in next.board.iter() {
            for cell in row.iter() {
                if cell.is_some() {
                    set_cells += 1;
                }
            }
        }
        assert_eq!(set_cells, 1);
        assert_eq!(next.board[1][1], Some(Symbol::X));
        assert_eq!(next.last_move.id, 1);
        assert_eq!(next.last_move.coord, Some((1, 1)));
        assert_eq!(next.last_move.symbol, Some(Symbol::X));
        // the receiver is untouched
        assert_eq!(status, GameStatus::empty());
    }

    #[test]
    fn apply_move_rejects_occupied_cell() {
        let status = GameStatus::empty().apply_move(Symbol::X, (0, 0)).unwrap();
        let result = status.apply_move(Symbol::O, (0, 0));
        assert!(matches!(result, Err(RoomError::InvalidMove)));
        // rejected move leaves the status unchanged
        assert_eq!(status.board[0][0], Some(Symbol::X));
        assert_eq!(status.last_move.id, 1);
    }

    #[test]
    fn apply_move_rejects_out_of_range_coordinate() {
        let status = GameStatus::empty();
        assert!(matches!(
            status.apply_move(Symbol::X, (3, 0)),
            Err(RoomError::InvalidMove)
        ));
        assert!(matches!(
            status.apply_move(Symbol::X, (0, 3)),
            Err(RoomError::InvalidMove)
        ));
    }

    #[test]
    fn moves_increment_the_sequence_marker() {
        let status = GameStatus::empty()
            .apply_move(Symbol::X, (0, 0))
            .unwrap()
            .apply_move(Symbol::O, (1, 0))
            .unwrap();
        assert_eq!(status.last_move.id, 2);
        assert_eq!(status.last_move.symbol, Some(Symbol::O));
    }

    #[test]
    fn reset_clears_board_and_marker() {
        let mut status = GameStatus::empty()
            .apply_move(Symbol::X, (2, 2))
            .unwrap();
        status.reset();
        assert_eq!(status, GameStatus::empty());
    }

    #[test]
    fn other_symbol_is_the_complement() {
        assert_eq!(Symbol::X.other(), Symbol::O);
        assert_eq!(Symbol::O.other(), Symbol::X);
    }
}
