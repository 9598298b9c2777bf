pub mod game_status;
pub mod player;
pub mod room;
