pub mod errors;
pub mod models;
pub mod repository;
pub mod service;
pub mod store;

pub use errors::RoomError;
pub use models::game_status::{GameMove, GameStatus, Symbol, BOARD_SIZE};
pub use models::player::Player;
pub use models::room::Room;
pub use repository::{ReaperHandle, RoomRepository};
pub use service::GameService;
pub use store::RoomStore;
