use thiserror::Error;

// Typed failures of the matchmaking core. Transport layers translate
// these into user-facing responses; nothing is retried at this layer.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("no room found")]
    NotFound,

    #[error("requested to join a non private room")]
    AccessDenied,

    #[error("the room is already full")]
    RoomFull,

    #[error("invalid game move")]
    InvalidMove,

    #[error("reaper interval and max inactive age must be at least one hour")]
    ConfigError,

    #[error("storage unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}
