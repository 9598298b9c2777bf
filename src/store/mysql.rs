use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::MySqlPool;

use crate::errors::RoomError;
use crate::models::game_status::GameStatus;
use crate::models::player::Player;
use crate::models::room::Room;
use crate::store::RoomStore;

// MySQL-backed room store. The two player slots and the game status are
// kept as JSON columns, see schema.sql for the expected table.
pub struct MySqlRoomStore {
    pool: MySqlPool,
}

impl MySqlRoomStore {
    pub fn new(pool: MySqlPool) -> MySqlRoomStore {
        MySqlRoomStore { pool }
    }
}

// Row shape of the `room` table
#[derive(sqlx::FromRow)]
struct RoomRow {
    id: u64,
    players: Json<[Player; 2]>,
    game_status: Json<GameStatus>,
    available: bool,
    blocked: bool,
    owned: bool,
    creation_date: DateTime<Utc>,
    last_change_date: DateTime<Utc>,
}

// Decode boundary: row to detached Room entity
fn room_from_row(row: RoomRow) -> Room {
    Room {
        room_id: Some(row.id.to_string()),
        players: row.players.0,
        game_status: row.game_status.0,
        available: row.available,
        blocked: row.blocked,
        owned: row.owned,
        creation_date: row.creation_date,
        last_change_date: row.last_change_date,
    }
}

// Opaque room ids are stringified table keys; anything else matches no row
fn parse_key(room_id: &str) -> Option<u64> {
    room_id.parse::<u64>().ok()
}

#[async_trait]
impl RoomStore for MySqlRoomStore {
    // The claim must be one atomic read-modify unit: the row is selected
    // FOR UPDATE and flagged blocked inside a single transaction, so two
    // concurrent joiners can never both read "available" before either
    // writes "blocked".
    async fn find_available_and_block(
        &self,
        exclude_room_id: Option<&str>,
    ) -> Result<Option<Room>, RoomError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<RoomRow> = match exclude_room_id.and_then(parse_key) {
            Some(exclude_key) => {
                let sql = "SELECT * FROM room \
                           WHERE available = TRUE AND blocked = FALSE AND owned = FALSE AND id <> ? \
                           ORDER BY id LIMIT 1 FOR UPDATE";
                sqlx::query_as(sql)
                    .bind(exclude_key)
                    .fetch_optional(&mut tx)
                    .await?
            }
            None => {
                let sql = "SELECT * FROM room \
                           WHERE available = TRUE AND blocked = FALSE AND owned = FALSE \
                           ORDER BY id LIMIT 1 FOR UPDATE";
                sqlx::query_as(sql).fetch_optional(&mut tx).await?
            }
        };

        let row = match row {
            Some(row) => row,
            None => {
                tx.commit().await?;
                return Ok(None);
            }
        };

        let sql = "UPDATE room SET blocked = TRUE WHERE id = ?";
        sqlx::query(sql).bind(row.id).execute(&mut tx).await?;
        tx.commit().await?;

        // post-update snapshot
        let mut room = room_from_row(row);
        room.blocked = true;
        Ok(Some(room))
    }

    async fn find_by_id(&self, room_id: &str) -> Result<Option<Room>, RoomError> {
        let key = match parse_key(room_id) {
            Some(key) => key,
            None => return Ok(None),
        };

        let sql = "SELECT * FROM room WHERE id = ?";
        let row: Option<RoomRow> = sqlx::query_as(sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(room_from_row))
    }

    async fn insert(&self, room: &Room) -> Result<String, RoomError> {
        let sql = "INSERT INTO room \
                   (players, game_status, available, blocked, owned, creation_date, last_change_date) \
                   VALUES (?, ?, ?, ?, ?, ?, ?)";
        let result = sqlx::query(sql)
            .bind(Json(&room.players))
            .bind(Json(&room.game_status))
            .bind(room.available)
            .bind(room.blocked)
            .bind(room.owned)
            .bind(room.creation_date)
            .bind(room.last_change_date)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_id().to_string())
    }

    async fn update(&self, room_id: &str, room: &Room) -> Result<bool, RoomError> {
        let key = match parse_key(room_id) {
            Some(key) => key,
            None => return Ok(false),
        };

        // last_change_date is written in the same statement as the rest,
        // and always changes, so rows_affected doubles as a match count
        let sql = "UPDATE room \
                   SET players = ?, game_status = ?, available = ?, blocked = ?, owned = ?, last_change_date = ? \
                   WHERE id = ?";
        let result = sqlx::query(sql)
            .bind(Json(&room.players))
            .bind(Json(&room.game_status))
            .bind(room.available)
            .bind(room.blocked)
            .bind(room.owned)
            .bind(room.last_change_date)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_blocked(&self, room_id: &str) -> Result<(), RoomError> {
        let key = match parse_key(room_id) {
            Some(key) => key,
            None => return Ok(()),
        };

        let sql = "UPDATE room SET blocked = TRUE WHERE id = ?";
        sqlx::query(sql).bind(key).execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_last_changed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RoomError> {
        let sql = "DELETE FROM room WHERE last_change_date < ?";
        let result = sqlx::query(sql).bind(cutoff).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

// The JSON column shapes double as the wire format of the room document;
// these pin them down so a schema change does not slip in silently.
#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::models::game_status::Symbol;
    use crate::models::player::Player;
    use crate::models::room::Room;

    #[test]
    fn players_column_shape_round_trips() {
        let mut room = Room::create_empty(false);
        room.add_player(Player {
            name: "Ann".to_string(),
            symbol: Some(Symbol::X),
            slot: 1,
            has_turn: true,
            restarting_request: false,
        });

        let value = serde_json::to_value(&room.players).unwrap();
        assert_eq!(
            value,
            json!([
                {
                    "name": "Ann",
                    "symbol": "X",
                    "slot": 1,
                    "has_turn": true,
                    "restarting_request": false
                },
                {
                    "name": "",
                    "symbol": null,
                    "slot": 0,
                    "has_turn": false,
                    "restarting_request": false
                }
            ])
        );

        let decoded: [Player; 2] = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, room.players);
    }

    #[test]
    fn game_status_column_shape_round_trips() {
        let room = Room::create_empty(false);
        let status = room.game_status.apply_move(Symbol::O, (2, 0)).unwrap();

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(
            value,
            json!({
                "board": [
                    [null, null, null],
                    [null, null, null],
                    ["O", null, null]
                ],
                "last_move": { "id": 1, "coord": [2, 0], "symbol": "O" }
            })
        );

        let decoded: crate::models::game_status::GameStatus =
            serde_json::from_value(value).unwrap();
        assert_eq!(decoded, status);
    }
}
