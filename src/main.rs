use std::{env, sync::Arc, time::Duration};

use log::{debug, info};
use simplelog::*;
use sqlx::mysql::MySqlPool;

use tictactoe_rooms::repository::RoomRepository;
use tictactoe_rooms::store::mysql::MySqlRoomStore;

const SECONDS_PER_HOUR: u64 = 60 * 60;

// Maintenance daemon for the room store: connects the pool and runs the
// inactive-room reaper until interrupted. Transport processes use the
// library directly.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // set up logging facility
    let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());
    info!("Starting..");

    // get database url
    let database_url = env::var("DATABASE_URL").expect("$DATABASE_URL is not set");
    debug!("database_url: {:?}", database_url);

    // reaper schedule, both bounded below to one hour by the repository
    let reaper_interval_hours = env::var("REAPER_INTERVAL_HOURS")
        .unwrap_or_else(|_| "1".to_string())
        .parse::<u64>()
        .expect("$REAPER_INTERVAL_HOURS is not numeric");
    let max_inactive_hours = env::var("ROOM_MAX_INACTIVE_HOURS")
        .unwrap_or_else(|_| "24".to_string())
        .parse::<u64>()
        .expect("$ROOM_MAX_INACTIVE_HOURS is not numeric");

    let pool = MySqlPool::connect(&database_url).await?;

    let repository = RoomRepository::new(Arc::new(MySqlRoomStore::new(pool)));
    let reaper = repository.start_reaper(
        Duration::from_secs(reaper_interval_hours * SECONDS_PER_HOUR),
        Duration::from_secs(max_inactive_hours * SECONDS_PER_HOUR),
    )?;
    info!(
        "Reaper running every {}h, deleting rooms inactive for {}h",
        reaper_interval_hours, max_inactive_hours
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down..");
    reaper.stop().await;

    Ok(())
}
