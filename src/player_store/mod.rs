mod models;
mod player_lookup;
mod schema;
mod sqlite_player_store;
mod user_agent;

pub use models::*;
pub use player_lookup::PlayerLookup;
pub use schema::PLAYER_VERSIONED_SCHEMAS;
pub use sqlite_player_store::SqlitePlayerStore;
pub use user_agent::{parse_user_agent, DeviceIdentity};

use anyhow::Result;
use chrono::{DateTime, Utc};

pub trait PlayerStore: Send + Sync {
    fn get_player(&self, uuid: &str) -> Result<Option<PlayerRecord>>;

    /// Fails if a player with the same uuid exists.
    fn insert_player(&self, player: &PlayerRecord) -> Result<()>;

    /// Inserts the player unless the uuid is already registered. Returns
    /// whether a row was written.
    fn register_player(&self, player: &PlayerRecord) -> Result<bool>;

    /// Refreshes the identity fields the device reports and the access time.
    fn record_access(
        &self,
        uuid: &str,
        identity: &DeviceIdentity,
        at: DateTime<Utc>,
    ) -> Result<()>;

    fn assign_playlist(&self, uuid: &str, playlist_id: i64) -> Result<()>;

    fn set_pending_tasks(&self, uuid: &str, tasks: &PendingTasks) -> Result<()>;

    fn clear_pending_tasks(&self, uuid: &str) -> Result<()>;
}
