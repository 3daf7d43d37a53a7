use super::models::{PendingTasks, PlayerRecord, StandbyPeriod};
use super::schema::PLAYER_VERSIONED_SCHEMAS;
use super::user_agent::DeviceIdentity;
use super::PlayerStore;
use crate::sqlite_persistence::open_versioned_db;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct SqlitePlayerStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlayerStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), PLAYER_VERSIONED_SCHEMAS, "player")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Returns the number of inserted rows; `conflict` is appended to the
    /// INSERT statement.
    fn write_player(&self, player: &PlayerRecord, conflict: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let standby_periods = serde_json::to_string(&player.standby_periods)?;
        let pending_tasks = if player.pending_tasks.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&player.pending_tasks)?)
        };
        let sql = format!(
            "INSERT INTO players (
                uuid, name, model, firmware, playlist_id, screen_width, screen_height,
                refresh_interval, standby_periods, pending_tasks, last_access
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11){}",
            conflict
        );
        let inserted = conn
            .execute(
                &sql,
                params![
                    player.uuid,
                    player.name,
                    player.model,
                    player.firmware,
                    player.playlist_id,
                    player.screen_width as i64,
                    player.screen_height as i64,
                    player.refresh_interval as i64,
                    standby_periods,
                    pending_tasks,
                    player.last_access.map(|dt| dt.to_rfc3339()),
                ],
            )
            .with_context(|| format!("Failed to insert player {}", player.uuid))?;
        Ok(inserted)
    }

    fn row_to_player(row: &rusqlite::Row) -> rusqlite::Result<PlayerRecord> {
        let standby_periods: Option<String> = row.get("standby_periods")?;
        let pending_tasks: Option<String> = row.get("pending_tasks")?;
        let last_access: Option<String> = row.get("last_access")?;

        let standby_periods: Vec<StandbyPeriod> = standby_periods
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();
        let pending_tasks: PendingTasks = pending_tasks
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();
        let last_access = last_access
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(PlayerRecord {
            uuid: row.get("uuid")?,
            name: row.get("name")?,
            model: row.get("model")?,
            firmware: row.get("firmware")?,
            playlist_id: row.get("playlist_id")?,
            screen_width: row.get::<_, i64>("screen_width")?.max(0) as u32,
            screen_height: row.get::<_, i64>("screen_height")?.max(0) as u32,
            refresh_interval: row.get::<_, i64>("refresh_interval")?.max(0) as u32,
            standby_periods,
            pending_tasks,
            last_access,
        })
    }

    fn ensure_updated(updated: usize, uuid: &str) -> Result<()> {
        if updated == 0 {
            bail!("Player {} not found", uuid);
        }
        Ok(())
    }
}

impl PlayerStore for SqlitePlayerStore {
    fn get_player(&self, uuid: &str) -> Result<Option<PlayerRecord>> {
        let conn = self.conn.lock().unwrap();
        let player = conn
            .query_row(
                "SELECT * FROM players WHERE uuid = ?1",
                params![uuid],
                Self::row_to_player,
            )
            .optional()?;
        Ok(player)
    }

    fn insert_player(&self, player: &PlayerRecord) -> Result<()> {
        self.write_player(player, "")?;
        Ok(())
    }

    fn register_player(&self, player: &PlayerRecord) -> Result<bool> {
        Ok(self.write_player(player, " ON CONFLICT(uuid) DO NOTHING")? > 0)
    }

    fn record_access(
        &self,
        uuid: &str,
        identity: &DeviceIdentity,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE players SET
                name = COALESCE(?2, name),
                model = COALESCE(?3, model),
                firmware = COALESCE(?4, firmware),
                last_access = ?5
             WHERE uuid = ?1",
            params![
                uuid,
                identity.name,
                identity.model,
                identity.firmware,
                at.to_rfc3339()
            ],
        )?;
        Self::ensure_updated(updated, uuid)
    }

    fn assign_playlist(&self, uuid: &str, playlist_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE players SET playlist_id = ?2 WHERE uuid = ?1",
            params![uuid, playlist_id],
        )?;
        Self::ensure_updated(updated, uuid)
    }

    fn set_pending_tasks(&self, uuid: &str, tasks: &PendingTasks) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE players SET pending_tasks = ?2 WHERE uuid = ?1",
            params![uuid, serde_json::to_string(tasks)?],
        )?;
        Self::ensure_updated(updated, uuid)
    }

    fn clear_pending_tasks(&self, uuid: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE players SET pending_tasks = NULL WHERE uuid = ?1",
            params![uuid],
        )?;
        Self::ensure_updated(updated, uuid)
    }
}
