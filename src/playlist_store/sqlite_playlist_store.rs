use super::models::{
    ConditionalWindow, Item, ItemKind, ItemProperties, PlaylistMode, PlaylistNode, TriggerSet,
    UnknownItemKind, Zone,
};
use super::schema::PLAYLIST_VERSIONED_SCHEMAS;
use super::PlaylistStore;
use crate::sqlite_persistence::open_versioned_db;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct SqlitePlaylistStore {
    conn: Arc<Mutex<Connection>>,
}

/// Item columns as stored, before kind and JSON decoding.
struct ItemRow {
    id: i64,
    item_type: String,
    name: String,
    file_resource: String,
    mimetype: String,
    duration: i64,
    filesize: i64,
    properties: Option<String>,
    conditional: Option<String>,
    triggers: Option<String>,
    content_data: Option<String>,
}

impl ItemRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(ItemRow {
            id: row.get("id")?,
            item_type: row.get("item_type")?,
            name: row.get("name")?,
            file_resource: row.get("file_resource")?,
            mimetype: row.get("mimetype")?,
            duration: row.get("duration")?,
            filesize: row.get("filesize")?,
            properties: row.get("properties")?,
            conditional: row.get("conditional")?,
            triggers: row.get("triggers")?,
            content_data: row.get("content_data")?,
        })
    }

    fn into_item(self) -> Result<Item> {
        let kind = ItemKind::from_db_str(&self.item_type).ok_or_else(|| UnknownItemKind {
            item_id: self.id,
            kind: self.item_type.clone(),
        })?;

        let properties: ItemProperties = decode_json(self.properties.as_deref())
            .with_context(|| format!("Invalid properties for item {}", self.id))?
            .unwrap_or_default();
        let conditional: Option<ConditionalWindow> = decode_json(self.conditional.as_deref())
            .with_context(|| format!("Invalid conditional window for item {}", self.id))?;
        let trigger: Option<TriggerSet> = decode_json(self.triggers.as_deref())
            .with_context(|| format!("Invalid triggers for item {}", self.id))?;
        let content_data: BTreeMap<String, String> =
            decode_json(self.content_data.as_deref())
                .with_context(|| format!("Invalid content data for item {}", self.id))?
                .unwrap_or_default();

        Ok(Item {
            id: self.id,
            name: self.name,
            kind,
            file_resource: self.file_resource,
            mimetype: self.mimetype,
            duration: self.duration.max(0) as u32,
            filesize: self.filesize.max(0) as u64,
            properties,
            conditional,
            trigger,
            content_data,
        })
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(value: Option<&str>) -> Result<Option<T>> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Ok(Some(serde_json::from_str(s)?)),
    }
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

impl SqlitePlaylistStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), PLAYLIST_VERSIONED_SCHEMAS, "playlist")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn load_zones(conn: &Connection, playlist_id: i64) -> Result<BTreeMap<u32, Zone>> {
        let zones: Option<String> = conn
            .query_row(
                "SELECT zones FROM playlists WHERE id = ?1",
                params![playlist_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        Ok(decode_json(zones.as_deref())
            .with_context(|| format!("Invalid zones for playlist {}", playlist_id))?
            .unwrap_or_default())
    }

    fn nested_ids(conn: &Connection, playlist_id: i64) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT file_resource FROM playlist_items
             WHERE playlist_id = ?1 AND item_type = ?2
             ORDER BY position",
        )?;
        let resources: Vec<String> = stmt
            .query_map(
                params![playlist_id, ItemKind::NestedPlaylist.to_db_str()],
                |row| row.get(0),
            )?
            .collect::<rusqlite::Result<_>>()?;
        Ok(resources
            .iter()
            .filter_map(|r| r.trim().parse::<i64>().ok())
            .collect())
    }

    /// True when `target` can reach `origin` through nested items or zones.
    fn reaches(conn: &Connection, target: i64, origin: i64) -> Result<bool> {
        let mut visited = HashSet::new();
        let mut pending = vec![target];
        while let Some(current) = pending.pop() {
            if current == origin {
                return Ok(true);
            }
            if !visited.insert(current) {
                continue;
            }
            pending.extend(Self::nested_ids(conn, current)?);
            pending.extend(
                Self::load_zones(conn, current)?
                    .values()
                    .map(|zone| zone.playlist_id),
            );
        }
        Ok(false)
    }
}

impl PlaylistStore for SqlitePlaylistStore {
    fn get_playlist(&self, id: i64) -> Result<Option<PlaylistNode>> {
        let conn = self.conn.lock().unwrap();

        let header: Option<(String, String, Option<String>)> = conn
            .query_row(
                "SELECT name, mode, zones FROM playlists WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let (name, mode, zones) = match header {
            None => return Ok(None),
            Some(x) => x,
        };
        let mode = match PlaylistMode::from_db_str(&mode) {
            Some(mode) => mode,
            None => bail!("Playlist {} has unknown mode '{}'", id, mode),
        };
        let zones: BTreeMap<u32, Zone> = decode_json(zones.as_deref())
            .with_context(|| format!("Invalid zones for playlist {}", id))?
            .unwrap_or_default();

        let mut stmt = conn.prepare(
            "SELECT * FROM playlist_items WHERE playlist_id = ?1 ORDER BY position, id",
        )?;
        let rows: Vec<ItemRow> = stmt
            .query_map(params![id], ItemRow::from_row)?
            .collect::<rusqlite::Result<_>>()?;
        let items = rows
            .into_iter()
            .map(ItemRow::into_item)
            .collect::<Result<Vec<_>>>()?;

        debug!("Loaded playlist {} with {} item(s)", id, items.len());
        Ok(Some(PlaylistNode {
            id,
            name,
            mode,
            items,
            zones,
        }))
    }

    fn create_playlist(
        &self,
        name: &str,
        mode: PlaylistMode,
        zones: &BTreeMap<u32, Zone>,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let zones = match mode {
            PlaylistMode::SingleZone => None,
            PlaylistMode::MultiZone => Some(encode_json(zones)?),
        };
        conn.execute(
            "INSERT INTO playlists (name, mode, zones) VALUES (?1, ?2, ?3)",
            params![name, mode.to_db_str(), zones],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn add_item(&self, playlist_id: i64, item: &Item) -> Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let exists: bool = tx
            .query_row(
                "SELECT 1 FROM playlists WHERE id = ?1",
                params![playlist_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !exists {
            bail!("Playlist {} does not exist", playlist_id);
        }

        if item.kind == ItemKind::NestedPlaylist {
            let target = match item.nested_playlist_id() {
                Some(id) if id > 0 => id,
                _ => bail!(
                    "Nested playlist item references invalid id '{}'",
                    item.file_resource
                ),
            };
            if Self::reaches(&tx, target, playlist_id)? {
                bail!(
                    "Adding playlist {} to playlist {} would create a cycle",
                    target,
                    playlist_id
                );
            }
        }

        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM playlist_items WHERE playlist_id = ?1",
            params![playlist_id],
            |row| row.get(0),
        )?;

        let conditional = item.conditional.as_ref().map(encode_json).transpose()?;
        let triggers = item.trigger.as_ref().map(encode_json).transpose()?;
        let content_data = if item.content_data.is_empty() {
            None
        } else {
            Some(encode_json(&item.content_data)?)
        };

        tx.execute(
            "INSERT INTO playlist_items (
                playlist_id, position, item_type, name, file_resource, mimetype,
                duration, filesize, properties, conditional, triggers, content_data
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                playlist_id,
                position,
                item.kind.to_db_str(),
                item.name,
                item.file_resource,
                item.mimetype,
                item.duration as i64,
                item.filesize as i64,
                encode_json(&item.properties)?,
                conditional,
                triggers,
                content_data,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    fn get_nested_playlist_ids(&self, playlist_id: i64) -> Result<Vec<i64>> {
        let conn = self.conn.lock().unwrap();
        Self::nested_ids(&conn, playlist_id)
    }
}
