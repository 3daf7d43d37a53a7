//! Content fixtures seeded straight into the test server's stores

#![allow(dead_code)]

use anyhow::Result;
use rusqlite::{params, Connection};
use signage_index_server::player_store::PlayerStore;
use signage_index_server::playlist_store::{Item, ItemKind, PlaylistMode, PlaylistStore};
use std::collections::BTreeMap;
use std::path::Path;

/// Image item from the media pool
pub fn media_item(name: &str) -> Item {
    let mut item = Item::new(ItemKind::Media, name, &format!("{}.png", name), "image/png");
    item.duration = 10;
    item
}

/// Creates a single-zone playlist holding `items` in order
pub fn create_playlist_with_items(
    store: &dyn PlaylistStore,
    name: &str,
    items: &[Item],
) -> Result<i64> {
    let id = store.create_playlist(name, PlaylistMode::SingleZone, &BTreeMap::new())?;
    for item in items {
        store.add_item(id, item)?;
    }
    Ok(id)
}

/// Points an already registered player at a playlist
pub fn assign_playlist(store: &dyn PlayerStore, uuid: &str, playlist_id: i64) -> Result<()> {
    store.assign_playlist(uuid, playlist_id)
}

/// Rewrites an item's kind to a value the server does not know.
///
/// The store API only accepts valid kinds, so this goes through SQL.
pub fn corrupt_item_kind(db_path: &Path, item_id: i64, kind: &str) -> Result<()> {
    let conn = Connection::open(db_path)?;
    conn.execute(
        "UPDATE playlist_items SET item_type = ?1 WHERE id = ?2",
        params![kind, item_id],
    )?;
    Ok(())
}
