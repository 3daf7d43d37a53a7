mod models;
mod schema;
mod sqlite_playlist_store;

pub use models::*;
pub use schema::PLAYLIST_VERSIONED_SCHEMAS;
pub use sqlite_playlist_store::SqlitePlaylistStore;

use anyhow::Result;
use std::collections::BTreeMap;

/// Read access for the compiler plus the insert operations the editing
/// subsystem needs.
pub trait PlaylistStore: Send + Sync {
    /// Loads a playlist with its ordered items.
    ///
    /// Fails with an [`UnknownItemKind`] error (reachable through
    /// `anyhow::Error::downcast_ref`) when a persisted item kind is not known.
    fn get_playlist(&self, id: i64) -> Result<Option<PlaylistNode>>;

    fn create_playlist(
        &self,
        name: &str,
        mode: PlaylistMode,
        zones: &BTreeMap<u32, Zone>,
    ) -> Result<i64>;

    /// Appends an item at the end of the playlist and returns its id.
    ///
    /// Nested-playlist items that would make the reference graph cyclic are
    /// rejected here, the compiler relies on it.
    fn add_item(&self, playlist_id: i64, item: &Item) -> Result<i64>;

    /// Ids of the playlists directly referenced by nested-playlist items.
    fn get_nested_playlist_ids(&self, playlist_id: i64) -> Result<Vec<i64>>;
}
