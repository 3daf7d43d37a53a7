//! SQLite schema for the playlist database.

use crate::sqlite_column;
use crate::sqlite_persistence::{ForeignKey, SqlType, Table, VersionedSchema};

const PLAYLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "playlists",
    foreign_column: "id",
};

/// Playlists. `zones` holds the JSON zone map of multi-zone playlists.
const PLAYLISTS_TABLE_V1: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
        sqlite_column!("mode", SqlType::Text, non_null = true),
        sqlite_column!("zones", SqlType::Text),
    ],
    indices: &[],
};

/// Ordered playlist items. JSON columns carry the optional structured data.
const PLAYLIST_ITEMS_TABLE_V1: Table = Table {
    name: "playlist_items",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "playlist_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PLAYLIST_FK)
        ),
        sqlite_column!("position", SqlType::Integer, non_null = true),
        sqlite_column!("item_type", SqlType::Text, non_null = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
        sqlite_column!("file_resource", SqlType::Text, non_null = true),
        sqlite_column!("mimetype", SqlType::Text, non_null = true),
        sqlite_column!("duration", SqlType::Integer, non_null = true),
        sqlite_column!("filesize", SqlType::Integer, non_null = true),
        sqlite_column!("properties", SqlType::Text),
        sqlite_column!("conditional", SqlType::Text),
        sqlite_column!("triggers", SqlType::Text),
        sqlite_column!("content_data", SqlType::Text),
    ],
    indices: &[(
        "idx_playlist_items_playlist_position",
        "playlist_id, position",
    )],
};

pub const PLAYLIST_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[PLAYLISTS_TABLE_V1, PLAYLIST_ITEMS_TABLE_V1],
    migration: None,
}];
