//! SQLite schema for the player database.

use crate::sqlite_column;
use crate::sqlite_persistence::{SqlType, Table, VersionedSchema};

/// Registered players keyed by device uuid. `standby_periods` and
/// `pending_tasks` are JSON.
const PLAYERS_TABLE_V1: Table = Table {
    name: "players",
    columns: &[
        sqlite_column!("uuid", SqlType::Text, is_primary_key = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
        sqlite_column!("model", SqlType::Text, non_null = true),
        sqlite_column!("firmware", SqlType::Text, non_null = true),
        sqlite_column!(
            "playlist_id",
            SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("screen_width", SqlType::Integer, non_null = true),
        sqlite_column!("screen_height", SqlType::Integer, non_null = true),
        sqlite_column!("refresh_interval", SqlType::Integer, non_null = true),
        sqlite_column!("standby_periods", SqlType::Text),
        sqlite_column!("pending_tasks", SqlType::Text),
        sqlite_column!("last_access", SqlType::Text),
    ],
    indices: &[],
};

pub const PLAYER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[PLAYERS_TABLE_V1],
    migration: None,
}];
