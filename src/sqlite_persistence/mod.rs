mod versioned_schema;

pub use versioned_schema::{
    open_versioned_db, Column, ForeignKey, SqlType, Table, VersionedSchema,
};

/// Offset added to schema versions when stored in `PRAGMA user_version`,
/// so that foreign SQLite files are never mistaken for ours.
pub const BASE_DB_VERSION: usize = 99000;
