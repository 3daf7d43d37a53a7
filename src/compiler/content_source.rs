use super::error::CompileError;
use super::item::ItemCompiler;
use crate::playlist_store::{PlaylistMode, PlaylistStore, Zone};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The three text sections of a playlist, possibly still holding placeholders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sections {
    pub items: String,
    pub prefetch: String,
    pub exclusive: String,
}

impl Sections {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.prefetch.is_empty() && self.exclusive.is_empty()
    }
}

/// Internal playlists addressed by numeric id.
pub trait ContentSource: Send + Sync {
    fn fetch_sections(&self, playlist_id: i64) -> Result<Sections, CompileError>;

    /// Zone layout of the playlist, empty for single-zone playlists.
    fn fetch_zones(&self, playlist_id: i64) -> Result<BTreeMap<u32, Zone>, CompileError>;

    fn fetch_items(&self, playlist_id: i64) -> Result<String, CompileError> {
        if playlist_id <= 0 {
            return Ok(String::new());
        }
        Ok(self.fetch_sections(playlist_id)?.items)
    }

    fn fetch_prefetch(&self, playlist_id: i64) -> Result<String, CompileError> {
        if playlist_id <= 0 {
            return Ok(String::new());
        }
        Ok(self.fetch_sections(playlist_id)?.prefetch)
    }

    fn fetch_exclusive(&self, playlist_id: i64) -> Result<String, CompileError> {
        if playlist_id <= 0 {
            return Ok(String::new());
        }
        Ok(self.fetch_sections(playlist_id)?.exclusive)
    }
}

/// External playlists addressed by URL.
#[async_trait]
pub trait ExternalSource: Send + Sync {
    async fn fetch_items(&self, url: &str) -> Result<String, CompileError>;
}

/// Compiles section text on demand from the playlist store.
pub struct StoredContentSource {
    store: Arc<dyn PlaylistStore>,
    compiler: ItemCompiler,
}

impl StoredContentSource {
    pub fn new(store: Arc<dyn PlaylistStore>, compiler: ItemCompiler) -> Self {
        Self { store, compiler }
    }
}

impl ContentSource for StoredContentSource {
    fn fetch_sections(&self, playlist_id: i64) -> Result<Sections, CompileError> {
        if playlist_id <= 0 {
            return Ok(Sections::default());
        }
        let node = self
            .store
            .get_playlist(playlist_id)
            .map_err(CompileError::from_store)?
            .ok_or(CompileError::PlaylistNotFound(playlist_id))?;
        Ok(self.compiler.compile_playlist(&node))
    }

    fn fetch_zones(&self, playlist_id: i64) -> Result<BTreeMap<u32, Zone>, CompileError> {
        if playlist_id <= 0 {
            return Ok(BTreeMap::new());
        }
        let node = self
            .store
            .get_playlist(playlist_id)
            .map_err(CompileError::from_store)?
            .ok_or(CompileError::PlaylistNotFound(playlist_id))?;
        Ok(match node.mode {
            PlaylistMode::SingleZone => BTreeMap::new(),
            PlaylistMode::MultiZone => node.zones,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompilerDefaults;
    use crate::playlist_store::{Item, ItemKind, SqlitePlaylistStore};
    use rusqlite::{params, Connection};
    use tempfile::TempDir;

    fn make_source() -> (TempDir, Arc<SqlitePlaylistStore>, StoredContentSource) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqlitePlaylistStore::new(dir.path().join("playlists.db")).unwrap());
        let source = StoredContentSource::new(
            store.clone(),
            ItemCompiler::new(CompilerDefaults::default()),
        );
        (dir, store, source)
    }

    #[test]
    fn non_positive_ids_are_empty() {
        let (_dir, _store, source) = make_source();
        assert_eq!(source.fetch_items(0).unwrap(), "");
        assert_eq!(source.fetch_prefetch(-4).unwrap(), "");
        assert!(source.fetch_sections(0).unwrap().is_empty());
        assert!(source.fetch_zones(0).unwrap().is_empty());
    }

    #[test]
    fn missing_playlist_is_recoverable() {
        let (_dir, _store, source) = make_source();
        let err = source.fetch_items(404).unwrap_err();
        assert!(matches!(err, CompileError::PlaylistNotFound(404)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn compiles_stored_items() {
        let (_dir, store, source) = make_source();
        let id = store
            .create_playlist("p", PlaylistMode::SingleZone, &BTreeMap::new())
            .unwrap();
        store
            .add_item(id, &Item::new(ItemKind::Media, "a", "a.png", "image/png"))
            .unwrap();
        let items = source.fetch_items(id).unwrap();
        assert!(items.starts_with("<img "));
        assert!(items.contains("src=\"/mediapool/a.png\""));
    }

    #[test]
    fn unknown_item_kind_is_fatal() {
        let (dir, store, source) = make_source();
        let id = store
            .create_playlist("p", PlaylistMode::SingleZone, &BTreeMap::new())
            .unwrap();
        store
            .add_item(id, &Item::new(ItemKind::Media, "a", "a.png", "image/png"))
            .unwrap();
        Connection::open(dir.path().join("playlists.db"))
            .unwrap()
            .execute(
                "UPDATE playlist_items SET item_type = 'widget' WHERE playlist_id = ?1",
                params![id],
            )
            .unwrap();

        let err = source.fetch_items(id).unwrap_err();
        assert!(matches!(err, CompileError::UnknownItemKind(_)));
        assert!(!err.is_recoverable());
    }
}
