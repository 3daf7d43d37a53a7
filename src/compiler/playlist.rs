use super::content_source::{ContentSource, Sections};
use super::error::CompileError;
use super::placeholder::{Diagnostics, PlaceholderResolver};
use crate::playlist_store::Zone;
use std::collections::BTreeMap;
use tracing::debug;

const GENERIC_REGION: &str = "region=\"screen\"";

/// Fully resolved sections for one player, ready to be placed in a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledPlaylist {
    pub items: String,
    pub prefetch: String,
    pub exclusive: String,
    /// Zones by id for multi-zone playlists, empty otherwise.
    pub zones: BTreeMap<u32, Zone>,
}

pub struct PlaylistCompiler<'a> {
    internal: &'a dyn ContentSource,
    resolver: PlaceholderResolver<'a>,
    diagnostics: &'a Diagnostics,
}

impl<'a> PlaylistCompiler<'a> {
    pub fn new(
        internal: &'a dyn ContentSource,
        resolver: PlaceholderResolver<'a>,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            internal,
            resolver,
            diagnostics,
        }
    }

    /// Compiles the playlist assigned to a player. Ids `<= 0` yield nothing.
    pub async fn compile(&self, playlist_id: i64) -> Result<CompiledPlaylist, CompileError> {
        if playlist_id <= 0 {
            return Ok(CompiledPlaylist::default());
        }

        let zones = match self.internal.fetch_zones(playlist_id) {
            Ok(zones) => zones,
            Err(err) if err.is_recoverable() => {
                self.diagnostics
                    .record(&format!("playlist {}", playlist_id), &err);
                return Ok(CompiledPlaylist::default());
            }
            Err(err) => return Err(err),
        };

        if zones.is_empty() {
            let sections = self.resolve_sections(playlist_id).await?;
            Ok(CompiledPlaylist {
                items: format!(
                    "<seq repeatCount=\"indefinite\">\n{}</seq>\n",
                    ensure_trailing_newline(&sections.items)
                ),
                prefetch: sections.prefetch,
                exclusive: sections.exclusive,
                zones,
            })
        } else {
            let mut compiled = CompiledPlaylist::default();
            for (zone_id, zone) in &zones {
                debug!(
                    "Compiling zone {} of playlist {} from playlist {}",
                    zone_id, playlist_id, zone.playlist_id
                );
                let region = format!("region=\"screen{}\"", zone_id);
                let sections = self.resolve_sections(zone.playlist_id).await?;
                compiled.items.push_str(&format!(
                    "<seq xml:id=\"zone{}\" repeatCount=\"indefinite\">\n{}</seq>\n",
                    zone_id,
                    ensure_trailing_newline(&sections.items.replace(GENERIC_REGION, &region))
                ));
                compiled.prefetch.push_str(&sections.prefetch);
                compiled
                    .exclusive
                    .push_str(&sections.exclusive.replace(GENERIC_REGION, &region));
            }
            compiled.zones = zones;
            Ok(compiled)
        }
    }

    /// Fetches and resolves one playlist. Recoverable failures give empty
    /// sections.
    async fn resolve_sections(&self, playlist_id: i64) -> Result<Sections, CompileError> {
        let fetched = match self.internal.fetch_sections(playlist_id) {
            Ok(sections) => sections,
            Err(err) if err.is_recoverable() => {
                self.diagnostics
                    .record(&format!("playlist {}", playlist_id), &err);
                return Ok(Sections::default());
            }
            Err(err) => return Err(err),
        };

        Ok(Sections {
            items: self.resolver.resolve(&fetched.items, 1).await?,
            prefetch: self.resolver.resolve(&fetched.prefetch, 1).await?,
            exclusive: self.resolver.resolve(&fetched.exclusive, 1).await?,
        })
    }
}

fn ensure_trailing_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    }
}
