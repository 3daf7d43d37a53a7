//! Playlist, item and scheduling models.
//!
//! These are read-only inputs to the compiler. They are authored by the
//! editing subsystem and persisted by [`super::SqlitePlaylistStore`].

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// Playlists
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistMode {
    SingleZone,
    MultiZone,
}

impl PlaylistMode {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "single" => Some(PlaylistMode::SingleZone),
            "multizone" => Some(PlaylistMode::MultiZone),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PlaylistMode::SingleZone => "single",
            PlaylistMode::MultiZone => "multizone",
        }
    }
}

/// One screen zone of a multi-zone playlist. Geometry is in percent of
/// the player's screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub playlist_id: i64,
    #[serde(default)]
    pub left: u32,
    #[serde(default)]
    pub top: u32,
    #[serde(default = "full_extent")]
    pub width: u32,
    #[serde(default = "full_extent")]
    pub height: u32,
}

fn full_extent() -> u32 {
    100
}

impl Zone {
    pub fn full_screen(playlist_id: i64) -> Self {
        Zone {
            playlist_id,
            left: 0,
            top: 0,
            width: 100,
            height: 100,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaylistNode {
    pub id: i64,
    pub name: String,
    pub mode: PlaylistMode,
    pub items: Vec<Item>,
    /// Zone id to zone, only populated for [`PlaylistMode::MultiZone`].
    pub zones: BTreeMap<u32, Zone>,
}

// =============================================================================
// Items
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// A file from the media pool.
    Media,
    /// A media file addressed by absolute URL.
    ExternalMedia,
    /// Another internal playlist, `file_resource` holds its id.
    NestedPlaylist,
    /// A rendered template, served from the template output directory.
    Template,
    /// An external playlist feed, `file_resource` holds its URL.
    Channel,
}

impl ItemKind {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "mediapool" => Some(ItemKind::Media),
            "media_extern" => Some(ItemKind::ExternalMedia),
            "playlist" => Some(ItemKind::NestedPlaylist),
            "template" => Some(ItemKind::Template),
            "channel" => Some(ItemKind::Channel),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ItemKind::Media => "mediapool",
            ItemKind::ExternalMedia => "media_extern",
            ItemKind::NestedPlaylist => "playlist",
            ItemKind::Template => "template",
            ItemKind::Channel => "channel",
        }
    }
}

/// Persisted item kind that does not map to any [`ItemKind`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("item {item_id} has unknown kind '{kind}'")]
pub struct UnknownItemKind {
    pub item_id: i64,
    pub kind: String,
}

/// Presentation properties. Unset values fall back to the compiler defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemProperties {
    pub fit: Option<String>,
    pub media_align: Option<String>,
    pub volume: Option<u8>,
    pub categories: Vec<String>,
    pub animation: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub kind: ItemKind,
    pub file_resource: String,
    pub mimetype: String,
    /// Seconds.
    pub duration: u32,
    pub filesize: u64,
    pub properties: ItemProperties,
    pub conditional: Option<ConditionalWindow>,
    pub trigger: Option<TriggerSet>,
    pub content_data: BTreeMap<String, String>,
}

impl Item {
    /// Convenience constructor used by the editing side and tests.
    pub fn new(kind: ItemKind, name: &str, file_resource: &str, mimetype: &str) -> Self {
        Item {
            id: 0,
            name: name.to_string(),
            kind,
            file_resource: file_resource.to_string(),
            mimetype: mimetype.to_string(),
            duration: 0,
            filesize: 0,
            properties: ItemProperties::default(),
            conditional: None,
            trigger: None,
            content_data: BTreeMap::new(),
        }
    }

    /// Target id of a nested-playlist item, if it parses.
    pub fn nested_playlist_id(&self) -> Option<i64> {
        match self.kind {
            ItemKind::NestedPlaylist => self.file_resource.trim().parse().ok(),
            _ => None,
        }
    }
}

// =============================================================================
// Conditional play windows
// =============================================================================

/// Time-of-day window for a single weekday, in 15-minute ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekTime {
    pub from: u16,
    pub until: u16,
}

/// When an item may play. `None` bounds are unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionalWindow {
    pub date_from: Option<NaiveDate>,
    pub date_until: Option<NaiveDate>,
    pub time_from: Option<NaiveTime>,
    pub time_until: Option<NaiveTime>,
    /// Bit 1 is Monday through bit 64 for Sunday. 0 and 127 both mean every day.
    pub weekdays: u8,
    /// Weekday bit value to that day's play window.
    pub weektimes: BTreeMap<u8, WeekTime>,
}

// =============================================================================
// Triggers
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallclockTrigger {
    pub iso_date_time: String,
    pub weekday_offset: i8,
    /// -1 no repeat, 0 repeat forever, n > 0 repeat n times.
    pub repeat_count: i32,
    pub repeat_minutes: u32,
    pub repeat_hours: u32,
    pub repeat_days: u32,
    pub repeat_weeks: u32,
    pub repeat_months: u32,
    pub repeat_years: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyTrigger {
    pub key: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchTrigger {
    pub item_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyTrigger {
    pub token: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSet {
    pub wallclocks: Vec<WallclockTrigger>,
    pub accesskeys: Vec<AccessKeyTrigger>,
    pub touches: Vec<TouchTrigger>,
    pub notifies: Vec<NotifyTrigger>,
}

impl TriggerSet {
    pub fn is_empty(&self) -> bool {
        self.wallclocks.is_empty()
            && self.accesskeys.is_empty()
            && self.touches.is_empty()
            && self.notifies.is_empty()
    }
}
