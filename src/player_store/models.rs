use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Hardware family of a player, derived from the model string it reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerFamily {
    /// Garlic-based players and their OEM variants.
    Garlic,
    /// IAdea XMP devices with their own SMIL dialect.
    IadeaXmp,
    /// Anything else that claims SMIL support.
    Compatible,
}

impl PlayerFamily {
    pub fn from_model(model: &str) -> Self {
        let model = model.trim().to_ascii_uppercase();
        if model.starts_with("GARLIC") || model.starts_with("IDS-APP") {
            PlayerFamily::Garlic
        } else if model.starts_with("XMP-") || model.starts_with("XDS-") {
            PlayerFamily::IadeaXmp
        } else {
            PlayerFamily::Compatible
        }
    }

    pub fn document_shape(&self) -> DocumentShape {
        match self {
            PlayerFamily::Garlic => DocumentShape::Full,
            PlayerFamily::IadeaXmp => DocumentShape::LegacyVendor,
            PlayerFamily::Compatible => DocumentShape::Minimal,
        }
    }
}

/// Which blocks the assembled index carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentShape {
    /// Meta title and refresh, metadata with subscriptions and standby
    /// periods, layout, playlist.
    Full,
    /// Refresh meta, layout with `xml:id` regions, playlist.
    LegacyVendor,
    /// Refresh meta, layout, playlist.
    Minimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandbyPeriod {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareUpdate {
    pub source_url: String,
    pub version: String,
}

/// Maintenance tasks queued for a player until its next index request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendingTasks {
    pub reboot: bool,
    pub clear_web_cache: bool,
    pub clear_player_cache: bool,
    pub url_list: Option<String>,
    pub configuration: Option<String>,
    pub firmware: Option<FirmwareUpdate>,
}

impl PendingTasks {
    pub fn is_empty(&self) -> bool {
        *self == PendingTasks::default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerRecord {
    pub uuid: String,
    pub name: String,
    pub model: String,
    pub firmware: String,
    /// 0 means no playlist assigned.
    pub playlist_id: i64,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Seconds between two index polls.
    pub refresh_interval: u32,
    pub standby_periods: Vec<StandbyPeriod>,
    pub pending_tasks: PendingTasks,
    pub last_access: Option<DateTime<Utc>>,
}

impl PlayerRecord {
    pub fn new(uuid: &str, name: &str, model: &str, firmware: &str) -> Self {
        PlayerRecord {
            uuid: uuid.to_string(),
            name: name.to_string(),
            model: model.to_string(),
            firmware: firmware.to_string(),
            playlist_id: 0,
            screen_width: 1920,
            screen_height: 1080,
            refresh_interval: 900,
            standby_periods: Vec::new(),
            pending_tasks: PendingTasks::default(),
            last_access: None,
        }
    }

    pub fn family(&self) -> PlayerFamily {
        PlayerFamily::from_model(&self.model)
    }

    pub fn document_shape(&self) -> DocumentShape {
        self.family().document_shape()
    }
}
