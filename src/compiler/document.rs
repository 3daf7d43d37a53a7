//! Assembles the index document delivered to a player.

use super::placeholder::SubtreeFailure;
use super::playlist::CompiledPlaylist;
use crate::player_store::{DocumentShape, PlayerRecord};
use quick_xml::escape::escape;
use sha2::{Digest, Sha256};

/// Quoted SHA-256 hex digest, usable as an ETag as-is.
pub fn content_fingerprint(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("\"{:x}\"", hasher.finalize())
}

#[derive(Clone, Debug)]
pub struct DocumentAssembler {
    public_base_url: String,
    default_refresh_sec: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledDocument {
    pub shape: DocumentShape,
    pub head: String,
    pub playlist: CompiledPlaylist,
    /// Subtrees that were replaced by empty content.
    pub failures: Vec<SubtreeFailure>,
}

impl CompiledDocument {
    pub fn render(&self) -> String {
        let mut body = String::from("<body>\n<par>\n");
        if !self.playlist.exclusive.is_empty() {
            body.push_str("<excl>\n<priorityClass higher=\"stop\" peer=\"stop\" lower=\"defer\">\n");
            body.push_str(&self.playlist.exclusive);
            body.push_str("</priorityClass>\n</excl>\n");
        }
        body.push_str(&self.playlist.items);
        if !self.playlist.prefetch.trim().is_empty() {
            body.push_str("<seq xml:id=\"prefetch\">\n");
            body.push_str(&self.playlist.prefetch);
            body.push_str("</seq>\n");
        }
        body.push_str("</par>\n</body>\n");

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <smil xmlns=\"http://www.w3.org/ns/SMIL\" version=\"3.0\" baseProfile=\"Language\">\n\
             {}{}</smil>\n",
            self.head, body
        )
    }

    pub fn fingerprint(&self) -> String {
        content_fingerprint(self.render().as_bytes())
    }
}

impl DocumentAssembler {
    pub fn new(public_base_url: &str, default_refresh_sec: u32) -> Self {
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            default_refresh_sec,
        }
    }

    pub fn task_schedule_url(&self, player: &PlayerRecord) -> String {
        format!("{}/task-schedule/{}", self.public_base_url, player.uuid)
    }

    /// `has_task_schedule` tells whether a task manifest is published for
    /// the player, only full documents subscribe to it.
    pub fn assemble(
        &self,
        player: &PlayerRecord,
        playlist: CompiledPlaylist,
        has_task_schedule: bool,
        failures: Vec<SubtreeFailure>,
    ) -> CompiledDocument {
        let shape = player.document_shape();
        let refresh = if player.refresh_interval > 0 {
            player.refresh_interval
        } else {
            self.default_refresh_sec
        };

        let mut head = String::from("<head>\n");
        head.push_str(&format!(
            "<meta http-equiv=\"Refresh\" content=\"{}\"/>\n",
            refresh
        ));
        if shape == DocumentShape::Full {
            head.push_str(&format!(
                "<meta name=\"title\" content=\"{}\"/>\n",
                escape(player.name.as_str())
            ));
            head.push_str(&self.metadata(player, has_task_schedule));
        }
        head.push_str(&layout(player, &playlist, shape));
        head.push_str("</head>\n");

        CompiledDocument {
            shape,
            head,
            playlist,
            failures,
        }
    }

    fn metadata(&self, player: &PlayerRecord, has_task_schedule: bool) -> String {
        if !has_task_schedule && player.standby_periods.is_empty() {
            return String::new();
        }
        let mut metadata = String::from("<metadata>\n");
        if has_task_schedule {
            metadata.push_str(&format!(
                "<x-server xmlns=\"http://schemas.adfreeinfo.com/x-server\">\n\
                 <subscriptionList>\n\
                 <subscription>\n\
                 <type>TaskSchedule</type>\n\
                 <action>{}</action>\n\
                 <method>get</method>\n\
                 </subscription>\n\
                 </subscriptionList>\n\
                 </x-server>\n",
                escape(self.task_schedule_url(player).as_str())
            ));
        }
        if !player.standby_periods.is_empty() {
            metadata.push_str("<standbyTimes>\n");
            for period in &player.standby_periods {
                metadata.push_str(&format!(
                    "<period start=\"{}\" end=\"{}\"/>\n",
                    period.start.format("%H:%M:%S"),
                    period.end.format("%H:%M:%S")
                ));
            }
            metadata.push_str("</standbyTimes>\n");
        }
        metadata.push_str("</metadata>\n");
        metadata
    }
}

fn region(
    name: &str,
    geometry: (u32, u32, u32, u32),
    z_index: u32,
    shape: DocumentShape,
) -> String {
    let (left, top, width, height) = geometry;
    let id = if shape == DocumentShape::LegacyVendor {
        format!("xml:id=\"{}\" ", name)
    } else {
        String::new()
    };
    format!(
        "<region {}regionName=\"{}\" left=\"{}%\" top=\"{}%\" width=\"{}%\" height=\"{}%\" z-index=\"{}\" backgroundColor=\"transparent\"/>\n",
        id, name, left, top, width, height, z_index
    )
}

fn layout(player: &PlayerRecord, playlist: &CompiledPlaylist, shape: DocumentShape) -> String {
    let mut layout = format!(
        "<layout>\n<root-layout width=\"{}\" height=\"{}\" backgroundColor=\"#000000\"/>\n",
        player.screen_width, player.screen_height
    );
    if playlist.zones.is_empty() {
        layout.push_str(&region("screen", (0, 0, 100, 100), 1, shape));
    } else {
        for (zone_id, zone) in &playlist.zones {
            layout.push_str(&region(
                &format!("screen{}", zone_id),
                (zone.left, zone.top, zone.width, zone.height),
                *zone_id,
                shape,
            ));
        }
    }
    layout.push_str("</layout>\n");
    layout
}
