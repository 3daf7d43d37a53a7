//! Compiles the persisted items of one playlist into section text.
//!
//! Nested and external playlists are not expanded here. They become
//! `{ITEMS_<id>}`, `{PREFETCH_<id>}` and `{ITEMS_0#<url>}` placeholders that
//! the resolver substitutes later.

use super::conditional::compile_conditional;
use super::content_source::Sections;
use super::trigger::compile_begin;
use crate::playlist_store::{Item, ItemKind, PlaylistMode, PlaylistNode};
use quick_xml::escape::escape;

/// Presentation defaults for properties an item leaves unset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerDefaults {
    pub fit: String,
    pub media_align: String,
    pub volume: u8,
    /// Prefix for media pool resources.
    pub media_base_url: String,
    /// Prefix for rendered templates.
    pub template_base_url: String,
}

impl Default for CompilerDefaults {
    fn default() -> Self {
        Self {
            fit: "meetBest".to_string(),
            media_align: "center".to_string(),
            volume: 100,
            media_base_url: "/mediapool".to_string(),
            template_base_url: "/templates".to_string(),
        }
    }
}

fn join_url(base: &str, resource: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        resource.trim_start_matches('/')
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Element {
    Image,
    Video,
    Audio,
    Reference,
}

impl Element {
    fn for_mimetype(mimetype: &str) -> Self {
        match mimetype.split('/').next().unwrap_or_default() {
            "image" => Element::Image,
            "video" => Element::Video,
            "audio" => Element::Audio,
            _ => Element::Reference,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Element::Image => "img",
            Element::Video => "video",
            Element::Audio => "audio",
            Element::Reference => "ref",
        }
    }

    fn has_sound(&self) -> bool {
        matches!(self, Element::Video | Element::Audio)
    }
}

#[derive(Clone, Debug)]
pub struct ItemCompiler {
    defaults: CompilerDefaults,
}

impl ItemCompiler {
    pub fn new(defaults: CompilerDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &CompilerDefaults {
        &self.defaults
    }

    /// Section text for one playlist. Multi-zone playlists used as content
    /// contribute their zones' playlists one after the other.
    pub fn compile_playlist(&self, node: &PlaylistNode) -> Sections {
        let mut sections = Sections::default();
        match node.mode {
            PlaylistMode::SingleZone => {
                for item in &node.items {
                    self.compile_item(item, &mut sections);
                }
            }
            PlaylistMode::MultiZone => {
                for zone in node.zones.values() {
                    sections.items.push_str(&format!("{{ITEMS_{}}}\n", zone.playlist_id));
                    sections
                        .prefetch
                        .push_str(&format!("{{PREFETCH_{}}}\n", zone.playlist_id));
                }
            }
        }
        sections
    }

    fn compile_item(&self, item: &Item, sections: &mut Sections) {
        let guard = item
            .conditional
            .as_ref()
            .map(compile_conditional)
            .unwrap_or_default();
        let begin = item.trigger.as_ref().map(compile_begin).unwrap_or_default();

        let (body, prefetch) = match item.kind {
            ItemKind::Media => {
                let src = join_url(&self.defaults.media_base_url, &item.file_resource);
                (self.media_element(item, &src, &guard, &begin), Some(src))
            }
            ItemKind::ExternalMedia => {
                let src = item.file_resource.trim().to_string();
                (self.media_element(item, &src, &guard, &begin), Some(src))
            }
            ItemKind::Template => {
                let src = join_url(&self.defaults.template_base_url, &item.file_resource);
                (self.media_element(item, &src, &guard, &begin), Some(src))
            }
            ItemKind::NestedPlaylist => {
                // Unparsable references become an id-0 placeholder so the
                // resolver reports them.
                let id = item.nested_playlist_id().unwrap_or(0);
                sections.prefetch.push_str(&format!("{{PREFETCH_{}}}\n", id));
                (
                    wrap_in_seq(&format!("{{ITEMS_{}}}", id), &guard, &begin),
                    None,
                )
            }
            ItemKind::Channel => (
                wrap_in_seq(
                    &format!("{{ITEMS_0#{}}}", item.file_resource.trim()),
                    &guard,
                    &begin,
                ),
                None,
            ),
        };

        if begin.is_empty() {
            sections.items.push_str(&body);
        } else {
            sections.exclusive.push_str(&body);
        }
        if let Some(src) = prefetch {
            sections
                .prefetch
                .push_str(&format!("<prefetch src=\"{}\" />\n", escape(src.as_str())));
        }
    }

    fn media_element(&self, item: &Item, src: &str, guard: &str, begin: &str) -> String {
        let element = match item.kind {
            ItemKind::Template => Element::Reference,
            _ => Element::for_mimetype(&item.mimetype),
        };
        let props = &item.properties;
        let fit = props.fit.as_deref().unwrap_or(&self.defaults.fit);
        let align = props
            .media_align
            .as_deref()
            .unwrap_or(&self.defaults.media_align);

        let mut attributes = format!(
            "xml:id=\"item{}\" title=\"{}\" {}{}region=\"screen\" src=\"{}\"",
            item.id,
            escape(item.name.as_str()),
            guard,
            begin,
            escape(src)
        );
        if item.duration > 0 {
            attributes.push_str(&format!(" dur=\"{}s\"", item.duration));
        }
        if element == Element::Reference && !item.mimetype.is_empty() {
            attributes.push_str(&format!(" type=\"{}\"", escape(item.mimetype.as_str())));
        }
        attributes.push_str(&format!(
            " fit=\"{}\" mediaAlign=\"{}\"",
            escape(fit),
            escape(align)
        ));
        if element.has_sound() {
            let volume = props.volume.unwrap_or(self.defaults.volume).min(100);
            attributes.push_str(&format!(" soundLevel=\"{}%\"", volume));
        }

        let params = self.params(item);
        if params.is_empty() {
            format!("<{} {} />\n", element.tag(), attributes)
        } else {
            format!(
                "<{tag} {attributes}>\n{params}</{tag}>\n",
                tag = element.tag(),
                attributes = attributes,
                params = params
            )
        }
    }

    fn params(&self, item: &Item) -> String {
        let mut params = String::new();
        for (name, value) in &item.content_data {
            params.push_str(&format!(
                "<param name=\"{}\" value=\"{}\" />\n",
                escape(name.as_str()),
                escape(value.as_str())
            ));
        }
        for category in &item.properties.categories {
            params.push_str(&format!(
                "<param name=\"category\" value=\"{}\" />\n",
                escape(category.as_str())
            ));
        }
        if let Some(animation) = &item.properties.animation {
            params.push_str(&format!(
                "<param name=\"animation\" value=\"{}\" />\n",
                escape(animation.as_str())
            ));
        }
        params
    }
}

fn wrap_in_seq(content: &str, guard: &str, begin: &str) -> String {
    if guard.is_empty() && begin.is_empty() {
        format!("{}\n", content)
    } else {
        let attributes = format!("{}{}", guard, begin);
        format!("<seq {}>\n{}\n</seq>\n", attributes.trim_end(), content)
    }
}
