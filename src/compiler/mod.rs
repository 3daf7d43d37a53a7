//! Playlist-to-index compilation.

mod conditional;
mod content_source;
mod document;
mod error;
mod external;
mod index_compiler;
mod item;
mod placeholder;
mod playlist;
mod tasks;
mod trigger;

pub use conditional::{compile_conditional, compile_expression};
pub use content_source::{ContentSource, ExternalSource, Sections, StoredContentSource};
pub use document::{content_fingerprint, CompiledDocument, DocumentAssembler};
pub use error::CompileError;
pub use external::{extract_body, HttpExternalSource};
pub use index_compiler::IndexCompiler;
pub use item::{CompilerDefaults, ItemCompiler};
pub use placeholder::{
    scan, Diagnostics, Fragment, PlaceholderResolver, SubtreeFailure, DEFAULT_MAX_DEPTH,
};
pub use playlist::{CompiledPlaylist, PlaylistCompiler};
pub use tasks::{ScheduledTask, TaskKind, TaskScheduleCompiler};
pub use trigger::{compile_begin, compile_trigger, compile_wallclock};
