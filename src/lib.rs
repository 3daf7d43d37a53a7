//! Signage Index Server Library
//!
//! Compiles player playlists into SMIL index documents and serves them
//! with conditional GET semantics.

pub mod compiler;
pub mod config;
pub mod delivery;
pub mod player_store;
pub mod playlist_store;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use compiler::{CompilerDefaults, IndexCompiler};
pub use delivery::IndexPublisher;
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
