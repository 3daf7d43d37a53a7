use crate::playlist_store::UnknownItemKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("playlist {0} not found")]
    PlaylistNotFound(i64),

    #[error(transparent)]
    UnknownItemKind(#[from] UnknownItemKind),

    #[error("external playlist {url}: {reason}")]
    External { url: String, reason: String },

    #[error("nesting deeper than {0} levels")]
    DepthExceeded(usize),

    #[error("invalid playlist reference '{0}'")]
    InvalidReference(String),

    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl CompileError {
    /// Maps a store error, keeping unknown item kinds distinguishable.
    pub fn from_store(err: anyhow::Error) -> Self {
        match err.downcast::<UnknownItemKind>() {
            Ok(unknown) => CompileError::UnknownItemKind(unknown),
            Err(err) => CompileError::Storage(err),
        }
    }

    /// Recoverable errors only empty the failing subtree.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CompileError::UnknownItemKind(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::PlaylistNotFound(_) => "playlist_not_found",
            CompileError::UnknownItemKind(_) => "unknown_item_kind",
            CompileError::External { .. } => "external",
            CompileError::DepthExceeded(_) => "depth_exceeded",
            CompileError::InvalidReference(_) => "invalid_reference",
            CompileError::Storage(_) => "storage",
        }
    }
}
