//! Conditional delivery of compiled documents.

mod conditional_get;
mod index_files;
mod publisher;

pub use conditional_get::{
    cors_preflight, document_response, evaluate, format_http_date, parse_http_date,
    ConditionalHeaders, DocumentKind, Freshness,
};
pub use index_files::{IndexFileStore, StoredDocument};
pub use publisher::IndexPublisher;

use crate::compiler::CompileError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::path::PathBuf;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("player lookup failed: {0:#}")]
    PlayerLookup(anyhow::Error),

    #[error("compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("cannot read {}: {source}", path.display())]
    ResourceRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot persist document: {0:#}")]
    Persist(anyhow::Error),

    #[error("no document published")]
    NotFound,
}

impl IntoResponse for DeliveryError {
    fn into_response(self) -> Response {
        match self {
            DeliveryError::NotFound => StatusCode::NOT_FOUND.into_response(),
            err => {
                error!("Document delivery failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
