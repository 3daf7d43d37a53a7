//! Placeholder scanning and recursive substitution.
//!
//! Section text is scanned once into a list of [`Fragment`]s. Substituted
//! content is emitted as-is and never scanned again at the same level, and
//! text from external feeds is never scanned at all.

use super::content_source::{ContentSource, ExternalSource};
use super::error::CompileError;
use crate::server::metrics::record_subtree_failure;
use futures::future::BoxFuture;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Mutex;
use tracing::{debug, warn};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{(ITEMS|PREFETCH)_(\d+)(?:#([^}]*))?\}").unwrap();
}

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fragment<'a> {
    Text(&'a str),
    Items(i64),
    Prefetch(i64),
    External(&'a str),
    /// A placeholder that names no playlist, kept verbatim for diagnostics.
    Invalid(&'a str),
}

pub fn scan(text: &str) -> Vec<Fragment<'_>> {
    let mut fragments = Vec::new();
    let mut last = 0;
    for captures in PLACEHOLDER.captures_iter(text) {
        let whole = match captures.get(0) {
            Some(m) => m,
            None => continue,
        };
        if whole.start() > last {
            fragments.push(Fragment::Text(&text[last..whole.start()]));
        }
        last = whole.end();

        let is_items = &captures[1] == "ITEMS";
        let url = captures.get(3).map(|m| m.as_str().trim());
        let fragment = match captures[2].parse::<i64>() {
            Ok(0) => match url {
                Some(url) if is_items && !url.is_empty() => Fragment::External(url),
                _ => Fragment::Invalid(whole.as_str()),
            },
            Ok(id) if is_items => Fragment::Items(id),
            Ok(id) => Fragment::Prefetch(id),
            Err(_) => Fragment::Invalid(whole.as_str()),
        };
        fragments.push(fragment);
    }
    if last < text.len() {
        fragments.push(Fragment::Text(&text[last..]));
    }
    fragments
}

/// A subtree replaced by empty content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtreeFailure {
    /// The playlist id, URL or placeholder that failed.
    pub reference: String,
    pub kind: &'static str,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    failures: Mutex<Vec<SubtreeFailure>>,
}

impl Diagnostics {
    pub fn record(&self, reference: &str, error: &CompileError) {
        warn!("Subtree {} replaced by empty content: {}", reference, error);
        record_subtree_failure(error.kind());
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SubtreeFailure {
                reference: reference.to_string(),
                kind: error.kind(),
                error: error.to_string(),
            });
    }

    pub fn failures(&self) -> Vec<SubtreeFailure> {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn into_failures(self) -> Vec<SubtreeFailure> {
        self.failures.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct PlaceholderResolver<'a> {
    internal: &'a dyn ContentSource,
    external: &'a dyn ExternalSource,
    max_depth: usize,
    diagnostics: &'a Diagnostics,
}

impl<'a> PlaceholderResolver<'a> {
    pub fn new(
        internal: &'a dyn ContentSource,
        external: &'a dyn ExternalSource,
        max_depth: usize,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            internal,
            external,
            max_depth,
            diagnostics,
        }
    }

    /// Substitutes every placeholder in `text`, which sits at nesting `depth`.
    ///
    /// Only non-recoverable errors are returned. Everything else empties the
    /// failing placeholder and lands in the diagnostics.
    pub fn resolve<'s>(&'s self, text: &'s str, depth: usize) -> BoxFuture<'s, Result<String, CompileError>> {
        Box::pin(async move {
            let mut out = String::with_capacity(text.len());
            for fragment in scan(text) {
                match fragment {
                    Fragment::Text(text) => out.push_str(text),
                    Fragment::Items(id) => {
                        let nested = self.resolve_internal(id, depth, Section::Items).await?;
                        push_nested(&mut out, &nested);
                    }
                    Fragment::Prefetch(id) => {
                        let nested = self.resolve_internal(id, depth, Section::Prefetch).await?;
                        push_nested(&mut out, &nested);
                    }
                    Fragment::External(url) => {
                        let fetched = self.resolve_external(url).await?;
                        push_nested(&mut out, &fetched);
                    }
                    Fragment::Invalid(raw) => {
                        self.diagnostics
                            .record(raw, &CompileError::InvalidReference(raw.to_string()));
                    }
                }
            }
            Ok(out)
        })
    }

    async fn resolve_internal(
        &self,
        playlist_id: i64,
        depth: usize,
        section: Section,
    ) -> Result<String, CompileError> {
        let reference = format!("playlist {}", playlist_id);
        if depth >= self.max_depth {
            self.diagnostics
                .record(&reference, &CompileError::DepthExceeded(self.max_depth));
            return Ok(String::new());
        }

        let fetched = match section {
            Section::Items => self.internal.fetch_items(playlist_id),
            Section::Prefetch => self.internal.fetch_prefetch(playlist_id),
        };
        let text = match fetched {
            Ok(text) => text,
            Err(err) => return self.recover(&reference, err),
        };
        debug!("Resolving {} at depth {}", reference, depth + 1);
        self.resolve(&text, depth + 1).await
    }

    async fn resolve_external(&self, url: &str) -> Result<String, CompileError> {
        match self.external.fetch_items(url).await {
            Ok(text) => Ok(text),
            Err(err) => self.recover(url, err),
        }
    }

    fn recover(&self, reference: &str, err: CompileError) -> Result<String, CompileError> {
        if err.is_recoverable() {
            self.diagnostics.record(reference, &err);
            Ok(String::new())
        } else {
            Err(err)
        }
    }
}

#[derive(Clone, Copy)]
enum Section {
    Items,
    Prefetch,
}

fn push_nested(out: &mut String, nested: &str) {
    if !nested.is_empty() {
        out.push('\n');
        out.push_str(nested);
        out.push('\n');
    }
}
