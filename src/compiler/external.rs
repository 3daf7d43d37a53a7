//! HTTP-backed source for external playlist feeds.

use super::content_source::ExternalSource;
use super::error::CompileError;
use crate::server::metrics::record_external_fetch;
use anyhow::{Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Entries older than this are evicted rather than revalidated.
const MIN_RETENTION: Duration = Duration::from_secs(600);
const MAX_CACHED_FEEDS: usize = 256;

lazy_static! {
    static ref BODY_ELEMENT: Regex = Regex::new(r"(?s)<body[^>]*>(.*)</body>").unwrap();
}

/// Inner content of the feed's `<body>`, or the whole text without one.
pub fn extract_body(feed: &str) -> &str {
    BODY_ELEMENT
        .captures(feed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(feed)
}

#[derive(Clone, Debug)]
struct CachedFeed {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: Instant,
}

pub struct HttpExternalSource {
    client: reqwest::Client,
    ttl: Duration,
    retention: Duration,
    cache: Mutex<HashMap<String, CachedFeed>>,
}

impl HttpExternalSource {
    pub fn new(timeout_sec: u64, cache_ttl_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            ttl: Duration::from_secs(cache_ttl_sec),
            retention: Duration::from_secs(cache_ttl_sec.saturating_mul(4)).max(MIN_RETENTION),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn cached(&self, url: &str) -> Option<CachedFeed> {
        self.cache.lock().unwrap().get(url).cloned()
    }

    fn store(&self, url: &str, feed: CachedFeed) {
        let mut cache = self.cache.lock().unwrap();
        cache.retain(|_, cached| cached.fetched_at.elapsed() < self.retention);
        if cache.len() >= MAX_CACHED_FEEDS && !cache.contains_key(url) {
            let oldest = cache
                .iter()
                .min_by_key(|(_, cached)| cached.fetched_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!("Evicting external playlist {} from cache", oldest);
                cache.remove(&oldest);
            }
        }
        cache.insert(url.to_string(), feed);
    }

    fn failure(url: &str, outcome: &str, reason: String) -> CompileError {
        record_external_fetch(outcome);
        CompileError::External {
            url: url.to_string(),
            reason,
        }
    }
}

fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl ExternalSource for HttpExternalSource {
    async fn fetch_items(&self, url: &str) -> Result<String, CompileError> {
        let cached = self.cached(url);
        if let Some(feed) = &cached {
            if feed.fetched_at.elapsed() < self.ttl {
                record_external_fetch("cache_hit");
                return Ok(feed.body.clone());
            }
        }

        let mut request = self.client.get(url);
        if let Some(feed) = &cached {
            if let Some(etag) = &feed.etag {
                request = request.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = &feed.last_modified {
                request = request.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return Err(Self::failure(url, "timeout", "request timed out".to_string()))
            }
            Err(err) => return Err(Self::failure(url, "error", err.to_string())),
        };

        if response.status() == StatusCode::NOT_MODIFIED {
            if let Some(mut feed) = cached {
                debug!("External playlist {} not modified", url);
                record_external_fetch("revalidated");
                feed.fetched_at = Instant::now();
                let body = feed.body.clone();
                self.store(url, feed);
                return Ok(body);
            }
        }

        if !response.status().is_success() {
            return Err(Self::failure(
                url,
                "error",
                format!("unexpected status {}", response.status()),
            ));
        }

        let etag = header_value(&response, ETAG);
        let last_modified = header_value(&response, LAST_MODIFIED);
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) if err.is_timeout() => {
                return Err(Self::failure(url, "timeout", "body timed out".to_string()))
            }
            Err(err) => return Err(Self::failure(url, "error", err.to_string())),
        };

        let body = extract_body(&text).to_string();
        record_external_fetch("fetched");
        debug!("Fetched external playlist {} ({} bytes)", url, body.len());
        self.store(
            url,
            CachedFeed {
                body: body.clone(),
                etag,
                last_modified,
                fetched_at: Instant::now(),
            },
        );
        Ok(body)
    }
}
