//! Conditional GET/HEAD handling for stored documents.

use super::index_files::StoredDocument;
use crate::server::metrics::record_document_response;
use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE,
    ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use axum::http::{request::Parts, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use std::convert::Infallible;
use tracing::{debug, warn};

const CACHE_POLICY: &str = "public, must-revalidate, max-age=864000, pre-check=864000";
const CORS_METHODS: &str = "HEAD, GET, OPTIONS";
const CORS_HEADERS: &str = "If-Modified-Since, If-None-Match, Authorization, User-Agent";
const CORS_MAX_AGE: &str = "86400";
const CONTENT_DESCRIPTION: HeaderName = HeaderName::from_static("content-description");

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const RFC_850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

pub fn format_http_date(date: DateTime<Utc>) -> String {
    date.format(IMF_FIXDATE).to_string()
}

/// Accepts the three date formats HTTP/1.1 allows.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    [IMF_FIXDATE, RFC_850_DATE, ASCTIME_DATE]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// The cache validators a player sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionalHeaders {
    pub if_none_match: Option<String>,
    /// `None` when absent or unparsable.
    pub if_modified_since: Option<DateTime<Utc>>,
}

impl ConditionalHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            if_none_match: text(IF_NONE_MATCH),
            if_modified_since: text(IF_MODIFIED_SINCE).and_then(|v| parse_http_date(&v)),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ConditionalHeaders {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    NotModified,
    Modified,
}

/// If-None-Match decides alone when present. Otherwise If-Modified-Since
/// must be strictly newer than the document, compared at second precision.
pub fn evaluate(
    headers: &ConditionalHeaders,
    fingerprint: &str,
    last_modified: DateTime<Utc>,
) -> Freshness {
    if let Some(tag) = &headers.if_none_match {
        return if tag == fingerprint {
            Freshness::NotModified
        } else {
            Freshness::Modified
        };
    }
    match headers.if_modified_since {
        Some(since) if since > last_modified.trunc_subsecs(0) => Freshness::NotModified,
        _ => Freshness::Modified,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Index,
    TaskSchedule,
}

impl DocumentKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentKind::Index => "application/smil+xml",
            DocumentKind::TaskSchedule => "application/xml",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentKind::Index => "index.smil",
            DocumentKind::TaskSchedule => "task_schedule.xml",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Index => "index",
            DocumentKind::TaskSchedule => "task_schedule",
        }
    }
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => warn!("Skipping invalid {} header value {:?}", name, value),
    }
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_HEADERS),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(CORS_MAX_AGE));
    headers
}

/// 200 or 304 for `document`. HEAD requests never get a body.
pub fn document_response(
    method: &Method,
    conditional: &ConditionalHeaders,
    document: &StoredDocument,
    kind: DocumentKind,
) -> Response {
    let freshness = evaluate(conditional, &document.fingerprint, document.last_modified);

    let mut headers = cors_headers();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_POLICY));
    insert_header(&mut headers, ETAG, &document.fingerprint);
    insert_header(
        &mut headers,
        LAST_MODIFIED,
        &format_http_date(document.last_modified),
    );

    let status = match freshness {
        Freshness::NotModified => StatusCode::NOT_MODIFIED,
        Freshness::Modified => StatusCode::OK,
    };
    record_document_response(kind.label(), status.as_u16());
    debug!(
        "{} {} for {:?} ({})",
        method,
        status.as_u16(),
        document.path,
        document.fingerprint
    );

    if status == StatusCode::NOT_MODIFIED || method == Method::HEAD {
        return (status, headers).into_response();
    }

    headers.insert(CONTENT_TYPE, HeaderValue::from_static(kind.content_type()));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(document.body.len()));
    headers.insert(CONTENT_DESCRIPTION, HeaderValue::from_static("File Transfer"));
    insert_header(
        &mut headers,
        CONTENT_DISPOSITION,
        &format!("attachment; filename=\"{}\"", kind.file_name()),
    );
    (status, headers, Body::from(document.body.clone())).into_response()
}

/// CORS preflight answer.
pub fn cors_preflight() -> Response {
    (StatusCode::OK, cors_headers()).into_response()
}
