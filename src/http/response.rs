//! Writing relayed content back to the caller.
//!
//! # Responsibilities
//! - Frame the buffered upstream body (`Content-Length`, `Last-Modified`)
//! - Serve single byte ranges (`Range` → 206 / 416)
//! - Answer `If-Modified-Since` with 304 against the synthesized timestamp
//!
//! # Design Decisions
//! - `Last-Modified` is the time the relay finished the call, never an
//!   upstream value
//! - Ranges and conditionals apply to GET and HEAD only
//! - Multiple ranges, or any `If-Range`, fall back to the full body

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;

use crate::forward::Relayed;

/// A buffered body ready to be served.
#[derive(Debug, Clone)]
pub struct RelayedContent {
    body: Bytes,
    last_modified: SystemTime,
    content_type: Option<HeaderValue>,
}

impl From<Relayed> for RelayedContent {
    fn from(relayed: Relayed) -> Self {
        Self {
            body: relayed.body,
            last_modified: relayed.relayed_at,
            content_type: relayed.content_type,
        }
    }
}

impl RelayedContent {
    pub fn new(body: impl Into<Bytes>, last_modified: SystemTime) -> Self {
        Self {
            body: body.into(),
            last_modified,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: Option<HeaderValue>) -> Self {
        self.content_type = content_type;
        self
    }

    /// Build the response for a request with `method` and `request_headers`.
    pub fn serve(self, method: &Method, request_headers: &HeaderMap) -> Response {
        let size = self.body.len() as u64;
        let conditional = method == Method::GET || method == Method::HEAD;

        if conditional && self.not_modified(request_headers) {
            let mut response = empty(StatusCode::NOT_MODIFIED);
            self.set_last_modified(response.headers_mut());
            return response;
        }

        let range_header = if conditional && !request_headers.contains_key(header::IF_RANGE) {
            request_headers
                .get(header::RANGE)
                .and_then(|v| v.to_str().ok())
        } else {
            None
        };

        match range_header.map(|h| parse_range(h, size)) {
            Some(Ok(ranges)) if ranges.len() == 1 => self.partial(ranges[0]),
            Some(Err(err)) => {
                let mut response = Response::new(Body::from(format!("invalid range: {err}")));
                *response.status_mut() = StatusCode::RANGE_NOT_SATISFIABLE;
                let headers = response.headers_mut();
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                );
                if let Ok(v) = HeaderValue::from_str(&format!("bytes */{size}")) {
                    headers.insert(header::CONTENT_RANGE, v);
                }
                response
            }
            _ => self.full(),
        }
    }

    fn full(self) -> Response {
        let size = self.body.len() as u64;
        let mut headers = HeaderMap::new();
        self.set_common(&mut headers);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));

        let mut response = Response::new(Body::from(self.body));
        *response.headers_mut() = headers;
        response
    }

    fn partial(self, range: ByteRange) -> Response {
        let size = self.body.len() as u64;
        let mut headers = HeaderMap::new();
        self.set_common(&mut headers);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(range.length));
        if let Ok(v) = HeaderValue::from_str(&range.content_range(size)) {
            headers.insert(header::CONTENT_RANGE, v);
        }

        let start = range.start as usize;
        let end = (range.start + range.length) as usize;
        let mut response = Response::new(Body::from(self.body.slice(start..end)));
        *response.status_mut() = StatusCode::PARTIAL_CONTENT;
        *response.headers_mut() = headers;
        response
    }

    fn set_common(&self, headers: &mut HeaderMap) {
        self.set_last_modified(headers);
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        if let Some(content_type) = &self.content_type {
            headers.insert(header::CONTENT_TYPE, content_type.clone());
        }
    }

    fn set_last_modified(&self, headers: &mut HeaderMap) {
        if let Ok(v) = HeaderValue::from_str(&httpdate::fmt_http_date(self.last_modified)) {
            headers.insert(header::LAST_MODIFIED, v);
        }
    }

    fn not_modified(&self, request_headers: &HeaderMap) -> bool {
        // No validators of our own, so an entity tag can never match.
        if request_headers.contains_key(header::IF_NONE_MATCH) {
            return false;
        }
        let since = match request_headers
            .get(header::IF_MODIFIED_SINCE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| httpdate::parse_http_date(v).ok())
        {
            Some(since) => since,
            None => return false,
        };
        truncate_to_secs(self.last_modified) <= since
    }
}

fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

fn truncate_to_secs(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => UNIX_EPOCH + Duration::from_secs(d.as_secs()),
        Err(_) => time,
    }
}

/// A satisfiable byte range within a body of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub length: u64,
}

impl ByteRange {
    fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.start + self.length - 1, size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// The header does not follow the `bytes=` grammar.
    Invalid,
    /// Well-formed, but no range overlaps the body.
    NoOverlap,
}

impl std::fmt::Display for RangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeError::Invalid => write!(f, "malformed range"),
            RangeError::NoOverlap => write!(f, "failed to overlap"),
        }
    }
}

/// Parse a `Range` header against a body of `size` bytes.
///
/// Returns the satisfiable ranges, clamped to the body. An empty list means the
/// header named no ranges at all and the full body should be served.
pub fn parse_range(header: &str, size: u64) -> Result<Vec<ByteRange>, RangeError> {
    let spec = header.strip_prefix("bytes=").ok_or(RangeError::Invalid)?;

    let mut ranges = Vec::new();
    let mut no_overlap = false;
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (start, end) = part.split_once('-').ok_or(RangeError::Invalid)?;
        let (start, end) = (start.trim(), end.trim());

        if start.is_empty() {
            // Suffix range: the last `end` bytes.
            let suffix: u64 = end.parse().map_err(|_| RangeError::Invalid)?;
            let suffix = suffix.min(size);
            if suffix == 0 {
                no_overlap = true;
                continue;
            }
            ranges.push(ByteRange {
                start: size - suffix,
                length: suffix,
            });
            continue;
        }

        let first: u64 = start.parse().map_err(|_| RangeError::Invalid)?;
        let last = if end.is_empty() {
            None
        } else {
            let last: u64 = end.parse().map_err(|_| RangeError::Invalid)?;
            if last < first {
                return Err(RangeError::Invalid);
            }
            Some(last)
        };

        if first >= size {
            no_overlap = true;
            continue;
        }
        let last = last.map_or(size - 1, |l| l.min(size - 1));
        ranges.push(ByteRange {
            start: first,
            length: last - first + 1,
        });
    }

    if no_overlap && ranges.is_empty() {
        return Err(RangeError::NoOverlap);
    }
    Ok(ranges)
}
