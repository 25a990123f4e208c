//! Typed view of a single WARC record as produced by [`crate::io::warc`].

use std::borrow::Cow;
use std::fmt;
use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

use crate::error::{Result, WaczError};

/// WARC-Type of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    Warcinfo,
    Response,
    Resource,
    Request,
    Revisit,
    Metadata,
    /// Conversion, continuation and anything non-standard.
    Other(String),
}

impl RecordType {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "warcinfo" => Self::Warcinfo,
            "response" => Self::Response,
            "resource" => Self::Resource,
            "request" => Self::Request,
            "revisit" => Self::Revisit,
            "metadata" => Self::Metadata,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Warcinfo => "warcinfo",
            Self::Response => "response",
            Self::Resource => "resource",
            Self::Request => "request",
            Self::Revisit => "revisit",
            Self::Metadata => "metadata",
            Self::Other(name) => name,
        }
    }

    /// Records whose body is a captured document (candidates for pages and text).
    #[must_use]
    pub fn carries_document(&self) -> bool {
        matches!(self, Self::Response | Self::Resource)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered header block with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, compared case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parsed HTTP message head carried inside a response, request or revisit block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHead {
    /// Request line or status line, verbatim.
    pub start_line: String,
    pub headers: HeaderMap,
}

impl HttpHead {
    /// Status code of a response head (`"200"`), `None` for request heads.
    #[must_use]
    pub fn status_code(&self) -> Option<&str> {
        let mut parts = self.start_line.split_whitespace();
        let protocol = parts.next()?;
        if !protocol.to_ascii_uppercase().starts_with("HTTP/") {
            return None;
        }
        parts
            .next()
            .filter(|code| code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Request method for request heads (`"GET"`).
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        let first = self.start_line.split_whitespace().next()?;
        if first.to_ascii_uppercase().starts_with("HTTP/") {
            None
        } else {
            Some(first)
        }
    }
}

/// One WARC record with its position in the source file.
#[derive(Debug, Clone)]
pub struct WarcRecord {
    pub record_type: RecordType,
    pub headers: HeaderMap,
    pub http: Option<HttpHead>,
    /// The full content block (`Content-Length` bytes).
    pub block: Vec<u8>,
    /// Offset within `block` where the HTTP body starts (0 without HTTP head).
    pub payload_start: usize,
    /// Offset of the record (or of its gzip member) in the source file.
    pub offset: u64,
    /// Length of the record (or of its gzip member) in the source file.
    pub length: u64,
}

impl WarcRecord {
    #[must_use]
    pub fn target_uri(&self) -> Option<&str> {
        self.headers.get("WARC-Target-URI")
    }

    #[must_use]
    pub fn warc_date(&self) -> Option<&str> {
        self.headers.get("WARC-Date")
    }

    /// HTTP `Referer` of the captured exchange, if any.
    #[must_use]
    pub fn referrer(&self) -> Option<&str> {
        self.http
            .as_ref()
            .and_then(|h| h.headers.get("Referer"))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Raw HTTP body (or whole block for records without an HTTP head).
    #[must_use]
    pub fn raw_payload(&self) -> &[u8] {
        self.block.get(self.payload_start..).unwrap_or_default()
    }

    /// Body with chunked transfer-encoding and gzip/deflate content-encoding removed.
    pub fn decoded_payload(&self) -> Result<Cow<'_, [u8]>> {
        let raw = self.raw_payload();
        let Some(http) = &self.http else {
            return Ok(Cow::Borrowed(raw));
        };

        let mut body: Cow<'_, [u8]> = Cow::Borrowed(raw);
        if http
            .headers
            .get("Transfer-Encoding")
            .is_some_and(|te| te.to_ascii_lowercase().contains("chunked"))
        {
            if let Some(dechunked) = dechunk(raw) {
                body = Cow::Owned(dechunked);
            }
        }

        match http
            .headers
            .get("Content-Encoding")
            .map(|ce| ce.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("gzip" | "x-gzip") => {
                let mut out = Vec::new();
                GzDecoder::new(body.as_ref())
                    .read_to_end(&mut out)
                    .map_err(|err| WaczError::ExtractionFailed {
                        reason: format!("gzip body: {err}").into(),
                    })?;
                Ok(Cow::Owned(out))
            }
            Some("deflate") => {
                let mut out = Vec::new();
                ZlibDecoder::new(body.as_ref())
                    .read_to_end(&mut out)
                    .map_err(|err| WaczError::ExtractionFailed {
                        reason: format!("deflate body: {err}").into(),
                    })?;
                Ok(Cow::Owned(out))
            }
            _ => Ok(body),
        }
    }
}

/// Undo HTTP chunked framing; `None` when the body is not actually chunked.
fn dechunk(mut data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    loop {
        let line_end = data.windows(2).position(|w| w == b"\r\n")?;
        let size_line = std::str::from_utf8(&data[..line_end]).ok()?;
        let size_hex = size_line.split(';').next()?.trim();
        let size = usize::from_str_radix(size_hex, 16).ok()?;
        data = &data[line_end + 2..];
        if size == 0 {
            return Some(out);
        }
        out.extend_from_slice(data.get(..size)?);
        data = data.get(size..)?;
        data = data.strip_prefix(b"\r\n").unwrap_or(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(start_line: &str) -> HttpHead {
        HttpHead {
            start_line: start_line.to_string(),
            headers: HeaderMap::new(),
        }
    }

    #[test]
    fn status_and_method_come_from_start_line() {
        assert_eq!(head("HTTP/1.1 302 Found").status_code(), Some("302"));
        assert_eq!(head("HTTP/1.1 302 Found").method(), None);
        assert_eq!(head("GET / HTTP/1.1").status_code(), None);
        assert_eq!(head("GET / HTTP/1.1").method(), Some("GET"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.push("Content-Type", "text/html");
        assert_eq!(headers.get("content-type"), Some("text/html"));
        assert_eq!(headers.get("Content-Length"), None);
    }

    #[test]
    fn chunked_body_is_reassembled() {
        let mut http = head("HTTP/1.1 200 OK");
        http.headers.push("Transfer-Encoding", "chunked");
        let block = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n".to_vec();
        let record = WarcRecord {
            record_type: RecordType::Response,
            headers: HeaderMap::new(),
            http: Some(http),
            block,
            payload_start: 0,
            offset: 0,
            length: 0,
        };
        assert_eq!(record.decoded_payload().expect("decode").as_ref(), b"Wikipedia");
    }
}
