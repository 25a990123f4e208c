//! Record classification: type, effective MIME type and HTTP status.

use crate::constants::HTML_MIME_TYPES;
use crate::types::{RecordType, WarcRecord};

/// MIME recorded for revisit records, which carry no body of their own.
pub const REVISIT_MIME: &str = "warc/revisit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub record_type: RecordType,
    pub mime: Option<String>,
    pub status: Option<String>,
}

impl Classification {
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.mime.as_deref().is_some_and(is_html)
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.status.as_deref().is_some_and(is_redirect)
    }

    /// HTML, not a redirect, and a response or resource: eligible for pages and text.
    #[must_use]
    pub fn is_page_candidate(&self) -> bool {
        self.record_type.carries_document() && self.is_html() && !self.is_redirect()
    }
}

#[must_use]
pub fn classify(record: &WarcRecord) -> Classification {
    let record_type = record.record_type.clone();
    let status = record
        .http
        .as_ref()
        .and_then(|http| http.status_code())
        .map(str::to_string);

    let mime = if record_type == RecordType::Revisit {
        Some(REVISIT_MIME.to_string())
    } else {
        let http_type = record.http.as_ref().and_then(|http| http.headers.get("Content-Type"));
        let declared = if record.http.is_some() {
            http_type
        } else {
            record.headers.get("Content-Type")
        };
        declared.and_then(normalize_mime)
    };

    Classification {
        record_type,
        mime,
        status,
    }
}

/// Strip parameters, trim and lowercase: `Text/HTML; charset=utf-8` → `text/html`.
#[must_use]
pub fn normalize_mime(value: &str) -> Option<String> {
    let base = value.split(';').next().unwrap_or_default().trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_ascii_lowercase())
    }
}

#[must_use]
pub fn is_html(mime: &str) -> bool {
    HTML_MIME_TYPES.contains(&mime)
}

#[must_use]
pub fn is_redirect(status: &str) -> bool {
    status.starts_with('3')
}
