//! Page records and the JSONL page-list wire format.

use serde::{Deserialize, Serialize};

use crate::constants::PAGES_FORMAT;

/// How a page entered the page map. Only `Detected` pages can be pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageSource {
    /// Imported from a `recording` warcinfo record.
    Declared,
    /// Reconciled from a caller-supplied page list.
    Override,
    /// Matched the configured main URL.
    MainUrl,
    /// Inferred from an HTML capture; kept only if something referred to it.
    Detected,
}

/// A page surfaced to readers of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub id: String,
    pub url: String,
    /// 14-digit capture timestamp, if known.
    pub timestamp: Option<String>,
    pub title: String,
    pub text: Option<String>,
    pub source: PageSource,
}

impl PageRecord {
    /// New page with the URL as placeholder title and a fresh id.
    #[must_use]
    pub fn new(url: impl Into<String>, timestamp: Option<String>, source: PageSource) -> Self {
        let url = url.into();
        Self {
            id: new_page_id(),
            title: url.clone(),
            url,
            timestamp,
            text: None,
            source,
        }
    }

    /// True while the title is still the URL placeholder.
    #[must_use]
    pub fn has_default_title(&self) -> bool {
        self.title == self.url
    }
}

/// Key of a page map entry: `"{ts}/{url}"`, or the bare URL without timestamp.
#[must_use]
pub fn page_key(timestamp: Option<&str>, url: &str) -> String {
    match timestamp {
        Some(ts) => format!("{ts}/{url}"),
        None => url.to_string(),
    }
}

#[must_use]
pub fn new_page_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// First line of a page list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageListHeader {
    pub format: String,
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_text: Option<bool>,
}

impl PageListHeader {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, has_text: bool) -> Self {
        Self {
            format: PAGES_FORMAT.to_string(),
            id: id.into(),
            title: title.into(),
            description: None,
            has_text: Some(has_text),
        }
    }
}

/// One page line of a page list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub url: String,
    /// ISO-8601 capture time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Page entry embedded in a `recording` warcinfo record.
#[derive(Debug, Clone, Deserialize)]
pub struct DeclaredPage {
    pub url: String,
    #[serde(default, alias = "ts")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// `json-metadata` payload of a warcinfo record.
#[derive(Debug, Clone, Deserialize)]
pub struct WarcinfoMetadata {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "description")]
    pub desc: Option<String>,
    #[serde(default)]
    pub pages: Vec<DeclaredPage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_and_without_timestamp() {
        assert_eq!(
            page_key(Some("20201007212236"), "http://www.example.com/"),
            "20201007212236/http://www.example.com/"
        );
        assert_eq!(page_key(None, "http://www.example.com/"), "http://www.example.com/");
    }

    #[test]
    fn header_serializes_camel_case() {
        let header = PageListHeader::new("pages", "All Pages", true);
        let json = serde_json::to_string(&header).expect("json");
        assert_eq!(
            json,
            r#"{"format":"json-pages-1.0","id":"pages","title":"All Pages","hasText":true}"#
        );
    }

    #[test]
    fn new_page_defaults_title_to_url() {
        let page = PageRecord::new("http://example.com/", None, PageSource::Detected);
        assert!(page.has_default_title());
        assert_eq!(page.id.len(), 32);
    }
}
