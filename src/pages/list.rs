//! Reading caller-supplied page lists and writing the archive's page lists.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Result, WaczError};
use crate::timestamp::{normalize_timestamp, timestamp_to_iso};
use crate::types::{PageLine, PageListHeader, PageRecord, page_key};

/// Parse a JSONL page list. A leading `{"format": …}` header line is skipped.
pub fn load_page_list(source_name: &str, contents: &str) -> Result<Vec<PageLine>> {
    let mut lines = Vec::new();
    for (index, raw) in contents.lines().enumerate() {
        let line_no = index + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let invalid = |reason: String| WaczError::InvalidPageList {
            source_name: source_name.to_string(),
            line: line_no,
            reason: reason.into(),
        };
        let value: Value = serde_json::from_str(raw).map_err(|err| invalid(err.to_string()))?;
        if value.get("format").is_some() && value.get("url").is_none() {
            continue;
        }
        let page: PageLine =
            serde_json::from_value(value).map_err(|err| invalid(err.to_string()))?;
        if page.url.trim().is_empty() {
            return Err(invalid("empty url".to_string()));
        }
        lines.push(page);
    }
    Ok(lines)
}

/// Pending entries of one override list, keyed `ts/url` or bare `url`.
#[derive(Debug, Clone, Default)]
pub struct OverrideList {
    entries: HashMap<String, PageLine>,
    /// Insertion order, so leftovers are reported deterministically.
    order: Vec<String>,
}

impl OverrideList {
    pub fn from_lines(source_name: &str, lines: Vec<PageLine>) -> Result<Self> {
        let mut list = Self::default();
        for (index, line) in lines.into_iter().enumerate() {
            let timestamp = match line.ts.as_deref() {
                Some(ts) => Some(normalize_timestamp(ts).map_err(|_| {
                    WaczError::InvalidPageList {
                        source_name: source_name.to_string(),
                        line: index + 1,
                        reason: format!("invalid ts '{ts}'").into(),
                    }
                })?),
                None => None,
            };
            let key = page_key(timestamp.as_deref(), &line.url);
            if list.entries.insert(key.clone(), line).is_none() {
                list.order.push(key);
            }
        }
        Ok(list)
    }

    /// True while unconsumed entries remain.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.entries.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }

    /// Key that `ts/url` or `url` would consume, without consuming it.
    #[must_use]
    pub fn matching_key(&self, timestamp: Option<&str>, url: &str) -> Option<String> {
        if let Some(ts) = timestamp {
            let full = page_key(Some(ts), url);
            if self.entries.contains_key(&full) {
                return Some(full);
            }
        }
        self.entries.contains_key(url).then(|| url.to_string())
    }

    /// Remove and return the entry under `key`; a consumed key never matches again.
    pub fn consume(&mut self, key: &str) -> Option<PageLine> {
        self.entries.remove(key)
    }

    /// Entries nothing matched, in list order.
    pub fn leftovers(&self) -> impl Iterator<Item = (&str, &PageLine)> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|line| (key.as_str(), line)))
    }
}

/// Render a page list: header line, then one JSON object per page.
pub fn serialize_page_list(header: &PageListHeader, pages: &[PageRecord]) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec(header)?;
    out.push(b'\n');
    for page in pages {
        let ts = match page.timestamp.as_deref() {
            Some(ts) => Some(timestamp_to_iso(ts)?),
            None => None,
        };
        let line = PageLine {
            id: Some(page.id.clone()),
            url: page.url.clone(),
            ts,
            title: Some(page.title.clone()),
            text: page.text.clone(),
        };
        serde_json::to_writer(&mut out, &line)?;
        out.push(b'\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageSource;

    #[test]
    fn header_and_blank_lines_are_skipped() {
        let contents = "{\"format\":\"json-pages-1.0\",\"id\":\"pages\",\"title\":\"All Pages\"}\n\n\
                        {\"url\":\"http://www.example.com/\",\"ts\":\"2020-10-07T21:22:36Z\",\"title\":\"Example\"}\n";
        let lines = load_page_list("pages.jsonl", contents).expect("load");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].title.as_deref(), Some("Example"));
    }

    #[test]
    fn malformed_line_names_source_and_line() {
        let err = load_page_list("pages.jsonl", "{\"url\":\"http://a/\"}\n{not json\n")
            .expect_err("invalid");
        assert!(matches!(
            err,
            WaczError::InvalidPageList { ref source_name, line: 2, .. } if source_name == "pages.jsonl"
        ));
    }

    #[test]
    fn entries_match_with_or_without_timestamp_and_are_consumed_once() {
        let lines = vec![
            PageLine {
                id: None,
                url: "http://www.example.com/".to_string(),
                ts: Some("2020-10-07T21:22:36Z".to_string()),
                title: None,
                text: None,
            },
            PageLine {
                id: None,
                url: "http://www.example.com/about".to_string(),
                ts: None,
                title: None,
                text: None,
            },
        ];
        let mut list = OverrideList::from_lines("pages.jsonl", lines).expect("list");
        assert!(list.is_active());

        let key = list
            .matching_key(Some("20201007212236"), "http://www.example.com/")
            .expect("ts/url match");
        assert_eq!(key, "20201007212236/http://www.example.com/");
        assert!(list.consume(&key).is_some());
        assert!(list.matching_key(Some("20201007212236"), "http://www.example.com/").is_none());

        assert_eq!(
            list.matching_key(Some("20990101000000"), "http://www.example.com/about").as_deref(),
            Some("http://www.example.com/about")
        );
        let leftovers: Vec<_> = list.leftovers().map(|(key, _)| key.to_string()).collect();
        assert_eq!(leftovers, vec!["http://www.example.com/about".to_string()]);

        assert!(list.consume("http://www.example.com/about").is_some());
        assert_eq!(list.remaining(), 0);
        assert!(!list.is_active());
    }

    #[test]
    fn serialized_list_uses_iso_timestamps() {
        let mut page = PageRecord::new(
            "http://www.example.com/",
            Some("20201007212236".to_string()),
            PageSource::MainUrl,
        );
        page.id = "abc".to_string();
        let bytes = serialize_page_list(&PageListHeader::new("pages", "All Pages", false), &[page])
            .expect("serialize");
        let text = String::from_utf8(bytes).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            r#"{"id":"abc","url":"http://www.example.com/","ts":"2020-10-07T21:22:36Z","title":"http://www.example.com/"}"#
        );
    }
}
