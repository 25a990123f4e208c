//! CDXJ index entries.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// JSON tail of a CDXJ line. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFields {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub length: String,
    pub offset: String,
    pub filename: String,
}

/// One index line: canonical key, 14-digit timestamp and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub urlkey: String,
    pub timestamp: String,
    pub fields: IndexFields,
    /// `Referer` of the captured request; feeds page detection, never written.
    pub referrer: Option<String>,
}

impl IndexEntry {
    /// Render as `<urlkey> <timestamp> <json>` without a trailing newline.
    pub fn to_line(&self) -> serde_json::Result<String> {
        Ok(format!(
            "{} {} {}",
            self.urlkey,
            self.timestamp,
            serde_json::to_string(&self.fields)?
        ))
    }

    /// Parse a line produced by [`IndexEntry::to_line`].
    #[must_use]
    pub fn from_line(line: &str) -> Option<Self> {
        let mut parts = line.splitn(3, ' ');
        let urlkey = parts.next()?.to_string();
        let timestamp = parts.next()?.to_string();
        let fields = serde_json::from_str(parts.next()?).ok()?;
        Some(Self {
            urlkey,
            timestamp,
            fields,
            referrer: None,
        })
    }

    /// Sort order of the index: `(urlkey, timestamp)`, then the rest of the line.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.urlkey
            .cmp(&other.urlkey)
            .then_with(|| self.timestamp.cmp(&other.timestamp))
            .then_with(|| self.fields.filename.cmp(&other.fields.filename))
            .then_with(|| offset_value(self).cmp(&offset_value(other)))
            .then_with(|| self.fields.url.cmp(&other.fields.url))
    }
}

fn offset_value(entry: &IndexEntry) -> u64 {
    entry.fields.offset.parse().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(urlkey: &str, ts: &str, offset: u64) -> IndexEntry {
        IndexEntry {
            urlkey: urlkey.to_string(),
            timestamp: ts.to_string(),
            fields: IndexFields {
                url: "http://www.example.com/".to_string(),
                mime: Some("text/html".to_string()),
                status: Some("200".to_string()),
                digest: Some("WJM2KPM4GF3QK2BISVUH2ASX64NOUY7L".to_string()),
                method: None,
                length: "1293".to_string(),
                offset: offset.to_string(),
                filename: "example-collection.warc".to_string(),
            },
            referrer: Some("http://www.example.com/".to_string()),
        }
    }

    #[test]
    fn line_has_key_timestamp_and_json_tail() {
        let line = entry("com,example)/", "20201007212236", 845).to_line().expect("line");
        assert_eq!(
            line,
            r#"com,example)/ 20201007212236 {"url":"http://www.example.com/","mime":"text/html","status":"200","digest":"WJM2KPM4GF3QK2BISVUH2ASX64NOUY7L","length":"1293","offset":"845","filename":"example-collection.warc"}"#
        );
        let parsed = IndexEntry::from_line(&line).expect("parse");
        assert_eq!(parsed.fields, entry("com,example)/", "20201007212236", 845).fields);
        assert!(parsed.referrer.is_none());
    }

    #[test]
    fn sorting_uses_key_then_timestamp_then_numeric_offset() {
        let mut entries = vec![
            entry("com,example)/b", "20200101000000", 0),
            entry("com,example)/a", "20210101000000", 0),
            entry("com,example)/a", "20200101000000", 900),
            entry("com,example)/a", "20200101000000", 80),
        ];
        entries.sort_by(IndexEntry::sort_cmp);
        let order: Vec<_> = entries
            .iter()
            .map(|e| (e.urlkey.as_str(), e.timestamp.as_str(), e.fields.offset.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("com,example)/a", "20200101000000", "80"),
                ("com,example)/a", "20200101000000", "900"),
                ("com,example)/a", "20210101000000", "0"),
                ("com,example)/b", "20200101000000", "0"),
            ]
        );
    }
}
