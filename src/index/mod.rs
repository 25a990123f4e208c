//! CDXJ index construction over one or more WARC files.
//!
//! The builder makes a single forward pass over each input. Every record is
//! classified and offered to a [`RecordObserver`] (page detection hooks in
//! here); records admitted by the [`RecordFilter`] also produce an
//! [`IndexEntry`]. Entries are buffered and sorted once all inputs are read.

use crate::classify::{Classification, classify};
use crate::constants::ZIPNUM_BLOCK_LINES;
use crate::error::Result;
use crate::io::{WarcReader, ZipNumIndex, write_zipnum};
use crate::surt::urlkey;
use crate::timestamp::iso_to_timestamp;
use crate::types::{IndexEntry, IndexFields, RecordFilter, RecordType, WarcRecord};

/// Everything an observer learns about one record during the pass.
#[derive(Debug, Clone, Copy)]
pub struct ObservedRecord<'a> {
    pub record: &'a WarcRecord,
    pub classification: &'a Classification,
    /// 14-digit capture time, when the record carries a valid `WARC-Date`.
    pub timestamp: Option<&'a str>,
    /// Index entry produced for this record, if the filter admitted it.
    pub entry: Option<&'a IndexEntry>,
    pub filename: &'a str,
}

/// Hook invoked for every parsed record, indexed or not, in file order.
pub trait RecordObserver {
    fn observe(&mut self, observed: &ObservedRecord<'_>);
}

impl RecordObserver for () {
    fn observe(&mut self, _observed: &ObservedRecord<'_>) {}
}

/// Counters reported after each input file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub records: usize,
    pub indexed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct IndexBuilder {
    records: RecordFilter,
    sort: bool,
    entries: Vec<IndexEntry>,
}

impl IndexBuilder {
    #[must_use]
    pub fn new(records: RecordFilter) -> Self {
        Self {
            records,
            sort: true,
            entries: Vec::new(),
        }
    }

    /// Keep entries in input order instead of sorting them.
    #[must_use]
    pub fn sorted(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Index every record of `data`, recorded under `filename`.
    pub fn add_warc<O: RecordObserver + ?Sized>(
        &mut self,
        filename: &str,
        data: &[u8],
        observer: &mut O,
    ) -> Result<IndexStats> {
        let mut stats = IndexStats::default();
        for item in WarcReader::new(data) {
            let record = match item {
                Ok(record) => record,
                Err(err) => {
                    stats.skipped += 1;
                    tracing::warn!(
                        target = "wacz::index",
                        filename,
                        error = %err,
                        "skipping malformed record"
                    );
                    continue;
                }
            };
            stats.records += 1;

            let classification = classify(&record);
            let timestamp = match record.warc_date().map(iso_to_timestamp) {
                Some(Ok(ts)) => Some(ts),
                Some(Err(err)) => {
                    tracing::warn!(
                        target = "wacz::index",
                        filename,
                        offset = record.offset,
                        error = %err,
                        "record has an unreadable WARC-Date"
                    );
                    None
                }
                None => None,
            };

            let entry = if self.records.admits(&record.record_type) {
                timestamp
                    .as_deref()
                    .and_then(|ts| build_entry(&record, &classification, ts, filename))
            } else {
                None
            };

            observer.observe(&ObservedRecord {
                record: &record,
                classification: &classification,
                timestamp: timestamp.as_deref(),
                entry: entry.as_ref(),
                filename,
            });

            if let Some(entry) = entry {
                stats.indexed += 1;
                self.entries.push(entry);
            }
        }
        tracing::debug!(
            target = "wacz::index",
            filename,
            records = stats.records,
            indexed = stats.indexed,
            skipped = stats.skipped,
            "indexed WARC"
        );
        Ok(stats)
    }

    pub fn finish(mut self) -> Result<IndexOutput> {
        if self.sort {
            self.entries.sort_by(IndexEntry::sort_cmp);
        }
        let lines = self
            .entries
            .iter()
            .map(IndexEntry::to_line)
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(IndexOutput {
            entries: self.entries,
            lines,
        })
    }
}

/// Final index, in sorted order when sorting was requested.
#[derive(Debug, Clone)]
pub struct IndexOutput {
    pub entries: Vec<IndexEntry>,
    pub lines: Vec<String>,
}

impl IndexOutput {
    /// Plain CDXJ, one newline-terminated line per entry.
    #[must_use]
    pub fn cdxj_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for line in &self.lines {
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
        out
    }

    pub fn zipnum(&self) -> Result<ZipNumIndex> {
        write_zipnum(&self.lines, ZIPNUM_BLOCK_LINES)
    }
}

/// Index a set of named WARC files without any page detection.
pub fn index_warcs<'a, I>(inputs: I, records: RecordFilter) -> Result<IndexOutput>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut builder = IndexBuilder::new(records);
    for (filename, data) in inputs {
        builder.add_warc(filename, data, &mut ())?;
    }
    builder.finish()
}

fn build_entry(
    record: &WarcRecord,
    classification: &Classification,
    timestamp: &str,
    filename: &str,
) -> Option<IndexEntry> {
    let url = record.target_uri()?.trim().trim_matches(['<', '>']);
    if url.is_empty() {
        return None;
    }
    let http = record.http.as_ref();
    let digest = record
        .headers
        .get("WARC-Payload-Digest")
        .map(|value| value.strip_prefix("sha1:").unwrap_or(value).to_string());
    let method = match record.record_type {
        RecordType::Request => http.and_then(|h| h.method()).map(str::to_string),
        _ => None,
    };
    let referrer = record.referrer().map(str::to_string);

    Some(IndexEntry {
        urlkey: urlkey(url),
        timestamp: timestamp.to_string(),
        fields: IndexFields {
            url: url.to_string(),
            mime: classification.mime.clone(),
            status: classification.status.clone(),
            digest,
            method,
            length: record.length.to_string(),
            offset: record.offset.to_string(),
            filename: filename.to_string(),
        },
        referrer,
    })
}
