//! Page detection layered on top of the index pass.
//!
//! [`PageDetector`] observes every record the [`IndexBuilder`](crate::index::IndexBuilder)
//! reads. For each one it resolves a single [`PageOutcome`] in precedence order:
//!
//! 1. a `recording` warcinfo record declares the pages and turns detection off,
//! 2. an active override list (caller page list) is reconciled,
//! 3. the configured main URL is matched,
//! 4. with detection on, an HTML capture becomes a provisional page.
//!
//! Referrers are collected from every index entry alongside. When the pass is
//! over, [`PageDetector::finish`] drops detected pages nothing referred to and
//! turns a missing main URL into an error.

mod list;

use std::collections::{HashMap, HashSet};

pub use list::{OverrideList, load_page_list, serialize_page_list};

use crate::classify::Classification;
use crate::error::{Result, WaczError};
use crate::index::{ObservedRecord, RecordObserver};
use crate::reader::{ExtractHint, ExtractorRegistry};
use crate::timestamp::normalize_timestamp;
use crate::types::{
    DeclaredPage, PageLine, PageRecord, PageSource, RecordType, WarcRecord, WarcinfoMetadata,
    new_page_id, page_key,
};

/// What one record means for the page list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    NotAPage,
    /// A `recording` warcinfo record whose pages are imported as-is.
    WarcinfoDeclared,
    /// Matched an override list entry; keys are the entries to consume.
    OverrideMatch {
        passed: Option<String>,
        extra: Option<String>,
    },
    MainUrlMatch,
    /// Provisional detected page, kept only if some capture refers to it.
    ReferrerCandidate,
}

/// The facts about a record that page decisions depend on.
#[derive(Debug, Clone, Copy)]
pub struct PageCandidate<'a> {
    pub record_type: &'a RecordType,
    pub url: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    /// HTML, not a redirect, response or resource.
    pub page_like: bool,
    /// Warcinfo carrying `json-metadata` of type `recording`.
    pub declares_pages: bool,
}

impl<'a> PageCandidate<'a> {
    #[must_use]
    pub fn from_record(
        record: &'a WarcRecord,
        classification: &'a Classification,
        timestamp: Option<&'a str>,
        declares_pages: bool,
    ) -> Self {
        Self {
            record_type: &record.record_type,
            url: record.target_uri().map(|uri| uri.trim().trim_matches(['<', '>'])),
            timestamp,
            page_like: classification.is_page_candidate(),
            declares_pages,
        }
    }
}

/// Main page the caller requires to be present in the capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainPage {
    pub url: String,
    pub timestamp: Option<String>,
}

impl MainPage {
    /// Normalize `url` (empty path becomes `/`) and `timestamp` (ISO or 14 digits).
    pub fn new(url: &str, timestamp: Option<&str>) -> Result<Self> {
        Ok(Self {
            url: normalize_main_url(url),
            timestamp: timestamp.map(normalize_timestamp).transpose()?,
        })
    }
}

/// Complete `http://host` to `http://host/`; anything else is returned unchanged.
#[must_use]
pub fn normalize_main_url(url: &str) -> String {
    let url = url.trim();
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &url[authority_start..];
    match rest.find(['/', '?', '#']) {
        Some(pos) if rest.as_bytes()[pos] == b'/' => url.to_string(),
        Some(pos) => format!("{}{}/{}", &url[..authority_start], &rest[..pos], &rest[pos..]),
        None => format!("{url}/"),
    }
}

/// Insertion-ordered page map keyed like [`page_key`].
#[derive(Debug, Clone, Default)]
struct PageMap {
    pages: Vec<PageRecord>,
    keys: HashMap<String, usize>,
}

impl PageMap {
    fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut PageRecord> {
        let index = *self.keys.get(key)?;
        self.pages.get_mut(index)
    }

    /// Insert `page` unless `key` is taken; returns the page stored under `key`.
    fn entry(&mut self, key: String, page: PageRecord) -> &mut PageRecord {
        let index = match self.keys.get(&key) {
            Some(index) => *index,
            None => {
                self.pages.push(page);
                let index = self.pages.len() - 1;
                self.keys.insert(key, index);
                index
            }
        };
        &mut self.pages[index]
    }

    fn retain(&mut self, mut keep: impl FnMut(&PageRecord) -> bool) -> usize {
        let before = self.pages.len();
        let mut kept_keys: Vec<(String, usize)> = self.keys.drain().collect();
        kept_keys.sort_by_key(|(_, index)| *index);
        let mut pages = std::mem::take(&mut self.pages).into_iter();
        for (key, _) in kept_keys {
            let Some(page) = pages.next() else { break };
            if keep(&page) {
                self.keys.insert(key, self.pages.len());
                self.pages.push(page);
            }
        }
        before - self.pages.len()
    }

    fn into_pages(self) -> Vec<PageRecord> {
        self.pages
    }
}

/// Final page lists and metadata gathered during the pass.
#[derive(Debug, Clone, Default)]
pub struct PageSet {
    pub pages: Vec<PageRecord>,
    pub extra_pages: Vec<PageRecord>,
    /// Title and description from a `collection` warcinfo record.
    pub collection_title: Option<String>,
    pub collection_description: Option<String>,
    /// Timestamp of the capture that satisfied the main URL.
    pub main_page_timestamp: Option<String>,
    /// Override entries nothing matched.
    pub unmatched: usize,
    pub pruned: usize,
}

/// Per-run page detection state. Owned by one creation run.
#[derive(Debug)]
pub struct PageDetector {
    detect_pages: bool,
    /// Set once a `recording` warcinfo record declared the pages.
    detection_disabled: bool,
    text: bool,
    main: Option<MainPage>,
    main_url_found: bool,
    main_ts_found: bool,
    main_page_timestamp: Option<String>,
    passed: OverrideList,
    extra: OverrideList,
    pages: PageMap,
    extra_pages: PageMap,
    referrers: HashSet<String>,
    collection_title: Option<String>,
    collection_description: Option<String>,
    extractors: ExtractorRegistry,
}

impl PageDetector {
    #[must_use]
    pub fn new(detect_pages: bool) -> Self {
        Self {
            detect_pages,
            detection_disabled: false,
            text: false,
            main: None,
            main_url_found: false,
            main_ts_found: false,
            main_page_timestamp: None,
            passed: OverrideList::default(),
            extra: OverrideList::default(),
            pages: PageMap::default(),
            extra_pages: PageMap::default(),
            referrers: HashSet::new(),
            collection_title: None,
            collection_description: None,
            extractors: ExtractorRegistry::default(),
        }
    }

    /// Run text extraction for records that produce or match a page.
    #[must_use]
    pub fn with_text(mut self, enabled: bool) -> Self {
        self.text = enabled;
        self
    }

    #[must_use]
    pub fn with_main_page(mut self, main: MainPage) -> Self {
        self.main = Some(main);
        self
    }

    #[must_use]
    pub fn with_passed_pages(mut self, list: OverrideList) -> Self {
        self.passed = list;
        self
    }

    #[must_use]
    pub fn with_extra_pages(mut self, list: OverrideList) -> Self {
        self.extra = list;
        self
    }

    #[must_use]
    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    /// True while heuristic detection can still add pages.
    #[must_use]
    pub fn detection_active(&self) -> bool {
        self.detect_pages && !self.detection_disabled
    }

    /// Resolve the outcome for one record without changing any state.
    #[must_use]
    pub fn decide(&self, candidate: &PageCandidate<'_>) -> PageOutcome {
        if *candidate.record_type == RecordType::Warcinfo {
            return if candidate.declares_pages {
                PageOutcome::WarcinfoDeclared
            } else {
                PageOutcome::NotAPage
            };
        }
        let (Some(url), true) = (candidate.url, candidate.record_type.carries_document()) else {
            return PageOutcome::NotAPage;
        };
        let timestamp = candidate.timestamp;

        if self.passed.is_active() || self.extra.is_active() {
            let passed = self.passed.matching_key(timestamp, url);
            let extra = self.extra.matching_key(timestamp, url);
            if passed.is_some() || extra.is_some() {
                return PageOutcome::OverrideMatch { passed, extra };
            }
        }

        if let Some(main) = &self.main {
            if main.url == url
                && main
                    .timestamp
                    .as_deref()
                    .is_none_or(|ts| Some(ts) == timestamp)
            {
                return PageOutcome::MainUrlMatch;
            }
        }

        if self.detection_active() && candidate.page_like && timestamp.is_some() {
            return PageOutcome::ReferrerCandidate;
        }
        PageOutcome::NotAPage
    }

    /// Apply an outcome; returns the keys of the page maps it touched.
    fn apply(
        &mut self,
        outcome: PageOutcome,
        candidate: &PageCandidate<'_>,
        metadata: Option<WarcinfoMetadata>,
    ) -> Touched {
        let mut touched = Touched::default();
        let url = candidate.url.unwrap_or_default();
        let timestamp = candidate.timestamp.map(str::to_string);
        match outcome {
            PageOutcome::NotAPage => {
                let key = page_key(candidate.timestamp, url);
                if self.pages.contains(&key) {
                    touched.page = Some(key.clone());
                }
                if self.extra_pages.contains(&key) {
                    touched.extra = Some(key);
                }
            }
            PageOutcome::WarcinfoDeclared => {
                if let Some(metadata) = metadata {
                    self.import_declared(metadata.pages);
                }
                self.detection_disabled = true;
                tracing::info!(
                    target = "wacz::pages",
                    pages = self.pages.pages.len(),
                    "pages declared by warcinfo; detection disabled"
                );
            }
            PageOutcome::OverrideMatch { passed, extra } => {
                let key = page_key(candidate.timestamp, url);
                if let Some(line) = passed.and_then(|k| self.passed.consume(&k)) {
                    merge_override(
                        self.pages.entry(
                            key.clone(),
                            PageRecord::new(url, timestamp.clone(), PageSource::Override),
                        ),
                        line,
                    );
                    touched.page = Some(key.clone());
                }
                if let Some(line) = extra.and_then(|k| self.extra.consume(&k)) {
                    merge_override(
                        self.extra_pages.entry(
                            key.clone(),
                            PageRecord::new(url, timestamp, PageSource::Override),
                        ),
                        line,
                    );
                    touched.extra = Some(key);
                }
            }
            PageOutcome::MainUrlMatch => {
                let key = page_key(candidate.timestamp, url);
                self.pages
                    .entry(key.clone(), PageRecord::new(url, timestamp, PageSource::MainUrl));
                tracing::info!(target = "wacz::pages", url, "found main URL");
                touched.page = Some(key);
            }
            PageOutcome::ReferrerCandidate => {
                let key = page_key(candidate.timestamp, url);
                self.pages
                    .entry(key.clone(), PageRecord::new(url, timestamp, PageSource::Detected));
                touched.page = Some(key);
            }
        }
        touched
    }

    fn import_declared(&mut self, declared: Vec<DeclaredPage>) {
        for page in declared {
            let timestamp = page
                .timestamp
                .as_deref()
                .map(|ts| normalize_timestamp(ts).unwrap_or_else(|_| ts.to_string()));
            let key = page_key(timestamp.as_deref(), &page.url);
            let mut record = PageRecord::new(page.url, timestamp, PageSource::Declared);
            if let Some(id) = page.id {
                record.id = id;
            }
            if let Some(title) = page.title.filter(|title| !title.is_empty()) {
                record.title = title;
            }
            record.text = page.text;
            self.pages.entry(key, record);
        }
    }

    /// Track whether the main URL (and timestamp) occurred, whatever the outcome.
    fn track_main_page(&mut self, candidate: &PageCandidate<'_>) {
        let Some(main) = &self.main else { return };
        if !candidate.record_type.carries_document() || candidate.url != Some(main.url.as_str()) {
            return;
        }
        self.main_url_found = true;
        let ts_ok = main
            .timestamp
            .as_deref()
            .is_none_or(|ts| Some(ts) == candidate.timestamp);
        if ts_ok && !self.main_ts_found {
            self.main_ts_found = true;
            self.main_page_timestamp = candidate.timestamp.map(str::to_string);
        }
    }

    fn extract_text(&mut self, observed: &ObservedRecord<'_>, touched: &Touched) {
        if !self.text || touched.is_empty() || !observed.classification.is_page_candidate() {
            return;
        }
        let url = observed.record.target_uri().unwrap_or_default();
        let hint = ExtractHint::new(observed.classification.mime.as_deref()).with_uri(Some(url));
        let Some(extractor) = self.extractors.find_extractor(&hint) else {
            return;
        };
        let extractor_name = extractor.name();
        let result = observed
            .record
            .decoded_payload()
            .and_then(|body| extractor.extract(&body, &hint));
        let output = match result {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(
                    target = "wacz::extract",
                    extractor = extractor_name,
                    url,
                    error = %err,
                    "text extraction failed"
                );
                return;
            }
        };
        for warning in &output.warnings {
            tracing::debug!(target = "wacz::extract", extractor = extractor_name, url, warning = %warning);
        }
        let extracted = output.extracted;
        let targets = [
            touched.page.as_deref().map(|key| (false, key)),
            touched.extra.as_deref().map(|key| (true, key)),
        ];
        for (is_extra, key) in targets.into_iter().flatten() {
            let map = if is_extra {
                &mut self.extra_pages
            } else {
                &mut self.pages
            };
            let Some(page) = map.get_mut(key) else { continue };
            if page.text.is_none() {
                page.text.clone_from(&extracted.text);
            }
            if let Some(title) = &extracted.title {
                if page.has_default_title() {
                    page.title.clone_from(title);
                }
            }
        }
    }

    /// End-of-run checks and pruning.
    pub fn finish(mut self) -> Result<PageSet> {
        if let Some(main) = &self.main {
            if !self.main_url_found {
                return Err(WaczError::UrlNotFound {
                    url: main.url.clone(),
                });
            }
            if !self.main_ts_found {
                return Err(WaczError::TimestampNotFound {
                    url: main.url.clone(),
                    timestamp: main.timestamp.clone().unwrap_or_default(),
                });
            }
        }

        let mut unmatched = 0;
        for (name, list) in [("pages", &self.passed), ("extra pages", &self.extra)] {
            for (key, _) in list.leftovers() {
                unmatched += 1;
                tracing::warn!(target = "wacz::pages", list = name, page = key, "no matching record found");
            }
        }

        let mut pruned = 0;
        if self.detection_active() {
            let referrers = &self.referrers;
            pruned = self.pages.retain(|page| {
                page.source != PageSource::Detected || referrers.contains(&page.url)
            });
            tracing::info!(
                target = "wacz::pages",
                detected = self.pages.pages.len(),
                pruned,
                "page detection finished"
            );
        }

        Ok(PageSet {
            pages: self.pages.into_pages(),
            extra_pages: self.extra_pages.into_pages(),
            collection_title: self.collection_title,
            collection_description: self.collection_description,
            main_page_timestamp: self.main_page_timestamp,
            unmatched,
            pruned,
        })
    }
}

impl RecordObserver for PageDetector {
    fn observe(&mut self, observed: &ObservedRecord<'_>) {
        // Request records may be filtered out of the index; read the record.
        if let Some(referrer) = observed.record.referrer() {
            self.referrers.insert(referrer.to_string());
        }

        let metadata = if observed.record.record_type == RecordType::Warcinfo {
            self.read_warcinfo(observed.record)
        } else {
            None
        };
        let declares_pages = metadata.as_ref().is_some_and(|m| m.kind == "recording");

        let candidate = PageCandidate::from_record(
            observed.record,
            observed.classification,
            observed.timestamp,
            declares_pages,
        );
        self.track_main_page(&candidate);
        let outcome = self.decide(&candidate);
        let touched = self.apply(outcome, &candidate, metadata);
        self.extract_text(observed, &touched);
    }
}

impl PageDetector {
    /// Parse `json-metadata` from a warcinfo record; collection metadata is kept here.
    fn read_warcinfo(&mut self, record: &WarcRecord) -> Option<WarcinfoMetadata> {
        let metadata = match parse_warcinfo_metadata(record.raw_payload()) {
            Ok(Some(metadata)) => metadata,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(
                    target = "wacz::pages",
                    offset = record.offset,
                    error = %err,
                    "ignoring unreadable warcinfo json-metadata"
                );
                return None;
            }
        };
        if metadata.kind == "collection" {
            self.collection_title = metadata.title.clone().filter(|t| !t.is_empty());
            self.collection_description = metadata.desc.clone().filter(|d| !d.is_empty());
        }
        Some(metadata)
    }
}

/// Find the `json-metadata:` field of a warcinfo block.
pub fn parse_warcinfo_metadata(block: &[u8]) -> Result<Option<WarcinfoMetadata>> {
    let text = String::from_utf8_lossy(block);
    for line in text.lines() {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim() == "json-metadata" {
                return Ok(Some(serde_json::from_str(value.trim())?));
            }
        }
    }
    Ok(None)
}

fn merge_override(page: &mut PageRecord, line: PageLine) {
    if let Some(id) = line.id.filter(|id| !id.is_empty()) {
        page.id = id;
    }
    if let Some(title) = line.title.filter(|title| !title.is_empty()) {
        page.title = title;
    }
    if line.text.is_some() {
        page.text = line.text;
    }
    if page.id.is_empty() {
        page.id = new_page_id();
    }
}

#[derive(Debug, Default)]
struct Touched {
    page: Option<String>,
    extra: Option<String>,
}

impl Touched {
    fn is_empty(&self) -> bool {
        self.page.is_none() && self.extra.is_none()
    }
}
