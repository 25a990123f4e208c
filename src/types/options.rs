//! Builder-style options for creating and validating packages.

use std::path::PathBuf;

use crate::error::{Result, WaczError};
use crate::hash::HashAlgorithm;
use crate::types::RecordType;

/// Which record types receive an index entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RecordFilter {
    /// Every standard type except warcinfo.
    #[default]
    All,
    Only(Vec<RecordType>),
}

impl RecordFilter {
    #[must_use]
    pub fn admits(&self, record_type: &RecordType) -> bool {
        match record_type {
            RecordType::Warcinfo | RecordType::Other(_) => false,
            _ => match self {
                Self::All => true,
                Self::Only(types) => types.contains(record_type),
            },
        }
    }

    /// Parse `all` or a comma separated list such as `response,revisit`.
    ///
    /// Names outside the standard WARC types are a configuration error, as is
    /// an empty list.
    pub fn parse(value: &str) -> Result<Self> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let mut types = Vec::new();
        for name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            match RecordType::parse(name) {
                RecordType::Other(_) => {
                    return Err(WaczError::UnsupportedRecordType {
                        name: name.to_string(),
                    });
                }
                record_type => types.push(record_type),
            }
        }
        if types.is_empty() {
            return Err(WaczError::MissingOption {
                reason: "--records needs `all` or at least one record type".into(),
            });
        }
        Ok(Self::Only(types))
    }
}

/// Everything a single `create` run needs. Immutable once validated.
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    /// Extract page titles and body text into the page list.
    pub text: bool,
    pub detect_pages: bool,
    /// Caller-supplied authoritative page list (JSONL).
    pub pages_file: Option<PathBuf>,
    /// Secondary page list written as `pages/extraPages.jsonl`.
    pub extra_pages_file: Option<PathBuf>,
    pub hash_algorithm: HashAlgorithm,
    pub main_url: Option<String>,
    pub main_ts: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Overrides the main page timestamp in the manifest.
    pub date: Option<String>,
    pub log_directory: Option<PathBuf>,
    pub records: RecordFilter,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: PathBuf::from("archive.wacz"),
            text: false,
            detect_pages: false,
            pages_file: None,
            extra_pages_file: None,
            hash_algorithm: HashAlgorithm::default(),
            main_url: None,
            main_ts: None,
            title: None,
            description: None,
            date: None,
            log_directory: None,
            records: RecordFilter::default(),
        }
    }
}

impl CreateOptions {
    /// Start a fluent builder for `CreateOptions`.
    #[must_use]
    pub fn builder() -> CreateOptionsBuilder {
        CreateOptionsBuilder::default()
    }

    /// Reject flag combinations that cannot work, before any file is touched.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(WaczError::NoInputs);
        }
        if self.detect_pages && self.pages_file.is_some() {
            return Err(WaczError::ConflictingOptions {
                reason: "--pages and --detect-pages are mutually exclusive".into(),
            });
        }
        if self.detect_pages && self.extra_pages_file.is_some() {
            return Err(WaczError::ConflictingOptions {
                reason: "--extra-pages and --detect-pages are mutually exclusive".into(),
            });
        }
        if self.main_ts.is_some() && self.main_url.is_none() {
            return Err(WaczError::MissingOption {
                reason: "--ts requires --url".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateOptionsBuilder {
    inner: CreateOptions,
}

impl CreateOptionsBuilder {
    pub fn input<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.inner.inputs.push(path.into());
        self
    }

    pub fn output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.inner.output = path.into();
        self
    }

    pub fn text(mut self, enabled: bool) -> Self {
        self.inner.text = enabled;
        self
    }

    pub fn detect_pages(mut self, enabled: bool) -> Self {
        self.inner.detect_pages = enabled;
        self
    }

    pub fn pages_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.inner.pages_file = Some(path.into());
        self
    }

    pub fn extra_pages_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.inner.extra_pages_file = Some(path.into());
        self
    }

    pub fn hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.inner.hash_algorithm = algorithm;
        self
    }

    pub fn main_url<S: Into<String>>(mut self, url: S) -> Self {
        self.inner.main_url = Some(url.into());
        self
    }

    pub fn main_ts<S: Into<String>>(mut self, ts: S) -> Self {
        self.inner.main_ts = Some(ts.into());
        self
    }

    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.inner.title = Some(title.into());
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.inner.description = Some(description.into());
        self
    }

    pub fn date<S: Into<String>>(mut self, date: S) -> Self {
        self.inner.date = Some(date.into());
        self
    }

    pub fn log_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.inner.log_directory = Some(path.into());
        self
    }

    pub fn records(mut self, records: RecordFilter) -> Self {
        self.inner.records = records;
        self
    }

    #[must_use]
    pub fn build(self) -> CreateOptions {
        self.inner
    }
}

/// Knobs for the validator.
#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    /// Re-derive the index from the bundled WARCs and compare digests.
    pub check_index: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self { check_index: true }
    }
}
