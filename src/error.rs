use std::borrow::Cow;

use thiserror::Error;

/// Shorthand result type used throughout the crate.
pub type Result<T> = std::result::Result<T, WaczError>;

/// Errors raised while building or reading WACZ packages.
///
/// Validation failures are not errors: they are reported as findings on a
/// [`ValidationReport`](crate::ValidationReport). Only problems that stop a run
/// (bad configuration, unreadable inputs, missing main page) surface here.
#[derive(Debug, Error)]
pub enum WaczError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported hash algorithm '{name}' (expected sha256 or md5)")]
    UnsupportedHash { name: String },

    #[error("unsupported record type '{name}'")]
    UnsupportedRecordType { name: String },

    #[error("conflicting options: {reason}")]
    ConflictingOptions { reason: Cow<'static, str> },

    #[error("missing option: {reason}")]
    MissingOption { reason: Cow<'static, str> },

    #[error("no inputs were provided")]
    NoInputs,

    #[error("URL {url} not found in index")]
    UrlNotFound { url: String },

    #[error("timestamp {timestamp} not found in index for URL {url}")]
    TimestampNotFound { url: String, timestamp: String },

    #[error("invalid page list {source_name}, line {line}: {reason}")]
    InvalidPageList {
        source_name: String,
        line: usize,
        reason: Cow<'static, str>,
    },

    #[error("malformed WARC record at offset {offset}: {reason}")]
    MalformedRecord {
        offset: u64,
        reason: Cow<'static, str>,
    },

    #[error("invalid WARC date '{value}'")]
    InvalidDate { value: String },

    #[error("text extraction failed: {reason}")]
    ExtractionFailed { reason: Cow<'static, str> },

    #[error("malformed digest '{value}'")]
    InvalidDigest { value: String },
}
