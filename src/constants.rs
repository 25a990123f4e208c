//! Fixed member paths and format literals of the WACZ layout.

/// Revision of the WACZ format written by this crate.
pub const WACZ_FORMAT_VERSION: &str = "1.1.1";
/// Version assumed for packages that only carry a `webarchive.yaml`.
pub const LEGACY_FORMAT_VERSION: &str = "0.0";

pub const DATAPACKAGE_PATH: &str = "datapackage.json";
/// Signed digest of the manifest; never listed among the resources.
pub const DATAPACKAGE_DIGEST_PATH: &str = "datapackage-digest.json";
pub const LEGACY_DESCRIPTOR_PATH: &str = "webarchive.yaml";
pub const DATAPACKAGE_PROFILE: &str = "data-package";

pub const ARCHIVE_DIR: &str = "archive/";
pub const INDEXES_DIR: &str = "indexes/";
pub const PAGES_DIR: &str = "pages/";
pub const LOGS_DIR: &str = "logs/";

pub const INDEX_CDX_NAME: &str = "index.cdx.gz";
pub const INDEX_CDX_PATH: &str = "indexes/index.cdx.gz";
pub const INDEX_IDX_PATH: &str = "indexes/index.idx";
pub const PAGES_PATH: &str = "pages/pages.jsonl";
pub const EXTRA_PAGES_PATH: &str = "pages/extraPages.jsonl";

pub const PAGES_FORMAT: &str = "json-pages-1.0";
pub const ZIPNUM_FORMAT: &str = "cdxj-gzip-1.0";

/// CDXJ lines per gzip block in `index.cdx.gz`.
pub const ZIPNUM_BLOCK_LINES: usize = 3000;

/// MIME types treated as pages by detection and text extraction.
pub const HTML_MIME_TYPES: &[&str] = &["text/html", "application/xhtml", "application/xhtml+xml"];
