#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: internal helpers are self-describing.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Offsets and lengths are bounded by in-memory file sizes.
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
//
// Style/complexity
#![allow(clippy::too_many_lines)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::similar_names)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::match_same_arms)]
//
// Builders take owned values and return `Self`.
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::format_push_string)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::struct_excessive_bools)] // Option structs naturally have many flags
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::unused_self)]

//! Build and validate WACZ web archive packages.
//!
//! A WACZ is a zip container holding WARC captures under `archive/`, a CDXJ
//! index under `indexes/`, page lists under `pages/` and a `datapackage.json`
//! manifest that lists every member with its digest. [`create_wacz`] produces
//! one from WARC files; [`validate_wacz`] proves an existing one is
//! self-consistent.

/// The wacz-core crate version (matches `Cargo.toml`).
pub const WACZ_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod classify;
pub mod constants;
pub mod error;
pub mod hash;
pub mod index;
pub mod io;
pub mod pages;
pub mod reader;
pub mod surt;
pub mod timestamp;
pub mod types;
pub mod wacz;

pub use classify::{Classification, classify};
pub use constants::*;
pub use error::{Result, WaczError};
pub use hash::{HashAlgorithm, hash, parse_digest};
pub use index::{IndexBuilder, IndexOutput, IndexStats, ObservedRecord, RecordObserver, index_warcs};
pub use io::{WarcReader, ZipNumIndex, write_zipnum};
pub use pages::{
    MainPage, OverrideList, PageCandidate, PageDetector, PageOutcome, PageSet, load_page_list,
    normalize_main_url, serialize_page_list,
};
pub use reader::{
    ExtractHint, ExtractedText, ExtractorOutput, ExtractorRegistry, HtmlExtractor, TextExtractor,
};
pub use surt::urlkey;
pub use types::{
    CheckKind, CheckStatus, CreateOptions, CreateOptionsBuilder, DeclaredPage, FormatVersion,
    HeaderMap, HttpHead, IndexEntry, IndexFields, Manifest, PageLine, PageListHeader, PageRecord,
    PageSource, RecordFilter, RecordType, ResourceDescriptor, ResourceStats, ValidateOptions,
    ValidationCheck, ValidationFinding, ValidationReport, ValidationStatus, WarcRecord,
    WarcinfoMetadata,
};
pub use wacz::{CreateSummary, ManifestBuilder, Validation, create_wacz, validate_wacz};
