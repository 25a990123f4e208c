//! Public types exposed by the `wacz-core` crate.

pub mod index;
pub mod manifest;
pub mod options;
pub mod page;
pub mod record;
pub mod verification;

pub use index::{IndexEntry, IndexFields};
pub use manifest::{Manifest, ResourceDescriptor, ResourceStats};
pub use options::{CreateOptions, CreateOptionsBuilder, RecordFilter, ValidateOptions};
pub use page::{
    DeclaredPage, PageLine, PageListHeader, PageRecord, PageSource, WarcinfoMetadata,
    new_page_id, page_key,
};
pub use record::{HeaderMap, HttpHead, RecordType, WarcRecord};
pub use verification::{
    CheckKind, CheckStatus, FormatVersion, ValidationCheck, ValidationFinding, ValidationReport,
    ValidationStatus,
};
