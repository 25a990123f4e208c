//! Package-level operations: building a WACZ and validating one.

pub mod create;
pub mod manifest;
pub mod validate;

pub use create::{CreateSummary, create_wacz};
pub use manifest::ManifestBuilder;
pub use validate::{Validation, validate_wacz};
