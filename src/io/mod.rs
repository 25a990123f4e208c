//! Low-level readers and writers for the formats bundled in a package.

pub mod warc;
pub mod zipnum;

pub use warc::WarcReader;
pub use zipnum::{ZipNumIndex, write_zipnum};
