//! arXiv Manifest -- chronological index over the arXiv bulk source archives.
//!
//! The arXiv bulk data download ships thousands of `arXiv_src_YYMM_NNN.tar`
//! archives together with an XML manifest describing each of them. This crate
//! turns that manifest into an immutable, chronologically ordered index that
//! maps a single global paper index onto `(archive, offset within archive)`
//! without touching the archives themselves.
//!
//! # Modules
//!
//! - [`release`]: Release-month derivation from `yymm` codes, including the
//!   dynamically computed two-digit year pivot.
//! - [`descriptor`]: [`ArchiveDescriptor`](descriptor::ArchiveDescriptor), the
//!   parsed metadata for one top-level archive.
//! - [`parse`]: Manifest XML parsing into a sorted descriptor list.
//! - [`index`]: [`ManifestIndex`](index::ManifestIndex), the cumulative-count
//!   lookup structure.
//!
//! # Example
//!
//! ```
//! use arxiv_manifest::index::ManifestIndex;
//!
//! let xml = r#"
//! <arXiv_src>
//!   <file><filename>a.tar</filename><num_items>3</num_items><seq_num>1</seq_num><yymm>2301</yymm></file>
//!   <file><filename>b.tar</filename><num_items>2</num_items><seq_num>1</seq_num><yymm>2302</yymm></file>
//! </arXiv_src>"#;
//!
//! let index = ManifestIndex::from_xml(xml).unwrap();
//! assert_eq!(index.total_count(), 5);
//!
//! let location = index.locate(3).unwrap();
//! assert_eq!(location.descriptor.filename, "b.tar");
//! assert_eq!(location.offset, 0);
//! ```

#![deny(unsafe_code)]

pub mod descriptor;
pub mod index;
pub mod parse;
pub mod release;

use std::path::PathBuf;

/// Location of the manifest relative to the corpus root directory.
pub const MANIFEST_RELATIVE_PATH: &str = "src/arXiv_src_manifest.xml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading or querying a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest '{}': {source}", path.display())]
    Io {
        /// The manifest path that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not well-formed XML.
    #[error("malformed manifest XML: {0}")]
    Xml(String),

    /// A `file` entry is missing one of its required child fields.
    #[error("manifest entry #{entry} is missing required field '{field}'")]
    MissingField {
        /// Zero-based position of the `file` element in the manifest.
        entry: usize,
        /// The name of the missing child element.
        field: &'static str,
    },

    /// A numeric field could not be parsed as a non-negative integer.
    #[error("manifest entry #{entry} has invalid {field} '{value}'")]
    InvalidNumber {
        /// Zero-based position of the `file` element in the manifest.
        entry: usize,
        /// The name of the offending child element.
        field: &'static str,
        /// The raw text that failed to parse.
        value: String,
    },

    /// A `yymm` code is not four digits or names a month outside 1..=12.
    #[error("invalid year-month code '{value}' -- expected four digits YYMM with month 01-12")]
    InvalidYearMonth {
        /// The raw code as given.
        value: String,
    },

    /// The item counts sum to more than `u64::MAX`.
    #[error("cumulative item count overflows at archive '{archive}'")]
    CountOverflow {
        /// The archive whose count pushed the running total past `u64::MAX`.
        archive: String,
    },

    /// A global index does not address any item in the corpus.
    #[error("index {index} out of range for corpus of {total} items")]
    OutOfRange {
        /// The requested index (after negative-index normalization, if any).
        index: i64,
        /// The total number of items in the corpus.
        total: u64,
    },
}

impl From<quick_xml::Error> for ManifestError {
    fn from(e: quick_xml::Error) -> Self {
        ManifestError::Xml(e.to_string())
    }
}

/// Convenience re-exports.
pub mod prelude {
    pub use crate::descriptor::ArchiveDescriptor;
    pub use crate::index::{normalize_index, Location, ManifestIndex};
    pub use crate::parse::{parse_manifest, parse_manifest_with_pivot};
    pub use crate::release::{current_pivot, ReleaseMonth};
    pub use crate::{ManifestError, MANIFEST_RELATIVE_PATH};
}
