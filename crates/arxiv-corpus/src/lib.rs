//! arXiv Corpus -- positional lookup and bulk `main.tex` extraction over the
//! arXiv bulk source archives.
//!
//! This crate builds on [`arxiv_manifest`] to give a host data pipeline two
//! views of an on-disk arXiv source mirror:
//!
//! - [`RandomAccessCorpus`](corpus::RandomAccessCorpus): resolves a global
//!   paper index to the name of the per-paper entry inside its top-level
//!   archive. Implements the [`IndexedDataset`](dataset::IndexedDataset)
//!   contract so any host framework can wrap it.
//! - [`ArchiveTextExtractor`](extract::ArchiveTextExtractor): walks every
//!   top-level archive in release order and lazily yields the `main.tex` of
//!   each nested per-paper tarball as a keyed [`TexRecord`](extract::TexRecord).
//!
//! # Modules
//!
//! - [`config`]: [`CorpusConfig`](config::CorpusConfig) and environment loading.
//! - [`logging`]: `tracing-subscriber` initialisation.
//! - [`dataset`]: The `len` / `item_at` capability contract.
//! - [`archive`]: Tar listing helpers and archive filename ordering.
//! - [`corpus`]: Random access by global index.
//! - [`extract`]: Lazy nested-archive text extraction.
//!
//! # Example
//!
//! ```no_run
//! use arxiv_corpus::prelude::*;
//!
//! let config = CorpusConfig::from_env().unwrap();
//! let corpus = RandomAccessCorpus::open(&config).unwrap();
//! println!("{} papers, last is {}", corpus.len(), corpus.get(-1).unwrap());
//!
//! for (key, record) in ArchiveTextExtractor::new(&config).extract(&config.root, false).unwrap() {
//!     println!("{key}: {} bytes of LaTeX from {}", record.content.len(), record.source);
//! }
//! ```

#![deny(unsafe_code)]

pub mod archive;
pub mod config;
pub mod corpus;
pub mod dataset;
pub mod extract;
pub mod logging;

use std::path::PathBuf;

use arxiv_manifest::ManifestError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by corpus lookups and extraction.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// A file the manifest or configuration refers to does not exist.
    #[error("'{}' not found -- the manifest and the corpus directory disagree", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// An I/O error while reading an archive.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// The archive being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be parsed.
    #[error(transparent)]
    Manifest(ManifestError),

    /// A global index does not address any item in the corpus.
    #[error("index {index} out of range for corpus of {len} items")]
    OutOfRange {
        /// The requested index, as given by the caller.
        index: i64,
        /// The total number of items in the corpus.
        len: u64,
    },

    /// An archive holds fewer per-item entries than the manifest claims.
    #[error("offset {offset} out of range for '{archive}' which lists {available} entries")]
    MemberOutOfRange {
        /// The archive filename from the manifest.
        archive: String,
        /// The offset that was requested.
        offset: u64,
        /// The number of matching entries actually present.
        available: usize,
    },

    /// A nested archive or its `main.tex` member could not be decoded.
    #[error("corrupt entry '{entry}' in '{}': {reason}", archive.display())]
    CorruptEntry {
        /// The top-level archive containing the entry.
        archive: PathBuf,
        /// The inner entry name.
        entry: String,
        /// What went wrong.
        reason: String,
    },

    /// The configuration is unusable (e.g. no corpus root given).
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ManifestError> for CorpusError {
    fn from(e: ManifestError) -> Self {
        match e {
            ManifestError::OutOfRange { index, total } => {
                CorpusError::OutOfRange { index, len: total }
            }
            ManifestError::Io { path, source }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                CorpusError::NotFound { path }
            }
            other => CorpusError::Manifest(other),
        }
    }
}

impl CorpusError {
    /// Wrap an I/O error for `path`, mapping "not found" to [`CorpusError::NotFound`].
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            CorpusError::NotFound { path }
        } else {
            CorpusError::Io { path, source }
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common corpus usage.
pub mod prelude {
    pub use crate::archive::{archive_sort_key, sort_archive_names, ArchiveKey};
    pub use crate::config::CorpusConfig;
    pub use crate::corpus::RandomAccessCorpus;
    pub use crate::dataset::IndexedDataset;
    pub use crate::extract::{ArchiveTextExtractor, TexRecord, TexRecords};
    pub use crate::logging::init_logging;
    pub use crate::CorpusError;

    pub use arxiv_manifest::prelude::*;
}
