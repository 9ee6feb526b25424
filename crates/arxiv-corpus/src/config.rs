//! Corpus configuration.
//!
//! The corpus root and log verbosity are supplied by the environment; every
//! other setting has a default matching the layout of the arXiv bulk source
//! mirror.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `ARXIV_DATASET_PATH` | Corpus root directory. |
//! | `ARXIV_SRC_PATH` | Fallback for `ARXIV_DATASET_PATH`. |
//! | `ARXIV_LOG` | `tracing` filter directive, e.g. `info` or `arxiv_corpus=debug`. |

use std::path::{Path, PathBuf};

use arxiv_manifest::MANIFEST_RELATIVE_PATH;
use serde::{Deserialize, Serialize};

use crate::CorpusError;

/// Environment variable naming the corpus root.
pub const ROOT_ENV: &str = "ARXIV_DATASET_PATH";
/// Fallback environment variable naming the corpus root.
pub const ROOT_ENV_FALLBACK: &str = "ARXIV_SRC_PATH";
/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "ARXIV_LOG";

// ---------------------------------------------------------------------------
// CorpusConfig
// ---------------------------------------------------------------------------

/// Settings shared by [`RandomAccessCorpus`](crate::corpus::RandomAccessCorpus)
/// and [`ArchiveTextExtractor`](crate::extract::ArchiveTextExtractor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Corpus root. Manifest and archive paths are resolved against it.
    pub root: PathBuf,
    /// Manifest location relative to `root`.
    pub manifest_path: PathBuf,
    /// Suffixes of per-paper entries inside a top-level archive. Only entries
    /// ending in one of these count towards an archive's items.
    pub item_suffixes: Vec<String>,
    /// Suffix of the compressed per-paper source entries opened by the
    /// extractor.
    pub source_suffix: String,
    /// Extension of top-level archive files.
    pub archive_extension: String,
    /// Name of the nested member the extractor emits.
    pub target_member: String,
    /// Default log filter when `ARXIV_LOG` is unset.
    pub log_level: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            manifest_path: PathBuf::from(MANIFEST_RELATIVE_PATH),
            item_suffixes: vec![".gz".to_owned(), ".pdf".to_owned()],
            source_suffix: ".gz".to_owned(),
            archive_extension: ".tar".to_owned(),
            target_member: "main.tex".to_owned(),
            log_level: "info".to_owned(),
        }
    }
}

impl CorpusConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Build a configuration from `ARXIV_DATASET_PATH` (or `ARXIV_SRC_PATH`)
    /// and `ARXIV_LOG`.
    pub fn from_env() -> Result<Self, CorpusError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CorpusError> {
        let root = lookup(ROOT_ENV)
            .or_else(|| lookup(ROOT_ENV_FALLBACK))
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                CorpusError::Config(format!(
                    "corpus root not set -- export {ROOT_ENV} (or {ROOT_ENV_FALLBACK})"
                ))
            })?;

        let mut config = Self::with_root(root);
        if let Some(level) = lookup(LOG_ENV).filter(|v| !v.trim().is_empty()) {
            config.log_level = level;
        }
        Ok(config)
    }

    /// Absolute (root-joined) manifest path.
    pub fn manifest_file(&self) -> PathBuf {
        self.root.join(&self.manifest_path)
    }

    /// Resolve an archive filename from the manifest against the root.
    pub fn archive_path(&self, filename: impl AsRef<Path>) -> PathBuf {
        self.root.join(filename)
    }

    /// Whether an inner entry name counts as a per-paper item.
    pub fn is_item(&self, name: &str) -> bool {
        self.item_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }
}
