//! Random access to individual papers by global index.
//!
//! [`RandomAccessCorpus`] pairs a [`ManifestIndex`] with the corpus root. A
//! lookup resolves the global index to `(archive, offset)` through the
//! manifest, then opens that archive, lists its per-paper entries in name
//! order and returns the name at `offset`. Every lookup opens its own file
//! handle and closes it before returning; nothing is cached between calls.
//!
//! # Example
//!
//! ```no_run
//! use arxiv_corpus::prelude::*;
//!
//! let corpus = RandomAccessCorpus::open(&CorpusConfig::with_root("/data/arxiv")).unwrap();
//! assert_eq!(corpus.get(0).unwrap(), "9107/hep-lat9107001.gz");
//! assert_eq!(corpus.get(-1).unwrap(), corpus.get(corpus.len() as i64 - 1).unwrap());
//! ```

use arxiv_manifest::index::{normalize_index, ManifestIndex};

use crate::archive::{list_members, open_archive};
use crate::config::CorpusConfig;
use crate::dataset::IndexedDataset;
use crate::CorpusError;

// ---------------------------------------------------------------------------
// RandomAccessCorpus
// ---------------------------------------------------------------------------

/// Manifest-driven positional lookup over the top-level source archives.
#[derive(Debug, Clone)]
pub struct RandomAccessCorpus {
    config: CorpusConfig,
    index: ManifestIndex,
}

impl RandomAccessCorpus {
    /// Load the manifest under `config.root` and build the corpus.
    pub fn open(config: &CorpusConfig) -> Result<Self, CorpusError> {
        let index = read_manifest(config)?;
        tracing::info!(
            root = %config.root.display(),
            archives = index.len(),
            papers = index.total_count(),
            "opened corpus"
        );
        Ok(Self {
            config: config.clone(),
            index,
        })
    }

    /// Build a corpus over an already-loaded manifest.
    pub fn from_index(config: CorpusConfig, index: ManifestIndex) -> Self {
        Self { config, index }
    }

    /// Re-read the manifest from disk. Returns `true` if it changed.
    ///
    /// The total count is recomputed as part of the reload; on failure the
    /// previous manifest stays in effect.
    pub fn reload(&mut self) -> Result<bool, CorpusError> {
        let path = self.config.manifest_file();
        let xml = std::fs::read_to_string(&path).map_err(|e| CorpusError::io(&path, e))?;
        Ok(self.index.reload(&xml)?)
    }

    /// Total number of papers.
    pub fn len(&self) -> u64 {
        self.index.total_count()
    }

    /// Returns `true` if the manifest lists no papers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The manifest index backing this corpus.
    pub fn index(&self) -> &ManifestIndex {
        &self.index
    }

    /// The configuration this corpus was opened with.
    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    /// Name of the per-paper entry at global `index`.
    ///
    /// Negative indices count from the end. Fails with
    /// [`CorpusError::OutOfRange`] for indices outside `[-len, len)`,
    /// [`CorpusError::NotFound`] if the owning archive is missing, and
    /// [`CorpusError::MemberOutOfRange`] if the archive holds fewer entries
    /// than the manifest claims.
    pub fn get(&self, index: i64) -> Result<String, CorpusError> {
        let total = self.len();
        let global = normalize_index(index, total)
            .map_err(|_| CorpusError::OutOfRange { index, len: total })?;
        let location = self.index.locate(global)?;
        let descriptor = location.descriptor;

        let path = self.config.archive_path(&descriptor.filename);
        let file = open_archive(&path).inspect_err(|e| {
            tracing::error!(error = %e, archive = %descriptor.filename, "archive missing");
        })?;
        let (_file, members) = list_members(file, &path, |name| self.config.is_item(name))?;

        let available = members.len();
        let member = usize::try_from(location.offset)
            .ok()
            .and_then(|offset| members.into_iter().nth(offset))
            .ok_or_else(|| CorpusError::MemberOutOfRange {
                archive: descriptor.filename.clone(),
                offset: location.offset,
                available,
            })?;

        tracing::debug!(
            index,
            archive = %descriptor.filename,
            offset = location.offset,
            name = %member.name,
            "resolved paper"
        );
        Ok(member.name)
    }
}

impl IndexedDataset for RandomAccessCorpus {
    type Item = String;

    fn len(&self) -> u64 {
        RandomAccessCorpus::len(self)
    }

    fn item_at(&self, index: i64) -> Result<String, CorpusError> {
        self.get(index)
    }
}

fn read_manifest(config: &CorpusConfig) -> Result<ManifestIndex, CorpusError> {
    let path = config.manifest_file();
    let xml = std::fs::read_to_string(&path).map_err(|e| {
        let err = CorpusError::io(&path, e);
        tracing::error!(error = %err, "cannot read manifest");
        err
    })?;
    Ok(ManifestIndex::from_xml(&xml)?)
}
