//! Python-facing random-access dataset.
//!
//! [`PyArxivDataset`] wraps a [`RandomAccessCorpus`] behind Python's
//! sequence protocol so it can be handed to any map-style data loader.

use std::path::PathBuf;

use arxiv_corpus::config::CorpusConfig;
use arxiv_corpus::corpus::RandomAccessCorpus;
use arxiv_corpus::logging::init_logging;
use arxiv_corpus::CorpusError;
use arxiv_manifest::index::normalize_index;
use pyo3::prelude::*;

use crate::errors::{to_py_err, to_pyobject};

/// Resolve the corpus configuration from an explicit directory or the
/// environment, then bring up logging.
pub(crate) fn resolve_config(root: Option<PathBuf>) -> PyResult<CorpusConfig> {
    let config = match root {
        Some(root) => CorpusConfig::with_root(root),
        None => CorpusConfig::from_env().map_err(to_py_err)?,
    };
    init_logging(&config.log_level);
    Ok(config)
}

/// The arXiv source corpus as a map-style dataset.
///
/// Usage from Python:
/// ```python
/// from arxiv._arxiv import ArxivDataset
/// ds = ArxivDataset("/data/arxiv")
/// len(ds)      # total papers listed in the manifest
/// ds[0]        # "9107/hep-lat9107001.gz"
/// ds[-1]       # the most recent paper
/// ```
#[pyclass(name = "ArxivDataset")]
pub struct PyArxivDataset {
    corpus: RandomAccessCorpus,
}

#[pymethods]
impl PyArxivDataset {
    /// Open the corpus.
    ///
    /// Args:
    ///     data_dir: Corpus root. Defaults to `$ARXIV_DATASET_PATH`.
    #[new]
    #[pyo3(signature = (data_dir=None))]
    fn new(data_dir: Option<PathBuf>) -> PyResult<Self> {
        let config = resolve_config(data_dir)?;
        let corpus = RandomAccessCorpus::open(&config).map_err(to_py_err)?;
        tracing::debug!(
            root = %config.root.display(),
            papers = corpus.len(),
            "python dataset opened"
        );
        Ok(Self { corpus })
    }

    fn __len__(&self) -> PyResult<usize> {
        usize::try_from(self.corpus.len()).map_err(|_| {
            pyo3::exceptions::PyOverflowError::new_err("corpus too large for this platform")
        })
    }

    /// Entry name of the paper at `index`. Negative indices count from the end.
    fn __getitem__(&self, index: isize) -> PyResult<String> {
        self.corpus.get(index as i64).map_err(to_py_err)
    }

    /// Archive and offset owning `index`, as a dict.
    ///
    /// Keys: `index` (normalized), `archive` (descriptor dict), `position`
    /// (archive position in release order), `offset`.
    fn locate(&self, py: Python<'_>, index: i64) -> PyResult<PyObject> {
        let global = normalize_index(index, self.corpus.len())
            .map_err(|e| to_py_err(CorpusError::from(e)))?;
        let location = self
            .corpus
            .index()
            .locate(global)
            .map_err(|e| to_py_err(CorpusError::from(e)))?;
        let value = serde_json::json!({
            "index": global,
            "archive": location.descriptor,
            "position": location.position,
            "offset": location.offset,
        });
        to_pyobject(py, &value)
    }

    /// Manifest descriptors in release order, as a list of dicts.
    fn archives(&self, py: Python<'_>) -> PyResult<PyObject> {
        to_pyobject(py, &self.corpus.index().descriptors())
    }

    /// Re-read the manifest. Returns True if it changed.
    fn reload(&mut self) -> PyResult<bool> {
        self.corpus.reload().map_err(to_py_err)
    }

    /// BLAKE3 digest of the loaded manifest.
    #[getter]
    fn digest(&self) -> String {
        self.corpus.index().digest().to_owned()
    }

    fn __repr__(&self) -> String {
        format!(
            "ArxivDataset(root={:?}, archives={}, papers={})",
            self.corpus.config().root.display().to_string(),
            self.corpus.index().len(),
            self.corpus.len()
        )
    }
}
