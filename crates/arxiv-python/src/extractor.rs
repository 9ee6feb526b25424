//! Python-facing `main.tex` extraction iterator.

use std::path::PathBuf;

use arxiv_corpus::extract::{ArchiveTextExtractor, TexRecords};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::dataset::resolve_config;
use crate::errors::{to_py_err, to_pyobject};

/// Lazy iterator of `(key, {"id": ..., "content": ...})` pairs.
///
/// Usage from Python:
/// ```python
/// from arxiv._arxiv import TexExtractor
/// for key, record in TexExtractor("/data/arxiv"):
///     print(key, record["id"], len(record["content"]))
/// ```
#[pyclass(name = "TexExtractor", unsendable)]
pub struct PyTexExtractor {
    records: TexRecords,
}

#[pymethods]
impl PyTexExtractor {
    /// List the top-level archives and prepare to iterate.
    ///
    /// Args:
    ///     path: Directory holding the archives. Defaults to `$ARXIV_DATASET_PATH`.
    ///     reverse: Walk archives newest first (default False).
    #[new]
    #[pyo3(signature = (path=None, reverse=false))]
    fn new(path: Option<PathBuf>, reverse: bool) -> PyResult<Self> {
        let config = resolve_config(path)?;
        let records = ArchiveTextExtractor::new(&config)
            .extract(&config.root, reverse)
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    root = %config.root.display(),
                    "cannot start extraction"
                );
                to_py_err(e)
            })?;
        tracing::debug!(root = %config.root.display(), reverse, "python extractor created");
        Ok(Self { records })
    }

    fn __iter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __next__(&mut self, py: Python<'_>) -> PyResult<Option<(u64, PyObject)>> {
        let Some((key, record)) = self.records.next() else {
            let stats = self.records.stats();
            tracing::debug!(
                records = stats.records,
                skipped_entries = stats.entries_skipped,
                "python extractor exhausted"
            );
            return Ok(None);
        };
        let dict = PyDict::new(py);
        dict.set_item("id", record.id)?;
        dict.set_item("content", record.content)?;
        dict.set_item("source", record.source)?;
        Ok(Some((key, dict.into_any().unbind())))
    }

    /// Counters for the extraction so far, as a dict.
    fn stats(&self, py: Python<'_>) -> PyResult<PyObject> {
        to_pyobject(py, self.records.stats())
    }
}
