//! Conversions across the FFI boundary.

use arxiv_corpus::CorpusError;
use pyo3::exceptions::{PyFileNotFoundError, PyIndexError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use serde::Serialize;

/// Map a [`CorpusError`] to the Python exception a caller would expect.
///
/// Index problems become `IndexError` so that Python's sequence protocol
/// (`for x in dataset`) terminates cleanly.
pub(crate) fn to_py_err(e: CorpusError) -> PyErr {
    match e {
        CorpusError::OutOfRange { .. } | CorpusError::MemberOutOfRange { .. } => {
            PyIndexError::new_err(e.to_string())
        }
        CorpusError::NotFound { .. } => PyFileNotFoundError::new_err(e.to_string()),
        CorpusError::Manifest(_) | CorpusError::Config(_) => PyValueError::new_err(e.to_string()),
        CorpusError::Io { .. } | CorpusError::CorruptEntry { .. } => {
            PyRuntimeError::new_err(e.to_string())
        }
    }
}

/// Converts any serializable value to a Python object via JSON round-trip.
pub(crate) fn to_pyobject<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<PyObject> {
    let json_str = serde_json::to_string(value).map_err(|e| {
        PyRuntimeError::new_err(format!("failed to serialize value to JSON: {e}"))
    })?;
    let json_mod = py.import("json")?;
    let obj = json_mod.call_method1("loads", (json_str,))?;
    Ok(obj.unbind())
}
