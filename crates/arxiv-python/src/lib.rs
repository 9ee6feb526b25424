//! PyO3 Python bindings for the arXiv corpus.
//!
//! Exposes positional lookup over the manifest as a map-style dataset and
//! bulk `main.tex` extraction as a Python iterator. Structured values
//! (descriptors, locations, statistics) cross the FFI boundary as Python
//! dicts via a JSON round-trip.

#![deny(unsafe_code)]

use pyo3::prelude::*;

mod dataset;
mod errors;
mod extractor;

/// The `arxiv._arxiv` native module.
#[pymodule]
fn _arxiv(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<dataset::PyArxivDataset>()?;
    m.add_class::<extractor::PyTexExtractor>()?;
    Ok(())
}
