//! Python bindings for shmseries

use pyo3::exceptions::{PyFileNotFoundError, PyIndexError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use shmseries_core::{AttachOptions, Error, Header, Record, SegmentReader, Validation};

/// Convert shmseries error to the matching Python exception
fn to_py_err(e: Error) -> PyErr {
    match e {
        Error::SegmentNotFound { .. } => PyFileNotFoundError::new_err(e.to_string()),
        Error::IndexOutOfRange { .. } => PyIndexError::new_err(e.to_string()),
        Error::MalformedLayout(_) => PyValueError::new_err(e.to_string()),
        Error::Detached | Error::SharedMemory(_) => PyRuntimeError::new_err(e.to_string()),
    }
}

fn record_dict(py: Python<'_>, record: &Record) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    dict.set_item("ts", record.ts)?;
    dict.set_item("v", record.v)?;
    Ok(dict.into_py(py))
}

fn header_dict(py: Python<'_>, header: &Header) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    dict.set_item("n", header.n)?;
    dict.set_item("start_ts", header.start_ts)?;
    dict.set_item("interval", header.interval)?;
    dict.set_item("limit", header.limit)?;
    Ok(dict.into_py(py))
}

/// Python wrapper for SegmentReader
///
/// Borrows the producer's segment: closing or garbage-collecting the reader
/// never unlinks it.
#[pyclass(unsendable)]
struct ShmReader {
    inner: SegmentReader,
}

#[pymethods]
impl ShmReader {
    #[new]
    #[pyo3(signature = (name, strict = true))]
    fn new(name: &str, strict: bool) -> PyResult<Self> {
        let validation = if strict {
            Validation::Strict
        } else {
            Validation::Lenient
        };
        let inner = SegmentReader::attach_with(name, AttachOptions::new().validation(validation))
            .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[getter]
    fn name(&self) -> &str {
        self.inner.name()
    }

    /// Header snapshot as a dict, or None once detached
    #[getter]
    fn header(&self, py: Python<'_>) -> PyResult<Option<PyObject>> {
        self.inner
            .header()
            .map(|header| header_dict(py, header))
            .transpose()
    }

    fn read(&self, py: Python<'_>, index: i64) -> PyResult<PyObject> {
        let record = self.inner.read(index).map_err(to_py_err)?;
        record_dict(py, &record)
    }

    fn read_all(&self, py: Python<'_>) -> PyResult<Vec<PyObject>> {
        let records = self.inner.read_all().map_err(to_py_err)?;
        records.iter().map(|record| record_dict(py, record)).collect()
    }

    fn refresh(&mut self, py: Python<'_>) -> PyResult<PyObject> {
        let header = self.inner.refresh().map_err(to_py_err)?;
        header_dict(py, &header)
    }

    fn detach(&mut self) {
        self.inner.detach();
    }

    fn __len__(&self) -> usize {
        self.inner
            .header()
            .map_or(0, |header| header.n.max(0) as usize)
    }

    fn __enter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __exit__(
        &mut self,
        _exc_type: Option<&PyAny>,
        _exc_value: Option<&PyAny>,
        _traceback: Option<&PyAny>,
    ) -> bool {
        self.inner.detach();
        false
    }
}

#[pymodule]
fn shmseries(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<ShmReader>()?;
    Ok(())
}
