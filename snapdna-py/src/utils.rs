use pyo3::exceptions::{PyIOError, PyKeyError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyString;

use snapdna_core::SnapError;

pub fn map_snap_err(err: SnapError) -> PyErr {
    match &err {
        SnapError::NotFound { .. } => PyKeyError::new_err(err.to_string()),
        SnapError::Io(_) | SnapError::MissingOutputPath => PyIOError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Bytes of a `str` or bytes-like argument.
pub fn extract_bytes(obj: &Bound<'_, PyAny>, what: &str) -> PyResult<Vec<u8>> {
    if let Ok(s) = obj.downcast::<PyString>() {
        return Ok(s.to_str()?.as_bytes().to_vec());
    }
    obj.extract::<Vec<u8>>()
        .map_err(|_| PyTypeError::new_err(format!("{what} must be str or bytes-like")))
}

pub fn parse_choice<T>(
    value: &str,
    what: &str,
    choices: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> PyResult<T> {
    parse(value).ok_or_else(|| {
        PyValueError::new_err(format!("{what} must be one of {choices}, got {value:?}"))
    })
}
