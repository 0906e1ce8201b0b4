use pyo3::prelude::*;

mod document;
mod feature;
mod utils;

#[pymodule]
fn _native(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    document::register(m)?;
    feature::register(m)?;
    Ok(())
}
