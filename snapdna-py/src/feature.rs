#![allow(clippy::useless_conversion)]

use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList, PyModule};

use snapdna_core::blocks::{
    Directionality, Feature as CoreFeature, FeatureSegment, QualifierValue,
};

use crate::utils;

const DIRECTIONS: &str = "'none', 'forward', 'backward', 'bidirectional'";

#[pyclass(frozen)]
#[derive(Clone)]
pub struct Feature {
    pub(crate) inner: CoreFeature,
}

#[pymethods]
impl Feature {
    #[new]
    #[pyo3(signature = (name, feature_type="misc_feature", directionality="none", segments=None, qualifiers=None))]
    fn new(
        name: &str,
        feature_type: &str,
        directionality: &str,
        segments: Option<Vec<(usize, usize)>>,
        qualifiers: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<Self> {
        let directionality =
            utils::parse_choice(directionality, "directionality", DIRECTIONS, Directionality::from_name)?;
        let mut inner = CoreFeature::new(name, feature_type).with_directionality(directionality);

        for (start, end) in segments.unwrap_or_default() {
            if start == 0 || end < start {
                return Err(PyValueError::new_err(format!(
                    "segment ({start}, {end}) must be 1-based with start <= end"
                )));
            }
            inner.segments.push(FeatureSegment::new(start, end));
        }

        if let Some(obj) = qualifiers {
            extract_qualifiers(obj, &mut inner)?;
        }
        Ok(Self { inner })
    }

    #[getter]
    fn id(&self) -> Option<u32> {
        self.inner.id
    }

    #[getter]
    fn name(&self) -> &str {
        &self.inner.name
    }

    #[getter]
    fn feature_type(&self) -> &str {
        &self.inner.feature_type
    }

    #[getter]
    fn directionality(&self) -> &'static str {
        self.inner.directionality.as_str()
    }

    /// `(start, end)` of every segment, 1-based and inclusive.
    #[getter]
    fn segments(&self) -> Vec<(usize, usize)> {
        self.inner
            .segments
            .iter()
            .map(|s| (s.start, s.end))
            .collect()
    }

    #[getter]
    fn extent(&self) -> Option<(usize, usize)> {
        self.inner.extent()
    }

    #[getter]
    fn qualifiers(&self, py: Python<'_>) -> PyResult<PyObject> {
        let dict = PyDict::new_bound(py);
        for (key, values) in &self.inner.qualifiers {
            let list = PyList::empty_bound(py);
            for value in values {
                match value {
                    QualifierValue::Int(int) => list.append(*int)?,
                    QualifierValue::Text(text) => list.append(text.as_str())?,
                    QualifierValue::Raw(_) => list.append(py.None())?,
                }
            }
            dict.set_item(key.as_str(), list)?;
        }
        Ok(dict.to_object(py))
    }

    fn qualifier(&self, name: &str) -> Option<&str> {
        self.inner.qualifier_text(name)
    }

    fn __eq__(&self, other: &Bound<'_, PyAny>) -> bool {
        other
            .extract::<PyRef<'_, Feature>>()
            .map(|other| other.inner == self.inner)
            .unwrap_or(false)
    }

    fn __repr__(&self) -> String {
        format!(
            "Feature(name={:?}, type={:?}, segments={:?})",
            self.inner.name,
            self.inner.feature_type,
            self.segments()
        )
    }
}

/// Accepts `dict[str, str | int | list[str | int]]`.
fn extract_qualifiers(obj: &Bound<'_, PyAny>, feature: &mut CoreFeature) -> PyResult<()> {
    let dict = obj
        .downcast::<PyDict>()
        .map_err(|_| PyTypeError::new_err("qualifiers must be a dict"))?;
    for (key, value) in dict.iter() {
        let key: String = key
            .extract()
            .map_err(|_| PyTypeError::new_err("qualifier names must be str"))?;
        let values = if let Ok(list) = value.downcast::<PyList>() {
            list.iter()
                .map(|item| extract_value(&item))
                .collect::<PyResult<Vec<_>>>()?
        } else {
            vec![extract_value(&value)?]
        };
        feature.qualifiers.insert(key, values);
    }
    Ok(())
}

fn extract_value(obj: &Bound<'_, PyAny>) -> PyResult<QualifierValue> {
    if let Ok(text) = obj.extract::<String>() {
        return Ok(QualifierValue::Text(text));
    }
    obj.extract::<i64>()
        .map(QualifierValue::Int)
        .map_err(|_| PyTypeError::new_err("qualifier values must be str or int"))
}

pub(crate) fn features_to_pylist(
    py: Python<'_>,
    features: &[CoreFeature],
) -> PyResult<Vec<Py<Feature>>> {
    let mut out = Vec::with_capacity(features.len());
    for feature in features {
        out.push(Py::new(
            py,
            Feature {
                inner: feature.clone(),
            },
        )?);
    }
    Ok(out)
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Feature>()?;
    Ok(())
}
