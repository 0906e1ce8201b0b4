#![allow(clippy::useless_conversion)]

use std::path::PathBuf;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyModule};

use snapdna_core::blocks::header::{FileType, MAX_IMPORT_VERSION};
use snapdna_core::blocks::{Reference, Strandedness, Topology};
use snapdna_core::seq;
use snapdna_core::Document as CoreDocument;

use crate::feature::{self, Feature};
use crate::utils::{self, map_snap_err};

type ReferenceTuple = (Option<String>, Option<String>, Option<String>, Option<String>);

#[pyclass]
pub struct Document {
    inner: CoreDocument,
}

#[pymethods]
impl Document {
    /// An empty DNA document holding only the container cookie.
    #[new]
    fn new() -> Self {
        Self {
            inner: CoreDocument::new(),
        }
    }

    #[staticmethod]
    fn open(path: PathBuf) -> PyResult<Self> {
        let inner = CoreDocument::open(path).map_err(map_snap_err)?;
        Ok(Self { inner })
    }

    #[staticmethod]
    fn from_bytes(data: &[u8]) -> PyResult<Self> {
        let inner = CoreDocument::from_bytes(data).map_err(map_snap_err)?;
        Ok(Self { inner })
    }

    fn to_bytes<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let bytes = self.inner.to_bytes().map_err(map_snap_err)?;
        Ok(PyBytes::new_bound(py, &bytes))
    }

    /// Write back to the file the document was opened from, or to `path`.
    #[pyo3(signature = (path=None))]
    fn write(&self, path: Option<PathBuf>) -> PyResult<()> {
        match path {
            Some(path) => self.inner.write_to(path),
            None => self.inner.write(),
        }
        .map_err(map_snap_err)
    }

    #[getter]
    fn path(&self) -> Option<PathBuf> {
        self.inner.path().map(PathBuf::from)
    }

    #[getter]
    fn segment_types(&self) -> Vec<u8> {
        self.inner
            .segments()
            .iter()
            .map(|segment| segment.type_code())
            .collect()
    }

    // Header

    /// Raw file type code: 1 for DNA, 2 for protein.
    #[getter]
    fn file_type(&self) -> Option<u16> {
        self.inner.header().map(|header| header.file_type.into())
    }

    #[setter]
    fn set_file_type(&mut self, code: u16) -> PyResult<()> {
        self.inner.header_mut().map_err(map_snap_err)?.file_type = FileType::from(code);
        Ok(())
    }

    #[getter]
    fn export_version(&self) -> Option<u16> {
        self.inner.header().map(|header| header.export_version)
    }

    #[setter]
    fn set_export_version(&mut self, version: u16) -> PyResult<()> {
        if version == 0 {
            return Err(PyValueError::new_err("export_version must be at least 1"));
        }
        self.inner.header_mut().map_err(map_snap_err)?.export_version = version;
        Ok(())
    }

    #[getter]
    fn import_version(&self) -> Option<u16> {
        self.inner.header().map(|header| header.import_version)
    }

    #[setter]
    fn set_import_version(&mut self, version: u16) -> PyResult<()> {
        if !(1..=MAX_IMPORT_VERSION).contains(&version) {
            return Err(PyValueError::new_err(format!(
                "import_version must be in 1..={MAX_IMPORT_VERSION}"
            )));
        }
        self.inner.header_mut().map_err(map_snap_err)?.import_version = version;
        Ok(())
    }

    // Sequence

    #[getter]
    fn sequence(&self) -> Option<String> {
        self.inner
            .sequence()
            .map(|bases| String::from_utf8_lossy(bases).into_owned())
    }

    #[setter]
    fn set_sequence(&mut self, bases: &Bound<'_, PyAny>) -> PyResult<()> {
        let bases = utils::extract_bytes(bases, "sequence")?;
        self.inner.set_sequence(bases).map_err(map_snap_err)
    }

    fn set_protein_sequence(&mut self, residues: &Bound<'_, PyAny>) -> PyResult<()> {
        let residues = utils::extract_bytes(residues, "residues")?;
        self.inner
            .set_protein_sequence(residues)
            .map_err(map_snap_err)
    }

    #[getter]
    fn is_protein(&self) -> bool {
        self.inner.protein().is_some()
    }

    #[getter]
    fn topology(&self) -> Option<&'static str> {
        self.inner.topology().map(Topology::as_str)
    }

    #[setter]
    fn set_topology(&mut self, topology: &str) -> PyResult<()> {
        let topology =
            utils::parse_choice(topology, "topology", "'linear', 'circular'", Topology::from_name)?;
        self.inner.set_topology(topology).map_err(map_snap_err)
    }

    #[getter]
    fn strandedness(&self) -> Option<&'static str> {
        self.inner.strandedness().map(Strandedness::as_str)
    }

    #[setter]
    fn set_strandedness(&mut self, strandedness: &str) -> PyResult<()> {
        let strandedness = utils::parse_choice(
            strandedness,
            "strandedness",
            "'single', 'double'",
            Strandedness::from_name,
        )?;
        self.inner
            .set_strandedness(strandedness)
            .map_err(map_snap_err)
    }

    /// `(dam, dcm, ecoki)` methylation switches of the DNA segment.
    #[getter]
    fn methylation(&self) -> Option<(bool, bool, bool)> {
        self.inner.dna().map(|dna| {
            let m = dna.methylation;
            (m.dam, m.dcm, m.ecoki)
        })
    }

    #[pyo3(signature = (dam=None, dcm=None, ecoki=None))]
    fn set_methylation(
        &mut self,
        dam: Option<bool>,
        dcm: Option<bool>,
        ecoki: Option<bool>,
    ) -> PyResult<()> {
        let methylation = &mut self.inner.dna_mut().map_err(map_snap_err)?.methylation;
        if let Some(dam) = dam {
            methylation.dam = dam;
        }
        if let Some(dcm) = dcm {
            methylation.dcm = dcm;
        }
        if let Some(ecoki) = ecoki {
            methylation.ecoki = ecoki;
        }
        Ok(())
    }

    // Features

    #[getter]
    fn features(&self, py: Python<'_>) -> PyResult<Vec<Py<Feature>>> {
        feature::features_to_pylist(py, self.inner.features())
    }

    fn feature(&self, name: &str) -> PyResult<Feature> {
        let inner = self.inner.feature(name).map_err(map_snap_err)?;
        Ok(Feature {
            inner: inner.clone(),
        })
    }

    fn count_features(&self) -> usize {
        self.inner.count_features()
    }

    /// Add `feature` as given and return its id. With `query`, add one copy
    /// per occurrence of `query` in the sequence and return the count.
    #[pyo3(signature = (feature, query=None))]
    fn add_feature(
        &mut self,
        feature: PyRef<'_, Feature>,
        query: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<usize> {
        match query {
            Some(query) => {
                let query = utils::extract_bytes(query, "query")?;
                self.inner
                    .place_feature(&feature.inner, &query)
                    .map_err(map_snap_err)
            }
            None => self
                .inner
                .add_feature(feature.inner.clone())
                .map(|id| id as usize)
                .map_err(map_snap_err),
        }
    }

    fn remove_feature(&mut self, name: &str) -> PyResult<()> {
        self.inner.remove_feature(name).map_err(map_snap_err)
    }

    fn clear_features(&mut self) -> PyResult<()> {
        self.inner.clear_features().map_err(map_snap_err)
    }

    // Notes

    /// Text of the notes field `name`, e.g. `"Description"`.
    fn note(&self, name: &str) -> Option<String> {
        self.inner.notes().and_then(|notes| notes.text_field(name))
    }

    #[pyo3(signature = (name, value=None))]
    fn set_note(&mut self, name: &str, value: Option<&str>) -> PyResult<()> {
        self.inner
            .notes_mut()
            .map_err(map_snap_err)?
            .set_text_field(name, value);
        Ok(())
    }

    fn note_fields(&self) -> Vec<String> {
        self.inner
            .notes()
            .map(|notes| notes.field_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    #[getter]
    fn description(&self) -> Option<String> {
        self.inner.notes().and_then(|notes| notes.description())
    }

    #[setter]
    fn set_description(&mut self, value: Option<&str>) -> PyResult<()> {
        self.inner
            .notes_mut()
            .map_err(map_snap_err)?
            .set_description(value);
        Ok(())
    }

    #[getter]
    fn author(&self) -> Option<String> {
        self.inner.notes().and_then(|notes| notes.author())
    }

    /// `(year, month, day)` of the creation stamp.
    #[getter]
    fn created(&self) -> Option<(u16, u8, u8)> {
        self.inner
            .notes()
            .and_then(|notes| notes.created())
            .map(|stamp| (stamp.year, stamp.month, stamp.day))
    }

    /// `(title, pubmed_id, journal, authors)` of every reference.
    #[getter]
    fn references(&self) -> Vec<ReferenceTuple> {
        self.inner
            .references()
            .into_iter()
            .map(|r| (r.title, r.pubmed_id, r.journal, r.authors))
            .collect()
    }

    #[setter]
    fn set_references(&mut self, references: Vec<ReferenceTuple>) -> PyResult<()> {
        let references: Vec<Reference> = references
            .into_iter()
            .map(|(title, pubmed_id, journal, authors)| {
                let mut reference = Reference::default();
                reference.title = title;
                reference.pubmed_id = pubmed_id;
                reference.journal = journal;
                reference.authors = authors;
                reference
            })
            .collect();
        self.inner
            .notes_mut()
            .map_err(map_snap_err)?
            .set_references(&references);
        Ok(())
    }

    // Traces

    #[getter]
    fn trace_names(&self) -> Vec<String> {
        self.inner
            .trace_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn count_traces(&self) -> usize {
        self.inner.count_traces()
    }

    fn has_trace(&self, name: &str) -> bool {
        self.inner.has_trace(name)
    }

    fn add_trace(&mut self, name: &str, ztr: Vec<u8>) -> PyResult<()> {
        self.inner.add_trace(name, ztr).map_err(map_snap_err)
    }

    fn insert_trace(&mut self, index: usize, name: &str, ztr: Vec<u8>) -> PyResult<()> {
        self.inner
            .insert_trace(index, name, ztr)
            .map_err(map_snap_err)
    }

    fn append_trace(&mut self, name: &str, ztr: Vec<u8>) -> PyResult<()> {
        self.inner.append_trace(name, ztr).map_err(map_snap_err)
    }

    fn prepend_trace(&mut self, name: &str, ztr: Vec<u8>) -> PyResult<()> {
        self.inner.prepend_trace(name, ztr).map_err(map_snap_err)
    }

    fn remove_trace(&mut self, name: &str) -> PyResult<()> {
        self.inner.remove_trace(name).map_err(map_snap_err)
    }

    fn rename_trace(&mut self, old: &str, new: &str) -> PyResult<()> {
        self.inner.rename_trace(old, new).map_err(map_snap_err)
    }

    fn pick_trace(&mut self, name: &str) -> PyResult<()> {
        self.inner.pick_trace(name).map_err(map_snap_err)
    }

    /// Sort traces by name.
    #[pyo3(signature = (reverse=false))]
    fn sort_traces(&mut self, reverse: bool) -> PyResult<()> {
        self.inner
            .sort_traces_by(|a, b| {
                let order = a.name.cmp(&b.name);
                if reverse {
                    order.reverse()
                } else {
                    order
                }
            })
            .map_err(map_snap_err)
    }

    fn clear_traces(&mut self) -> PyResult<()> {
        self.inner.clear_traces().map_err(map_snap_err)
    }

    fn trace_data<'py>(&self, py: Python<'py>, name: &str) -> PyResult<Vec<Bound<'py, PyBytes>>> {
        let blobs = self.inner.trace_data(name).map_err(map_snap_err)?;
        Ok(blobs
            .into_iter()
            .map(|blob| PyBytes::new_bound(py, blob))
            .collect())
    }

    fn extract_traces(&self, dir: PathBuf) -> PyResult<Vec<PathBuf>> {
        self.inner.extract_traces(dir).map_err(map_snap_err)
    }

    // History

    fn clear_history(&mut self) {
        self.inner.clear_history();
    }

    fn __repr__(&self) -> String {
        format!(
            "Document(length={}, features={}, traces={})",
            self.inner.sequence().map_or(0, <[u8]>::len),
            self.inner.count_features(),
            self.inner.count_traces()
        )
    }
}

/// Reverse complement of a nucleotide string, for placing features on the
/// reverse strand.
#[pyfunction]
fn reverse_complement(bases: &Bound<'_, PyAny>) -> PyResult<String> {
    let bases = utils::extract_bytes(bases, "bases")?;
    String::from_utf8(seq::reverse_complement(&bases))
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Document>()?;
    m.add_function(wrap_pyfunction!(reverse_complement, m)?)?;
    Ok(())
}
